//! Events raised by the drawing surface and fed back into the document.

use serde::{Deserialize, Serialize};

use crate::ElementId;

/// What a direct-manipulation gesture did to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manipulation {
    /// Dragged to a new position.
    Move,
    /// Scaled via a corner/edge handle.
    Resize,
    /// Rotated via the rotation handle.
    Rotate,
}

/// Interaction events emitted by the surface.
///
/// Only settled interactions produce events; intermediate drag frames never
/// leave the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SurfaceEvent {
    /// The active object changed. `tag` is `None` when nothing (or the
    /// untagged background) is active.
    SelectionChanged {
        /// Element id of the newly active object.
        tag: Option<ElementId>,
    },

    /// A manipulation gesture finished on a tagged object.
    ObjectModified {
        /// Element id of the manipulated object.
        tag: ElementId,
        /// Kind of manipulation.
        action: Manipulation,
    },
}

impl SurfaceEvent {
    /// The element this event concerns, if any.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Self::SelectionChanged { tag } => *tag,
            Self::ObjectModified { tag, .. } => Some(*tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_target() {
        let id = ElementId::new();
        assert_eq!(SurfaceEvent::SelectionChanged { tag: None }.target(), None);
        assert_eq!(
            SurfaceEvent::ObjectModified {
                tag: id,
                action: Manipulation::Move
            }
            .target(),
            Some(id)
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = SurfaceEvent::ObjectModified {
            tag: ElementId::new(),
            action: Manipulation::Rotate,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "ObjectModified");
        assert_eq!(json["data"]["action"], "rotate");
    }
}
