//! Saved-design format: a full snapshot of one document.
//!
//! ```json
//! { "id": "...", "productId": "mug-11oz", "elements": [...],
//!   "name": "Meu Projeto", "createdAt": 0, "updatedAt": 0 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Design, DesignElement, DesignMeta};

/// Persisted representation of a [`Design`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDesign {
    /// Document identifier.
    pub id: String,
    /// Product the design was made for.
    pub product_id: Option<String>,
    /// Elements in paint order.
    pub elements: Vec<DesignElement>,
    /// Project name.
    pub name: String,
    /// Creation time in milliseconds since epoch.
    pub created_at: u64,
    /// Last modification time in milliseconds since epoch.
    pub updated_at: u64,
}

impl From<&Design> for SavedDesign {
    fn from(design: &Design) -> Self {
        Self {
            id: design.meta.id.clone(),
            product_id: design.product_id.clone(),
            elements: design.elements().to_vec(),
            name: design.meta.name.clone(),
            created_at: design.meta.created_at,
            updated_at: design.meta.updated_at,
        }
    }
}

impl SavedDesign {
    /// Materialize the runtime design.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if two elements share an id.
    pub fn into_design(self) -> CoreResult<Design> {
        let mut design = Design::new();
        design.product_id = self.product_id;
        for element in self.elements {
            design.insert(element)?;
        }
        design.meta = DesignMeta {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Ok(design)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(CoreError::Serialization)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a saved design.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(CoreError::Serialization)
    }

    /// Write the design to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        tracing::debug!("Saved design {} to {}", self.id, path.as_ref().display());
        Ok(())
    }

    /// Read a design from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }
}
