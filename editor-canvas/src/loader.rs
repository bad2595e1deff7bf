//! Asynchronous raster loading.
//!
//! Every image the editor draws (product backgrounds, logos, pictures, the
//! export brand mark) is fetched through an [`ImageLoader`]. Loads are the
//! only suspension points of the reconciliation flow.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{RenderError, RenderResult};
use crate::image::{load_image_from_bytes, load_image_from_data_uri, TextureData};

/// Source of decoded raster images.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load and decode the image at `src`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the image cannot be fetched or
    /// decoded.
    async fn load(&self, src: &str) -> RenderResult<TextureData>;
}

/// Loads `data:` URIs, `http(s)://` URLs and filesystem paths.
#[derive(Debug, Clone)]
pub struct DefaultImageLoader {
    http: Client,
    base_dir: Option<PathBuf>,
}

impl DefaultImageLoader {
    /// Create a loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> RenderResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("print-editor/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(|e| RenderError::Resource(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            http,
            base_dir: None,
        })
    }

    /// Resolve relative paths against `dir`.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn fetch_http(&self, url: Url) -> RenderResult<Vec<u8>> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RenderError::Resource(format!("GET {url} failed: {e}")))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("Reading {url} failed: {e}")))?;
        Ok(body.to_vec())
    }

    async fn read_file(&self, path: &Path) -> RenderResult<Vec<u8>> {
        let path = self.resolve_path(path);
        tokio::fs::read(&path)
            .await
            .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl ImageLoader for DefaultImageLoader {
    async fn load(&self, src: &str) -> RenderResult<TextureData> {
        if src.starts_with("data:") {
            return load_image_from_data_uri(src);
        }

        let bytes = match Url::parse(src) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.fetch_http(url).await?,
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| RenderError::Resource(format!("Invalid file URL: {src}")))?;
                self.read_file(&path).await?
            }
            Ok(url) if url.scheme().len() > 1 => {
                return Err(RenderError::Resource(format!(
                    "Unsupported image source scheme: {}",
                    url.scheme()
                )));
            }
            // Relative paths and drive-letter paths
            _ => self.read_file(Path::new(src)).await?,
        };

        tracing::debug!("Fetched {} bytes for {src}", bytes.len());
        tokio::task::spawn_blocking(move || load_image_from_bytes(&bytes))
            .await
            .map_err(|e| RenderError::Resource(format!("Decode task failed: {e}")))?
    }
}

/// Serves pre-decoded images from memory.
///
/// `data:` URIs are decoded directly; any other unregistered source fails to
/// load. Counts every request.
#[derive(Debug, Default)]
pub struct MemoryImageLoader {
    images: HashMap<String, TextureData>,
    requests: AtomicUsize,
}

impl MemoryImageLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under `src`.
    #[must_use]
    pub fn with_image(mut self, src: impl Into<String>, texture: TextureData) -> Self {
        self.images.insert(src.into(), texture);
        self
    }

    /// Number of `load` calls made so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ImageLoader for MemoryImageLoader {
    async fn load(&self, src: &str) -> RenderResult<TextureData> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(texture) = self.images.get(src) {
            return Ok(texture.clone());
        }
        if src.starts_with("data:") {
            return load_image_from_data_uri(src);
        }
        Err(RenderError::Resource(format!("No such image: {src}")))
    }
}
