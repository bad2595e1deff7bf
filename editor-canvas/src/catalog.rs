//! Product catalog sources.

use std::path::PathBuf;

use async_trait::async_trait;
use editor_core::Product;

use crate::error::CatalogError;

/// Supplies the products a design can be placed on.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// List every selectable product.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog source is unavailable or malformed.
    async fn products(&self) -> Result<Vec<Product>, CatalogError>;
}

/// Catalog read from a JSON array of products on disk.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    /// Create a catalog backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProductCatalog for JsonCatalog {
    async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        let products: Vec<Product> = serde_json::from_str(&json)?;
        tracing::debug!(
            "Loaded {} products from {}",
            products.len(),
            self.path.display()
        );
        Ok(products)
    }
}

/// Fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Vec<Product>);

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_catalog_reads_products() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("products.json");
        std::fs::write(
            &path,
            r#"[{"id":"mug","name":"Caneca","canvasWidth":800,"canvasHeight":400,"backgroundUrl":"mug.png"}]"#,
        )
        .expect("write");

        let products = JsonCatalog::new(&path).products().await.expect("catalog");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "mug");
        assert_eq!(products[0].fallback_url, None);
    }

    #[tokio::test]
    async fn test_json_catalog_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = JsonCatalog::new(dir.path().join("missing.json"));
        assert!(matches!(missing.products().await, Err(CatalogError::Io(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            JsonCatalog::new(&path).products().await,
            Err(CatalogError::Parse(_))
        ));
    }
}
