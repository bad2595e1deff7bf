//! # Print Editor CLI
//!
//! Headless host for the personalization editor. Opens a product catalog,
//! loads or starts a design, waits for every asset to settle and writes the
//! print export.
//!
//! ## Usage
//!
//! ```bash
//! print-editor --catalog products.json --product mug --project-name "Loja da Ana"
//! print-editor --catalog products.json --design saved.json --out-dir exports/
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved run configuration
//! - `run` - One editing session from catalog to exported PNG

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use editor_canvas::{
    DefaultImageLoader, Editor, EditorConfig, ExportConfig, ExportKind, JsonCatalog,
    ProductSwitch,
};
use editor_core::{HistoryConfig, SavedDesign, DEFAULT_HISTORY_CAPACITY};

/// Command-line arguments for print-editor.
#[derive(Debug, Clone, Parser)]
#[command(name = "print-editor")]
#[command(about = "Render and export print-product designs")]
#[command(version)]
pub struct CliArgs {
    /// Product catalog (JSON array of products)
    #[arg(long, env = "PRINT_EDITOR_CATALOG")]
    pub catalog: PathBuf,

    /// Saved design to open
    #[arg(long, env = "PRINT_EDITOR_DESIGN")]
    pub design: Option<PathBuf>,

    /// Product to place the design on (defaults to the design's or the first)
    #[arg(long)]
    pub product: Option<String>,

    /// Discard the design's elements if --product differs from its product
    #[arg(long)]
    pub discard: bool,

    /// Project name printed on the export and used for the filename
    #[arg(long)]
    pub project_name: Option<String>,

    /// Brand mark drawn at the top of the print page
    #[arg(long, env = "PRINT_EDITOR_BRAND_MARK")]
    pub brand_mark: Option<String>,

    /// Directory the export is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Also write the design JSON here
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Number of undo snapshots kept
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Print page width in pixels
    #[arg(long, default_value = "2480")]
    pub page_width: u32,

    /// Print page height in pixels
    #[arg(long, default_value = "3508")]
    pub page_height: u32,
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Product catalog path.
    pub catalog: PathBuf,
    /// Saved design to open.
    pub design: Option<PathBuf>,
    /// Requested product.
    pub product: Option<String>,
    /// Confirm destructive product switches.
    pub discard: bool,
    /// Project name override.
    pub project_name: Option<String>,
    /// Export output directory.
    pub out_dir: PathBuf,
    /// Design JSON output path.
    pub save: Option<PathBuf>,
    /// Session configuration.
    pub editor: EditorConfig,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            catalog: args.catalog,
            design: args.design,
            product: args.product,
            discard: args.discard,
            project_name: args.project_name,
            out_dir: args.out_dir,
            save: args.save,
            editor: EditorConfig {
                history: HistoryConfig {
                    capacity: args.history_capacity,
                },
                export: ExportConfig {
                    page_width: args.page_width,
                    page_height: args.page_height,
                    brand_mark_url: args.brand_mark,
                    ..ExportConfig::default()
                },
            },
        }
    }
}

/// Run one session and return the path of the written export.
///
/// Relative image paths in the catalog and design resolve against the
/// catalog's directory.
///
/// # Errors
///
/// Fails if the catalog is empty or unreadable, the design cannot be
/// loaded, the product is unknown, or the export cannot be written.
pub async fn run(config: CliConfig) -> anyhow::Result<PathBuf> {
    let base_dir = config
        .catalog
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let loader = Arc::new(DefaultImageLoader::new()?.with_base_dir(base_dir));
    let catalog = JsonCatalog::new(&config.catalog);

    let mut editor = Editor::open(&catalog, loader, config.editor.clone()).await;
    if editor.is_empty_state() {
        anyhow::bail!("no products available in {}", config.catalog.display());
    }

    if let Some(path) = &config.design {
        let saved = SavedDesign::load(path)
            .with_context(|| format!("reading design {}", path.display()))?;
        editor.load_design(saved)?;
    }

    let product = config
        .product
        .clone()
        .or_else(|| editor.design().product_id.clone())
        .or_else(|| editor.products().first().map(|p| p.id.clone()))
        .context("no product to place the design on")?;

    match editor.request_product(&product)? {
        ProductSwitch::ConfirmationRequired if config.discard => {
            editor.confirm_product_switch();
        }
        ProductSwitch::ConfirmationRequired => {
            tracing::warn!("Keeping current product: pass --discard to switch to {product}");
            editor.cancel_product_switch();
        }
        ProductSwitch::Switched | ProductSwitch::Unchanged => {}
    }

    let effects = editor.settle().await;
    tracing::debug!("Settled {} asset loads", effects.len());

    if let Some(name) = &config.project_name {
        editor.set_project_name(name.clone());
    }

    let artifact = editor.export().await?;
    if artifact.kind == ExportKind::BareSurface {
        tracing::warn!("Brand mark unavailable, exported the bare design");
    }

    tokio::fs::create_dir_all(&config.out_dir).await?;
    let out = config.out_dir.join(&artifact.filename);
    tokio::fs::write(&out, &artifact.png)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!("Wrote {} ({}x{})", out.display(), artifact.width, artifact.height);

    if let Some(path) = &config.save {
        editor.saved_design().save(path)?;
        tracing::info!("Saved design to {}", path.display());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_canvas::image::{create_solid_color, encode_png, load_image_from_bytes};

    #[test]
    fn test_args_into_config() {
        let args = CliArgs::parse_from([
            "print-editor",
            "--catalog",
            "products.json",
            "--product",
            "mug",
            "--brand-mark",
            "brand.png",
            "--history-capacity",
            "10",
        ]);
        let config = CliConfig::from(args);

        assert_eq!(config.catalog, PathBuf::from("products.json"));
        assert_eq!(config.product.as_deref(), Some("mug"));
        assert_eq!(config.editor.history.capacity, 10);
        assert_eq!(config.editor.export.page_width, 2480);
        assert_eq!(
            config.editor.export.brand_mark_url.as_deref(),
            Some("brand.png")
        );
        assert!(!config.discard);
    }

    #[tokio::test]
    async fn test_run_exports_seeded_design() {
        let dir = tempfile::tempdir().expect("tempdir");
        let background = encode_png(&create_solid_color(60, 40, [230, 230, 230, 255])).expect("png");
        std::fs::write(dir.path().join("mug.png"), background).expect("write");
        std::fs::write(
            dir.path().join("products.json"),
            r#"[{"id":"mug","name":"Caneca","canvasWidth":120,"canvasHeight":80,"backgroundUrl":"mug.png"}]"#,
        )
        .expect("write");

        let args = CliArgs::parse_from([
            "print-editor",
            "--catalog",
            dir.path().join("products.json").to_str().expect("utf8"),
            "--project-name",
            "Caneca Azul",
            "--page-width",
            "124",
            "--page-height",
            "175",
        ]);
        let mut config = CliConfig::from(args);
        config.out_dir = dir.path().join("out");
        config.save = Some(dir.path().join("design.json"));

        let out = run(config).await.expect("run");
        assert_eq!(out, dir.path().join("out").join("caneca-azul.png"));

        let png = std::fs::read(&out).expect("export written");
        let image = load_image_from_bytes(&png).expect("decodes");
        assert_eq!((image.width, image.height), (124, 175));

        let saved = SavedDesign::load(dir.path().join("design.json")).expect("saved");
        assert_eq!(saved.product_id.as_deref(), Some("mug"));
        assert_eq!(saved.elements.len(), 1, "default text was seeded");
    }

    #[tokio::test]
    async fn test_run_rejects_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("products.json"), "[]").expect("write");
        let args = CliArgs::parse_from([
            "print-editor",
            "--catalog",
            dir.path().join("products.json").to_str().expect("utf8"),
        ]);
        assert!(run(CliConfig::from(args)).await.is_err());
    }
}
