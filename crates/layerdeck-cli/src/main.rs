use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use layerdeck_lib::core::{
    catalog::{product_to_template, CatalogSource, StaticCatalog},
    design::{Design, DesignType, Layer},
    fs::{
        atomic_write_json_pretty, design_file_name, read_design_file, validate_local_input_path,
        validate_output_path, write_design_file,
    },
    hydrate::{
        parse_design, DesignImporter, FontRegistry, HydrationOrder, LocalAssetResolver,
        SvgPreviewRenderer,
    },
    remote::CommerceClient,
    session::EditorSession,
    settings::{default_settings_dir, AppSettings, SettingsManager},
    ExternalId,
};
use layerdeck_lib::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "layerdeck", version)]
struct Cli {
    /// Settings directory (defaults to the platform config dir).
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a design file and render scene previews.
    Import(ImportArgs),
    /// Re-assemble a design file, optionally replacing the active scene's layers.
    Assemble(AssembleArgs),
    /// List catalog products.
    Products(ProductsArgs),
    /// Apply a product as a starter template.
    ApplyProduct(ApplyProductArgs),
    /// Save a design remotely and print its cart link.
    AddToCart(AddToCartArgs),
    /// Show or change settings.
    Settings(SettingsArgs),
}

#[derive(Parser, Debug)]
struct ImportArgs {
    /// Input design JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Write the imported scenes as JSON here.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory relative asset paths resolve against (defaults to the input's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Render previews before loading fonts.
    #[arg(long, default_value_t = false)]
    preview_first: bool,

    /// Hydrate scenes concurrently.
    #[arg(long, default_value_t = false)]
    concurrent: bool,
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Input design JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Scene to treat as active (defaults to the first scene).
    #[arg(long)]
    active: Option<String>,

    /// JSON array of layers replacing the active scene's canvas.
    #[arg(long)]
    layers: Option<PathBuf>,

    /// Output design JSON (defaults to a file named after the design).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ProductsArgs {
    /// Read products from a local JSON file instead of the remote catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ApplyProductArgs {
    /// Product id.
    #[arg(long)]
    product: String,

    /// Design to apply the product to; a blank design is started otherwise.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Variant of a blank design.
    #[arg(long, default_value = "GRAPHIC")]
    kind: String,

    /// Read products from a local JSON file instead of the remote catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output design JSON (defaults to a file named after the design).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct AddToCartArgs {
    /// Input design JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SettingsArgs {
    #[command(subcommand)]
    action: SettingsAction,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the effective settings.
    Show,
    /// Print the settings file path.
    Path,
    /// Merge a JSON object into the stored settings.
    Set {
        /// JSON patch, e.g. '{"remote":{"timeoutSecs":10}}'
        patch: String,
    },
    /// Delete the stored settings.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings_dir = cli.settings_dir.clone().unwrap_or_else(default_settings_dir);
    let manager = SettingsManager::new(settings_dir.clone());
    let settings = manager.load();
    let _log_guard = init_logging(&settings.logging, Some(&settings_dir.join("logs")));
    tracing::debug!(settings_dir = %settings_dir.display(), "Loaded settings");

    match cli.cmd {
        Command::Import(args) => cmd_import(args, &settings).await,
        Command::Assemble(args) => cmd_assemble(args).await,
        Command::Products(args) => cmd_products(args, &settings).await,
        Command::ApplyProduct(args) => cmd_apply_product(args, &settings).await,
        Command::AddToCart(args) => cmd_add_to_cart(args, &settings).await,
        Command::Settings(args) => cmd_settings(args, &manager),
    }
}

async fn cmd_import(args: ImportArgs, settings: &AppSettings) -> anyhow::Result<()> {
    let in_path = input_path(&args.in_path)?;
    let value = read_design_file(&in_path)
        .await
        .with_context(|| format!("read design '{}'", in_path.display()))?;

    let asset_root = args
        .assets
        .or_else(|| settings.import.asset_root.as_ref().map(PathBuf::from))
        .or_else(|| in_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = settings.import.to_import_config();
    if args.preview_first {
        config.order = HydrationOrder::PreviewFirst;
    }
    config.concurrent |= args.concurrent;

    let fonts = Arc::new(FontRegistry::new());
    let importer = DesignImporter::new(
        Arc::new(LocalAssetResolver::new(asset_root)),
        fonts.clone(),
        Arc::new(SvgPreviewRenderer::new()),
    )
    .with_config(config);

    let imported = importer
        .import_value(value)
        .await
        .with_context(|| format!("import design '{}'", in_path.display()))?;

    println!(
        "{} \"{}\" ({}), {} scene(s), fonts: [{}]",
        imported.design.kind,
        imported.design.name,
        imported.design.id,
        imported.scenes.len(),
        fonts.loaded_families().join(", ")
    );
    for hydrated in &imported.scenes {
        let scene = &hydrated.scene;
        println!(
            "  {}  {}  layers={}  duration={}",
            scene.id,
            scene.name.as_deref().unwrap_or("-"),
            scene.layers.len(),
            scene
                .duration
                .map(|d| format!("{d}ms"))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    if let Some(out) = args.out {
        let out = output_path(&out)?;
        atomic_write_json_pretty(&out, &imported)
            .with_context(|| format!("write '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

async fn cmd_assemble(args: AssembleArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.in_path).await?;

    if let Some(active) = &args.active {
        session
            .activate_scene(active)
            .with_context(|| format!("activate scene '{active}'"))?;
    }

    if let Some(layers_path) = &args.layers {
        let layers_path = input_path(layers_path)?;
        let text = std::fs::read_to_string(&layers_path)
            .with_context(|| format!("read layers '{}'", layers_path.display()))?;
        let layers: Vec<Layer> = serde_json::from_str(&text)
            .with_context(|| format!("parse layers '{}'", layers_path.display()))?;
        if let Some(live) = session.live_scene_mut() {
            live.layers = layers;
        }
    }

    write_session(&session, args.out.as_deref()).await
}

async fn cmd_products(args: ProductsArgs, settings: &AppSettings) -> anyhow::Result<()> {
    let catalog = catalog_source(args.catalog.as_deref(), settings)?;
    let products = catalog.fetch_products().await.context("fetch products")?;

    for product in &products {
        println!(
            "{}\t{}\t{}\t{}",
            product.id,
            product.name,
            product.dimensions_label(),
            product.thumbnail_url()
        );
    }
    eprintln!("{} product(s)", products.len());
    Ok(())
}

async fn cmd_apply_product(args: ApplyProductArgs, settings: &AppSettings) -> anyhow::Result<()> {
    let catalog = catalog_source(args.catalog.as_deref(), settings)?;
    let product_id = match args.product.parse::<i64>() {
        Ok(n) => ExternalId::Number(n),
        Err(_) => ExternalId::Text(args.product.clone()),
    };
    let product = catalog
        .find_product(&product_id)
        .await
        .with_context(|| format!("find product '{}'", args.product))?;

    let mut session = match &args.in_path {
        Some(path) => open_session(path).await?,
        None => {
            let kind: DesignType = args.kind.parse()?;
            EditorSession::new(kind)
        }
    };

    let template = product_to_template(&product, session.active_scene_id())
        .with_context(|| format!("build template for '{}'", product.name))?;
    let scene_id = session.apply_template(template);
    eprintln!(
        "applied {} ({}) to scene {}",
        product.name,
        product.dimensions_label(),
        scene_id
    );

    write_session(&session, args.out.as_deref()).await
}

async fn cmd_add_to_cart(args: AddToCartArgs, settings: &AppSettings) -> anyhow::Result<()> {
    let session = open_session(&args.in_path).await?;
    let Some(design) = session.export_design()? else {
        bail!("no design to add to cart");
    };

    let client = CommerceClient::new(&settings.remote)?;
    let checkout = client.add_to_cart(&design).await.context("add to cart")?;

    eprintln!("saved as record {}", checkout.receipt.record_id);
    println!("{}", checkout.cart_url);
    Ok(())
}

fn cmd_settings(args: SettingsArgs, manager: &SettingsManager) -> anyhow::Result<()> {
    let settings = match args.action {
        SettingsAction::Path => {
            println!("{}", manager.settings_path().display());
            return Ok(());
        }
        SettingsAction::Show => manager.load(),
        SettingsAction::Set { patch } => {
            let patch: serde_json::Value =
                serde_json::from_str(&patch).context("parse settings patch")?;
            manager.update(patch)?
        }
        SettingsAction::Reset => manager.reset()?,
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolve path '{}'", path.display()))
}

fn input_path(path: &Path) -> anyhow::Result<PathBuf> {
    let abs = absolute(path)?;
    validate_local_input_path(&abs.to_string_lossy(), "input").map_err(anyhow::Error::msg)
}

fn output_path(path: &Path) -> anyhow::Result<PathBuf> {
    let abs = absolute(path)?;
    validate_output_path(&abs.to_string_lossy(), "output").map_err(anyhow::Error::msg)
}

async fn open_session(path: &Path) -> anyhow::Result<EditorSession> {
    let in_path = input_path(path)?;
    let value = read_design_file(&in_path)
        .await
        .with_context(|| format!("read design '{}'", in_path.display()))?;
    let design =
        parse_design(value).with_context(|| format!("parse design '{}'", in_path.display()))?;
    Ok(EditorSession::from_design(design))
}

async fn write_session(session: &EditorSession, out: Option<&Path>) -> anyhow::Result<()> {
    let Some(design) = session.export_design()? else {
        bail!("no design to write");
    };
    let out = output_path(&out_or_default(out, &design))?;
    write_design_file(&out, &design)
        .await
        .with_context(|| format!("write design '{}'", out.display()))?;
    eprintln!(
        "wrote {} ({} scene(s), {}x{})",
        out.display(),
        design.scenes.len(),
        design.frame.width,
        design.frame.height
    );
    Ok(())
}

/// Explicit `--out`, or a file in the working directory named after the design
fn out_or_default(out: Option<&Path>, design: &Design) -> PathBuf {
    out.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(design_file_name(design)))
}

fn catalog_source(
    catalog: Option<&Path>,
    settings: &AppSettings,
) -> anyhow::Result<Box<dyn CatalogSource>> {
    match catalog {
        Some(path) => {
            let path = input_path(path)?;
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("read catalog '{}'", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parse catalog '{}'", path.display()))?;
            Ok(Box::new(StaticCatalog::from_value(value)?))
        }
        None => Ok(Box::new(CommerceClient::new(&settings.remote)?)),
    }
}
