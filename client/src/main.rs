//! FitLoop CLI - drive the analysis backend from a terminal
//!
//! # Commands
//!
//! ```bash
//! fitloop upload --reviews reviews.csv --returns returns.csv --process
//! fitloop products --search dress --category small
//! fitloop product SKU-123
//! fitloop export SKU-123 --out reports/
//! ```
//!
//! Configuration comes from the environment (`API_BASE_URL`, `API_ORIGIN`,
//! `AUTH_TOKEN`, `REQUEST_TIMEOUT_SECS`, `.env` supported) and can be
//! overridden per invocation with the global flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use fitloop::collection::{self, CategoryFilter, ProductCollection};
use fitloop::detail::{self, ProductDetailView};
use fitloop::workflow::{self, UploadWorkflow};
use fitloop::{
    ApiClient, ClientConfig, ClientError, Dataset, DatasetFile, DirectorySink, Notice, Product,
    Route,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "fitloop")]
#[command(version, about = "Upload review and returns datasets and browse product risk analysis", long_about = None)]
struct Cli {
    /// API base URL (absolute, or a path joined to API_ORIGIN)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Shared-secret auth token
    #[arg(long, global = true)]
    token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the reviews and returns datasets
    Upload {
        /// Reviews CSV file
        #[arg(long)]
        reviews: PathBuf,

        /// Returns CSV file
        #[arg(long)]
        returns: PathBuf,

        /// Trigger analysis once the upload succeeds
        #[arg(long)]
        process: bool,
    },

    /// List analyzed products
    Products {
        /// Match against product id or top issue
        #[arg(short, long, default_value = "")]
        search: String,

        /// all, small, large, color or shrink
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,
    },

    /// Show one product with its ranked issues
    Product {
        /// Product ID
        id: String,
    },

    /// Save the markdown report for a product
    Export {
        /// Product ID
        id: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api = match build_client(&cli) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n🛑 Cancelling...");
            on_signal.cancel();
        }
    });

    let result = match cli.command {
        Commands::Upload { reviews, returns, process } => {
            cmd_upload(&api, &reviews, &returns, process, &cancel).await
        }
        Commands::Products { search, category } => cmd_products(&api, search, category, &cancel).await,
        Commands::Product { id } => cmd_product(&api, id, &cancel).await,
        Commands::Export { id, out } => cmd_export(&api, id, out, &cancel).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn build_client(cli: &Cli) -> Result<ApiClient, ClientError> {
    let mut config = ClientConfig::from_env()?;

    if let Some(ref base_url) = cli.base_url {
        config = config.with_base_url(base_url.as_str());
    }
    if let Some(ref token) = cli.token {
        config = config.with_auth_token(token.as_str());
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config.warn_if_insecure();
    log::debug!("Using {:?}", config);

    Ok(ApiClient::from_config(config)?)
}

async fn read_dataset(path: &Path) -> Result<DatasetFile, ClientError> {
    DatasetFile::from_path(path).await.map_err(|source| ClientError::ReadFile {
        path: path.display().to_string(),
        source,
    })
}

fn print_notice(notice: &Notice) {
    eprintln!("{}", notice);
}

async fn cmd_upload(
    api: &ApiClient,
    reviews: &Path,
    returns: &Path,
    process: bool,
    cancel: &CancellationToken,
) -> CliResult {
    let mut flow = UploadWorkflow::new();
    flow.select(Dataset::Reviews, read_dataset(reviews).await?);
    flow.select(Dataset::Returns, read_dataset(returns).await?);

    eprintln!("📤 Uploading {} and {}...", reviews.display(), returns.display());
    let uploaded = flow.upload(api, cancel).await;
    print_notice(&workflow::upload_notice(&uploaded));
    uploaded?;

    if !process {
        eprintln!("   Run again with --process to start the analysis.");
        return Ok(());
    }

    eprintln!("⚙️  Processing data...");
    let processed = flow.process(api, cancel).await;
    print_notice(&workflow::process_notice(&processed));
    let outcome = processed?;

    if outcome.navigation.route == Route::Collection {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(outcome.navigation.after) => {}
        }
        eprintln!();
        cmd_products(api, String::new(), CategoryFilter::All, cancel).await?;
    }

    Ok(())
}

async fn cmd_products(
    api: &ApiClient,
    search: String,
    category: CategoryFilter,
    cancel: &CancellationToken,
) -> CliResult {
    let mut products = ProductCollection::new();
    if let Err(e) = products.load(api, cancel).await {
        print_notice(&collection::load_failed_notice());
        return Err(e.into());
    }
    products.set_search(search);
    products.set_category(category);

    let stats = products.stats();
    println!("📊 {} products", stats.total);
    println!("   🔴 High risk:   {}", stats.high_risk);
    println!("   🟡 Medium risk: {}", stats.medium_risk);
    println!("   🟢 Low risk:    {}", stats.low_risk);
    println!();

    if let Some(empty) = products.empty_listing() {
        println!("No products found. {}", empty.message());
        if let Some(route) = empty.action() {
            println!("   Next: {}", command_for(&route));
        }
        return Ok(());
    }

    let visible = products.visible();
    println!("{:<20} {:>6}  {:<12} {:<28} {}", "PRODUCT", "SCORE", "RISK", "TOP ISSUE", "UPDATED");
    for product in &visible {
        print_row(product);
    }

    if let Some(first) = visible.first() {
        println!();
        println!("   Details: {}", command_for(&first.detail_route()));
    }

    Ok(())
}

/// The CLI invocation that reaches `route`.
fn command_for(route: &Route) -> String {
    match route {
        Route::Upload => "fitloop upload --reviews <CSV> --returns <CSV> --process".to_string(),
        Route::Collection => "fitloop products".to_string(),
        Route::Detail(id) => format!("fitloop product {}", id),
    }
}

fn print_row(product: &Product) {
    println!(
        "{:<20} {:>6}  {:<12} {:<28} {}",
        product.product_id,
        product.risk_score_display(),
        product.risk_level().to_string(),
        product.top_issue_display(),
        product.updated_display(),
    );
}

async fn cmd_product(api: &ApiClient, id: String, cancel: &CancellationToken) -> CliResult {
    let mut view = ProductDetailView::new(id);
    if let Err(e) = view.load(api, cancel).await {
        print_notice(&detail::load_failed_notice());
        eprintln!("   Back to: {}", command_for(&e.fallback_route()));
        return Err(e.into());
    }

    let Some(product) = view.product() else {
        return Ok(());
    };

    println!("📦 {}", product.product_id);
    println!("   Risk:      {} ({})", product.risk_score_display(), product.risk_level());
    println!("   Top issue: {}", product.top_issue_display());
    println!("   Updated:   {}", product.updated_display());
    println!();

    let issues = view.ranked_issues();
    if issues.is_empty() {
        println!("No issues recorded.");
    } else {
        println!("Issues (by impact):");
        for issue in issues {
            println!(
                "  {:<5} {:<24} {:<10} {:>5.1}%  {}",
                issue.issue_category.to_string(),
                fitloop::humanize_descriptor(&issue.descriptor),
                issue.body_area_label(),
                issue.frequency_bar(),
                "★".repeat(issue.severity_stars() as usize),
            );
        }
    }
    println!();

    println!("📏 Size guidance: {}", product.generated_copy.size_guidance_text());
    println!("🧺 Care tip:      {}", product.generated_copy.care_tip_text());

    Ok(())
}

async fn cmd_export(api: &ApiClient, id: String, out: PathBuf, cancel: &CancellationToken) -> CliResult {
    let view = ProductDetailView::new(id);
    let sink = DirectorySink::new(out);

    let result = view.export(api, &sink, cancel).await;
    print_notice(&detail::export_notice(&result));
    let report = result?;

    eprintln!("💾 {} ({} bytes) in {}", report.filename, report.size, sink.dir().display());
    Ok(())
}
