use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use mosaic::api::{FeedApi, BRAND_PAGE_SIZE, FEED_PAGE_SIZE};
use mosaic::app::{App, AppEvent, FeedsPhase};
use mosaic::config::Config;
use mosaic::feed::{PageData, SortType};
use mosaic::{proxy, ui};

/// Get the config file path (~/.config/mosaic/config.toml).
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("mosaic")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "mosaic", about = "Terminal photo feed browser")]
struct Args {
    /// Initial sort mode
    #[arg(long, value_parser = ["recent", "oldest", "brand"], default_value = "recent")]
    sort: String,

    /// Override the feed service base URL
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Override the image proxy port (0 = ephemeral)
    #[arg(long, value_name = "PORT")]
    proxy_port: Option<u16>,

    /// Use an alternate config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Fetch page 0 before entering the event loop, so the first frame is
/// either the populated grid or the full-screen error state.
async fn load_initial_page(app: &mut App) {
    let sort = app.sort;
    let generation = app.store.generation();
    let Some(page) = app.store.begin_page_fetch() else {
        return;
    };
    let result = if sort.is_brand() {
        app.api
            .feeds_by_brand(sort.type_code(), page, BRAND_PAGE_SIZE)
            .await
            .map(|response| PageData::Brand(response.brand_list))
    } else {
        app.api
            .feeds(sort.type_code(), page, FEED_PAGE_SIZE)
            .await
            .map(PageData::Flat)
    };
    match result {
        Ok(data) => {
            app.store.complete_page(sort, generation, data);
            app.phase = FeedsPhase::Ready;
            app.rebuild_feeds();
        }
        Err(error) => {
            tracing::error!(error = %error, "Initial feed load failed");
            app.store.fail_page(sort, generation);
            app.phase = FeedsPhase::Error(error.to_string());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(api_base) = args.api_base {
        config.api_base_url = api_base;
    }
    if let Some(port) = args.proxy_port {
        config.proxy_port = port;
    }
    // Env var wins; the config token only fills the gap.
    if std::env::var("MOSAIC_API_TOKEN").is_err() {
        if let Some(token) = &config.api_token {
            std::env::set_var("MOSAIC_API_TOKEN", token);
        }
    }

    let sort = SortType::from_name(&args.sort).unwrap_or_default();

    let client = reqwest::Client::builder()
        .user_agent(concat!("mosaic/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    // Bind the image proxy before anything renders; the cell loader needs
    // its bound address for URL rewriting.
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.proxy_port))
        .await
        .context("Failed to bind image proxy listener")?;
    let proxy_addr = listener
        .local_addr()
        .context("Failed to read image proxy address")?;
    tokio::spawn(proxy::serve(listener, client.clone()));

    let api = FeedApi::new(client.clone(), &config.api_base_url)
        .context("Invalid feed service base URL")?;

    let mut app = App::new(api, client, format!("http://{}", proxy_addr), &config);
    app.set_sort(sort);

    // First page up front — the server-rendered initial data equivalent.
    load_initial_page(&mut app).await;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
