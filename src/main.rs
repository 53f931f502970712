use amber_monitor::amber::{AmberClient, CurrentPriceOptions, DATE_FORMAT, PricingApi};
use amber_monitor::config::{API_KEY_ENV, ViewerZone};
use amber_monitor::dashboard::{
    DashboardSettings, Operation, Report, ViewState, fetch_operation, spawn_dashboard,
};
use amber_monitor::logging::{get_logger, init_logging};
use amber_monitor::render;
use amber_monitor::report::{LiveRange, ReportOptions};
use amber_monitor::scheduler::TokioScheduler;
use amber_monitor::store::{FileSessionStore, SessionStore};
use amber_monitor::{Config, auth};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "amber-monitor")]
#[command(about = "Usage and price reports for Amber Electric accounts")]
#[command(version = env!("APP_VERSION"))]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an API key and select the account's active site
    Login {
        /// API key; falls back to the AMBER_API_KEY environment variable
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Forget the stored key, site and token
    Logout,
    /// Show whether a session is active
    Status,
    /// List the account's sites
    Sites,
    /// Daily usage for the trailing window
    Overview,
    /// Half-hourly usage and prices for one date
    Day {
        /// Date (YYYY-MM-DD)
        date: String,
    },
    /// Recent usage
    Live {
        /// 6h, 12h, 24h or today
        #[arg(long)]
        range: Option<String>,
    },
    /// Current price and forecast
    Prices {
        /// Intervals before the current one
        #[arg(long)]
        previous: Option<u32>,
        /// Intervals after the current one
        #[arg(long, default_value_t = 12)]
        next: u32,
    },
    /// Keep a view on screen with auto-refresh and rate-limit retry
    Watch {
        #[arg(value_enum, default_value_t = WatchView::Live)]
        view: WatchView,
        /// Live range (live view)
        #[arg(long)]
        range: Option<String>,
        /// Date (day view, YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Serve the reports as a local JSON API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WatchView {
    Overview,
    Day,
    Live,
    Prices,
}

struct App {
    config: Config,
    store: Arc<dyn SessionStore>,
    api: Arc<dyn PricingApi>,
    options: ReportOptions,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    config.validate()?;
    init_logging(&config.logging)?;

    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.store.path));
    let api: Arc<dyn PricingApi> = Arc::new(AmberClient::new(&config.api, store.clone())?);
    let options = ReportOptions::from_config(&config)?;
    let app = App {
        config,
        store,
        api,
        options,
        json: cli.json,
    };

    match cli.command {
        Commands::Login { api_key } => login(&app, api_key).await,
        Commands::Logout => {
            auth::logout(app.store.as_ref())?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Status => status(&app),
        Commands::Sites => {
            let sites = app.api.get_sites().await?;
            if app.json {
                println!("{}", serde_json::to_string_pretty(&sites)?);
            } else {
                print!("{}", render::render_sites(&sites));
            }
            Ok(())
        }
        Commands::Overview => run_once(&app, Operation::Overview).await,
        Commands::Day { date } => {
            let date = parse_date(&date)?;
            run_once(&app, Operation::Detail { date }).await
        }
        Commands::Live { range } => {
            let range = live_range(&app.config, range.as_deref())?;
            run_once(&app, Operation::Live { range }).await
        }
        Commands::Prices { previous, next } => {
            let options = CurrentPriceOptions {
                previous,
                next: Some(next),
                resolution: Some(app.options.resolution_minutes),
            };
            run_once(&app, Operation::Prices { options }).await
        }
        Commands::Watch { view, range, date } => {
            let operation = match view {
                WatchView::Overview => Operation::Overview,
                WatchView::Day => {
                    let date = match date {
                        Some(d) => parse_date(&d)?,
                        None => app.options.zone.today(),
                    };
                    Operation::Detail { date }
                }
                WatchView::Live => Operation::Live {
                    range: live_range(&app.config, range.as_deref())?,
                },
                WatchView::Prices => Operation::Prices {
                    options: CurrentPriceOptions {
                        previous: None,
                        next: Some(12),
                        resolution: Some(app.options.resolution_minutes),
                    },
                },
            };
            watch(&app, operation).await
        }
        Commands::Serve { host, port } => serve(app, host, port).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    Ok(config)
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}'; use YYYY-MM-DD", value))
}

fn live_range(config: &Config, requested: Option<&str>) -> Result<LiveRange> {
    let range = match requested {
        Some(name) => name.parse::<LiveRange>()?,
        None => config.default_live_range()?,
    };
    Ok(range)
}

async fn login(app: &App, api_key: Option<String>) -> Result<()> {
    let api_key = api_key
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .ok_or_else(|| anyhow!("No API key given; pass --api-key or set {}", API_KEY_ENV))?;

    let site = auth::login(app.store.as_ref(), app.api.as_ref(), &api_key).await?;
    if app.json {
        println!("{}", serde_json::to_string_pretty(&site)?);
    } else {
        println!("Logged in. Active site: {}", site.id);
    }
    Ok(())
}

fn status(app: &App) -> Result<()> {
    let session = app.store.load()?;
    let authenticated = auth::is_authenticated(app.store.as_ref());
    if app.json {
        let body = serde_json::json!({
            "authenticated": authenticated,
            "site_id": session.site_id(),
            "api_key_stored": session.api_key().is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if authenticated {
        println!(
            "Logged in. Active site: {}",
            session.site_id().unwrap_or("-")
        );
    } else {
        println!("Not logged in. Run `amber-monitor login`.");
    }
    Ok(())
}

fn print_report(report: &Report, json: bool, zone: ViewerZone) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render::render_report(report, zone));
    }
    Ok(())
}

async fn run_once(app: &App, operation: Operation) -> Result<()> {
    let report = fetch_operation(
        app.api.as_ref(),
        app.store.as_ref(),
        operation,
        &app.options,
    )
    .await?;
    print_report(&report, app.json, app.options.zone)
}

fn print_state(state: &ViewState, json: bool, zone: ViewerZone) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else {
        // Clear the screen and home the cursor
        print!("\x1B[2J\x1B[H{}", render::render_view_state(state, zone));
    }
    Ok(())
}

async fn watch(app: &App, operation: Operation) -> Result<()> {
    let logger = get_logger("main");
    let scheduler = TokioScheduler::from_current()?;
    let handle = spawn_dashboard(
        app.api.clone(),
        app.store.clone(),
        app.options,
        DashboardSettings::from_config(&app.config.live),
        Arc::new(scheduler),
    );
    let mut states = handle.subscribe();
    handle.show(operation)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                print_state(&state, app.json, app.options.zone)?;
            }
            _ = &mut ctrl_c => {
                logger.info("Interrupted; stopping dashboard");
                break;
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}

#[cfg(feature = "web")]
async fn serve(app: App, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| app.config.web.host.clone());
    let port = port.unwrap_or(app.config.web.port);
    let state = amber_monitor::web::AppState {
        default_range: app.config.default_live_range()?,
        api: app.api,
        store: app.store,
        options: app.options,
    };
    amber_monitor::web::serve(state, &host, port, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

#[cfg(not(feature = "web"))]
async fn serve(_app: App, _host: Option<String>, _port: Option<u16>) -> Result<()> {
    Err(anyhow!("This build does not include the web feature"))
}
