use anyhow::{anyhow, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use daily_prompt::config::{DailyPromptConfig, StoreKind};
use daily_prompt::DailyPrompt;
use mimalloc::MiMalloc;
use runtime::{AppConfig, AppConfigProvider, CliArgs, ConfigProvider, DatabaseConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use url::Url;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const INGRESS_MODULE: &str = "api_ingress";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Daily Prompt Server - one question a day, answered for tokens
#[derive(Parser)]
#[command(name = "daily-prompt-server")]
#[command(about = "Daily Prompt Server - one question a day, answered for tokens")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use the in-memory store instead of the database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Daily Prompt Server starting");
    tracing::debug!(server = ?config.server, "Effective server configuration");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Only sqlite is wired; anything else is rejected up front.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim().to_owned();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(&raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Database section with the DSN rewritten to an absolute sqlite path.
fn resolve_database(config: &AppConfig, create_dirs: bool) -> Result<Option<DatabaseConfig>> {
    let Some(db) = config.database.clone() else {
        return Ok(None);
    };
    detect_from_dsn(&db)?;

    let base_dir = PathBuf::from(&config.server.home_dir);
    let mut url = db.url.trim().to_owned();
    if url.starts_with("sqlite://") {
        url = absolutize_sqlite_dsn(&url, &base_dir, create_dirs)?;
    }
    Ok(Some(DatabaseConfig { url, ..db }))
}

/// HTTP host settings: the `api_ingress` module section, with the bind address
/// taken from `server.host`/`server.port` unless the section sets one and no
/// `--port` was given.
fn ingress_config(provider: &AppConfigProvider, args: &CliArgs) -> Result<ApiIngressConfig> {
    let mut cfg: ApiIngressConfig = provider.module_config(INGRESS_MODULE)?;
    let explicit_bind = provider
        .get_module_config(INGRESS_MODULE)
        .and_then(|raw| raw.get("bind_addr"))
        .is_some();

    if !explicit_bind || args.port.is_some() {
        let server = &provider.app().server;
        cfg.bind_addr = format!("{}:{}", server.host, server.port);
    }

    cfg.bind_addr
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid bind address '{}': {}", cfg.bind_addr, e))?;
    Ok(cfg)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let database = if args.mock {
        tracing::info!("--mock set, using the in-memory store");
        None
    } else {
        let db = resolve_database(&config, true)?;
        match &db {
            Some(db) => tracing::info!("Using database: {}", db.url),
            None => tracing::warn!("No database configuration found"),
        }
        db
    };

    let provider = AppConfigProvider::new(config);
    let ingress = ApiIngress::new(ingress_config(&provider, &args)?);

    let prompts = DailyPrompt::new();
    prompts
        .init(&provider, database.as_ref(), args.mock)
        .await
        .context("daily_prompt init failed")?;

    let routes = prompts.register_rest(Router::new())?;
    ingress.build_router(routes, Some(DailyPrompt::openapi()))?;

    let cancel = CancellationToken::new();
    let signals = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = api_ingress::wait_for_shutdown().await {
                tracing::error!(error = %e, "Signal handler failed");
            }
            cancel.cancel();
        })
    };

    let result = ingress.serve(cancel, None).await;
    signals.abort();
    tracing::info!("Daily Prompt Server stopped");
    result
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    let provider = AppConfigProvider::new(config);
    ingress_config(&provider, &args)?;

    let module: DailyPromptConfig = provider.module_config(daily_prompt::module::MODULE_NAME)?;
    if !args.mock && module.store == StoreKind::Sql {
        resolve_database(provider.app(), false)?.ok_or_else(|| {
            anyhow!("daily_prompt store is `sql` but no `database` section is configured")
        })?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", provider.app().to_yaml()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_dsn_is_kept() {
        let out = absolutize_sqlite_dsn("sqlite://:memory:", Path::new("/srv"), false).unwrap();
        assert_eq!(out, "sqlite::memory:");
    }

    #[test]
    fn relative_dsn_is_joined_to_home() {
        let out =
            absolutize_sqlite_dsn("sqlite://database/p.db?mode=rwc", Path::new("/srv/home"), false)
                .unwrap();
        assert_eq!(out, "sqlite:///srv/home/database/p.db?mode=rwc");
    }

    #[test]
    fn non_sqlite_dsn_is_rejected() {
        let db = DatabaseConfig {
            url: "postgresql://localhost/prompts".into(),
            max_conns: None,
            busy_timeout_ms: None,
        };
        assert!(detect_from_dsn(&db).is_err());
    }

    fn args(port: Option<u16>) -> CliArgs {
        CliArgs {
            config: None,
            port,
            print_config: false,
            verbose: 0,
            mock: false,
        }
    }

    #[test]
    fn bind_addr_follows_server_section_unless_set() {
        let mut app = AppConfig::default();
        app.server.host = "127.0.0.1".into();
        app.server.port = 9100;
        let provider = AppConfigProvider::new(app.clone());
        assert_eq!(ingress_config(&provider, &args(None)).unwrap().bind_addr, "127.0.0.1:9100");

        app.modules.insert(
            INGRESS_MODULE.into(),
            serde_json::json!({ "bind_addr": "0.0.0.0:7000" }),
        );
        let provider = AppConfigProvider::new(app);
        assert_eq!(ingress_config(&provider, &args(None)).unwrap().bind_addr, "0.0.0.0:7000");
        assert_eq!(
            ingress_config(&provider, &args(Some(9100))).unwrap().bind_addr,
            "127.0.0.1:9100"
        );
    }
}
