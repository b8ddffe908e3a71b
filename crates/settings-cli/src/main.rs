use clap::{Parser, Subcommand};
use component_settings::{check_config, get_record_schema};
use serde_json::Value;
use settings_spec::{
    JsonFileStore, OptionStore, PageConfig, PageResponse, RequestContext, SettingsPage,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const STORE_DIR_ENV: &str = "SETTINGS_PAGE_STORE_DIR";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Settings page renderer",
    long_about = "Renders settings pages from a JSON configuration and persists submitted values to one option record"
)]
struct Cli {
    /// Log pipeline activity to stderr (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a page configuration for unknown field types and duplicate keys.
    Check {
        /// Path to the page configuration JSON.
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
    },
    /// Print the JSON Schema of page configuration files.
    Schema,
    /// Print the JSON Schema of the option record a page stores.
    RecordSchema {
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
    },
    /// Render the page for a GET request.
    Render {
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
        /// Current page URL; selects the active tab and carries query flags.
        #[arg(long, default_value = "/")]
        url: String,
        /// Directory holding option records (defaults to SETTINGS_PAGE_STORE_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        store_dir: Option<PathBuf>,
    },
    /// Submit a url-encoded form body to the page.
    Submit {
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
        #[arg(long, default_value = "/")]
        url: String,
        /// Form body, e.g. `opt%5Bkey%5D=value&save_opt=1`.
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,
        /// File containing the form body.
        #[arg(long, value_name = "FILE")]
        body_file: Option<PathBuf>,
        /// After a save, render the page the redirect points to.
        #[arg(long)]
        follow: bool,
        #[arg(long, value_name = "DIR")]
        store_dir: Option<PathBuf>,
    },
    /// Print the stored option record.
    Show {
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
        #[arg(long, value_name = "DIR")]
        store_dir: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Check { config } => run_check(&config),
        Command::Schema => run_schema(),
        Command::RecordSchema { config } => run_record_schema(&config),
        Command::Render {
            config,
            url,
            store_dir,
        } => run_render(&config, url, store_dir),
        Command::Submit {
            config,
            url,
            body,
            body_file,
            follow,
            store_dir,
        } => run_submit(&config, url, body, body_file, follow, store_dir),
        Command::Show { config, store_dir } => run_show(&config, store_dir),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_check(config_path: &Path) -> CliResult<()> {
    let report: Value = serde_json::from_str(&check_config(&read_config_text(config_path)?))?;
    if let Some(error) = report.get("error").and_then(Value::as_str) {
        return Err(error.into());
    }

    let issues = report["issues"].as_array().cloned().unwrap_or_default();
    for issue in &issues {
        eprintln!(
            "{}: {}: {}",
            issue["severity"].as_str().unwrap_or("error"),
            issue["code"].as_str().unwrap_or_default(),
            issue["message"].as_str().unwrap_or_default()
        );
    }

    if report["valid"].as_bool().unwrap_or(false) {
        println!("Configuration is valid.");
        return Ok(());
    }
    let errors = issues
        .iter()
        .filter(|issue| issue["severity"] != "warning")
        .count();
    Err(format!("{} configuration error(s) found", errors).into())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(PageConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_record_schema(config_path: &Path) -> CliResult<()> {
    let schema: Value = serde_json::from_str(&get_record_schema(&read_config_text(config_path)?))?;
    if let Some(error) = schema.get("error").and_then(Value::as_str) {
        return Err(error.into());
    }
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_render(config_path: &Path, url: String, store_dir: Option<PathBuf>) -> CliResult<()> {
    let mut page = open_page(config_path, store_dir)?;
    let response = page.build_page(&RequestContext::get(url))?;
    print_response(&response);
    Ok(())
}

fn run_submit(
    config_path: &Path,
    url: String,
    body: Option<String>,
    body_file: Option<PathBuf>,
    follow: bool,
    store_dir: Option<PathBuf>,
) -> CliResult<()> {
    let body = match (body, body_file) {
        (Some(body), _) => body,
        (None, Some(path)) => fs::read_to_string(&path)?.trim_end().to_string(),
        (None, None) => return Err("either --body or --body-file is required".into()),
    };

    let mut page = open_page(config_path, store_dir)?;
    let request = RequestContext::from_form_body(url, &body);
    let response = page.build_page(&request)?;
    print_response(&response);

    if follow && let PageResponse::Redirect { location } = &response {
        info!(location = location.as_str(), "following redirect");
        let next = page.build_page(&RequestContext::get(location.clone()))?;
        print_response(&next);
    }
    Ok(())
}

fn run_show(config_path: &Path, store_dir: Option<PathBuf>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = JsonFileStore::new(resolve_store_dir(store_dir)?);
    let record = store.read(&config.option_name)?.unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn open_page(
    config_path: &Path,
    store_dir: Option<PathBuf>,
) -> CliResult<SettingsPage<JsonFileStore>> {
    let config = load_config(config_path)?;
    let store_root = resolve_store_dir(store_dir)?;
    debug!(store = %store_root.display(), option = config.option_name.as_str(), "opening page");
    Ok(SettingsPage::from_config(
        JsonFileStore::new(store_root),
        config,
    ))
}

fn print_response(response: &PageResponse) {
    match response {
        PageResponse::Redirect { location } => println!("Redirect: {}", location),
        PageResponse::Html(html) => println!("{}", html),
    }
}

fn read_config_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err).into())
}

fn load_config(path: &Path) -> CliResult<PageConfig> {
    Ok(PageConfig::from_json(&read_config_text(path)?)?)
}

fn resolve_store_dir(explicit: Option<PathBuf>) -> CliResult<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = env::var_os(STORE_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    Ok(env::current_dir()?)
}
