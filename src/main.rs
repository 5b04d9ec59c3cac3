use anyhow::{Context, Result};
use clap::Parser;
use pressroom::aggregate::resolve_featured_images;
use pressroom::api::{AuthScheme, Backend, Credentials, WpApi, WpClient};
use pressroom::app::{App, AppEvent, NO_CATEGORY};
use pressroom::config::{Config, PASSWORD_ENV};
use pressroom::ui;
use pressroom::util::{single_line, strip_control_chars, truncate_to_width};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Get the config directory path (~/.config/pressroom/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("pressroom"))
}

#[derive(Parser, Debug)]
#[command(name = "pressroom", about = "Terminal admin console for WordPress posts")]
struct Args {
    /// Config file (default: ~/.config/pressroom/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Site root, overriding the config file
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Login name, overriding the config file
    #[arg(long)]
    username: Option<String>,

    /// Authentication scheme, overriding the config file
    #[arg(long, value_enum)]
    auth: Option<AuthScheme>,

    /// Print the post table to stdout and exit
    #[arg(long, conflicts_with = "check_auth")]
    list: bool,

    /// Log in, report the authenticated user and exit
    #[arg(long)]
    check_auth: bool,
}

/// Create the config directory with user-only permissions.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    Ok(())
}

/// Send tracing output to a log file so it never draws over the TUI.
fn init_logging(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("pressroom.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(ref base_url) = args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(ref username) = args.username {
        config.username = Some(username.clone());
    }
    if let Some(auth) = args.auth {
        config.auth = auth;
    }
}

fn credentials(config: &Config) -> Result<Credentials> {
    let username = config
        .username
        .clone()
        .context("No username configured: set `username` in config.toml or pass --username")?;
    let password: SecretString = config.resolve_password().with_context(|| {
        format!(
            "No password configured: set `password` in config.toml or {}",
            PASSWORD_ENV
        )
    })?;
    Ok(Credentials { username, password })
}

async fn login(config: &Config) -> Result<WpApi> {
    let credentials = credentials(config)?;
    let client = WpClient::new(&config.base_url, config.client_options())
        .with_context(|| format!("Invalid base URL '{}'", config.base_url))?;
    client
        .login(&credentials, config.auth)
        .await
        .with_context(|| format!("Login to {} failed", config.base_url))
}

/// `--list`: one listing plus image aggregation, printed as a plain table.
async fn print_posts(api: &WpApi, config: &Config) -> Result<()> {
    let categories = pressroom::api::index_categories(
        api.list_categories()
            .await
            .context("Failed to list categories")?,
    );
    let posts = api
        .list_posts(&config.statuses)
        .await
        .context("Failed to list posts")?;
    let images = resolve_featured_images(api, &posts, &config.placeholder_image_url).await;

    println!(
        "{:>6}  {:<40}  {:<8}  {:<20}  {}",
        "ID", "TITLE", "STATUS", "CATEGORY", "FEATURED IMAGE"
    );
    for post in &posts {
        let title = post.title_text();
        let title = single_line(&strip_control_chars(&title)).into_owned();
        let category = post
            .category()
            .and_then(|id| categories.get(&id))
            .map(String::as_str)
            .unwrap_or(NO_CATEGORY);
        let image = images
            .get(&post.id)
            .map(String::as_str)
            .unwrap_or(&config.placeholder_image_url);
        println!(
            "{:>6}  {:<40}  {:<8}  {:<20}  {}",
            post.id,
            truncate_to_width(&title, 40),
            post.status.as_str(),
            truncate_to_width(&strip_control_chars(category), 20),
            image
        );
    }
    println!("{} posts", posts.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;
    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    apply_overrides(&mut config, &args);

    let api = login(&config).await?;

    if args.check_auth {
        println!(
            "Logged in to {} as {} ({})",
            config.base_url,
            api.session().user(),
            api.session().scheme().name()
        );
        api.logout();
        return Ok(());
    }

    if args.list {
        let result = print_posts(&api, &config).await;
        api.logout();
        return result;
    }

    let user = api.session().user().to_string();
    let backend: Arc<dyn Backend> = Arc::new(api);
    let mut app = App::new(backend, &config, user);

    let warnings = app.keybindings.apply_overrides(&config.keybindings);
    if !warnings.is_empty() {
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Ignoring keybinding override");
        }
        app.set_status(format!("Keybinding config: {}", warnings.join("; ")));
    }

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, event_tx, event_rx).await?;

    tracing::info!("Exiting");
    Ok(())
}
