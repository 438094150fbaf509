use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use ainews::api::{ApiClient, ApiError, EmailFrequency};
use ainews::config::{Config, API_URL_ENV};
use ainews::session::{snap_min_score, FilterPatch, SessionStore};
use ainews::storage::{Database, DatabaseError, MemoryStorage, StateStorage};
use ainews::ui::{self, render};
use ainews::util::validate_url_for_open;
use ainews::view::{
    message_for, sign_in, sign_up, ArticleDetailPage, ArticlesPage, AuthError, AuthForm,
    SettingsError, SettingsPage, TodayPage, ViewState,
};

/// Environment variable read when `--password` is not given.
const PASSWORD_ENV: &str = "AINEWS_PASSWORD";

/// Get the config directory path (~/.config/ainews/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("ainews"))
}

#[derive(Parser, Debug)]
#[command(
    name = "ainews",
    version,
    about = "Terminal client for the AI news aggregation service"
)]
struct Args {
    /// Backend REST root, e.g. http://localhost:8000/api/v1
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Keep session state in memory only (nothing is written to disk)
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Today's top picks (the default)
    Today {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        min_score: Option<u32>,
    },

    /// Filtered article listing. Flags override the saved filters for this run only.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        source: Option<String>,
        /// 0-90 in steps of 10; other values are snapped down
        #[arg(long, value_parser = min_score_arg)]
        min_score: Option<u32>,
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one article
    Show {
        id: i64,
        /// Open the article in the system browser
        #[arg(long)]
        open: bool,
    },

    /// List available categories and sources
    Options,

    /// Show or change the saved listing filters
    Filter {
        #[command(subcommand)]
        action: FilterCmd,
    },

    /// Sign in (password from --password, AINEWS_PASSWORD or stdin)
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        email: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored credential
    Logout,

    /// Show the signed-in profile
    Me,

    /// Update delivery preferences
    Prefs {
        /// Toggle a preferred category (repeatable)
        #[arg(long = "toggle", value_name = "CATEGORY")]
        toggle: Vec<String>,
        /// Minimum quality score (0-90, step 10)
        #[arg(long)]
        min_score: Option<u32>,
        /// realtime, daily or weekly
        #[arg(long)]
        frequency: Option<EmailFrequency>,
        /// Enable or disable email delivery
        #[arg(long)]
        email: Option<bool>,
    },

    /// Backend maintenance (requires an admin account)
    Admin {
        #[command(subcommand)]
        action: AdminCmd,
    },

    /// Interactive browser
    Browse,
}

#[derive(Subcommand, Debug)]
enum FilterCmd {
    Show,
    /// Merge the given values into the saved filters ("" clears one)
    Set {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        source: Option<String>,
        /// 0-90 in steps of 10; other values are snapped down
        #[arg(long, value_parser = min_score_arg)]
        min_score: Option<u32>,
        #[arg(long)]
        search: Option<String>,
    },
    Clear,
}

/// `--min-score` for listing filters, snapped to the selectable range.
fn min_score_arg(value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map(snap_min_score)
        .map_err(|e| format!("'{value}' is not a valid score: {e}"))
}

#[derive(Subcommand, Debug)]
enum AdminCmd {
    /// Run all crawlers now
    Crawl,
    /// Score and summarize pending articles
    Process {
        #[arg(long)]
        limit: Option<u32>,
    },
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !args.ephemeral && !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // User-only access: the state database holds the bearer token
    #[cfg(unix)]
    if config_dir.exists() {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let config = Config::load(&config_dir.join("config.toml"))
        .context("Failed to load config.toml")?
        .with_overrides(std::env::var(API_URL_ENV).ok(), args.api_url.clone());
    let base = config.api_base()?;

    let storage: Arc<dyn StateStorage> = if args.ephemeral {
        Arc::new(MemoryStorage::new())
    } else {
        let db_path = config_dir.join("state.db");
        let db_path_str = db_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
        match Database::open(db_path_str).await {
            Ok(db) => Arc::new(db),
            Err(DatabaseError::InstanceLocked) => {
                eprintln!(
                    "Error: Another instance of ainews appears to be running. Please close it and try again."
                );
                std::process::exit(1);
            }
            Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
        }
    };

    let session = Arc::new(
        SessionStore::hydrate(storage)
            .await
            .context("Failed to restore session")?,
    );
    let client = ApiClient::new(base, config.timeout(), session)
        .context("Failed to build HTTP client")?;

    let command = args.command.unwrap_or(Cmd::Today {
        limit: None,
        min_score: None,
    });
    run(command, &client, &config).await
}

async fn run(cmd: Cmd, client: &ApiClient, config: &Config) -> Result<()> {
    let session = client.session();
    let width = render::terminal_width();
    let mut out = io::stdout().lock();

    match cmd {
        Cmd::Today { limit, min_score } => {
            let mut page = TodayPage::new(
                limit.unwrap_or(config.today_limit),
                min_score.unwrap_or(config.today_min_score),
            );
            page.load(client).await;
            fail_on_error(page.state())?;
            render::today_page(&mut out, &page, width)?;
        }

        Cmd::List {
            page: page_number,
            category,
            source,
            min_score,
            search,
        } => {
            let filters = session.filters().merge(&FilterPatch {
                category,
                source,
                min_score,
                search,
            });
            let mut page = ArticlesPage::new(config.page_size);
            page.load(client, &filters).await;
            if page_number != 1 {
                fail_on_error(page.state())?;
                page.load_page(client, page_number).await?;
            }
            fail_on_error(page.state())?;
            render::articles_page(&mut out, &page, width)?;
        }

        Cmd::Show { id, open } => {
            let mut page = ArticleDetailPage::new();
            if let ViewState::Failed(err) = page.load(client, id).await {
                anyhow::bail!(message_for(err));
            }
            if let ViewState::Ready(article) = page.state() {
                render::article_detail(&mut out, article, width)?;
                if open || config.open_in_browser {
                    let url = validate_url_for_open(&article.url)
                        .with_context(|| format!("Refusing to open '{}'", article.url))?;
                    open::that(url.as_str()).context("Failed to launch browser")?;
                }
            }
        }

        Cmd::Options => {
            let (categories, sources) = client
                .articles()
                .filter_options()
                .await
                .map_err(api_error)?;
            render::filter_options(&mut out, &categories, &sources)?;
        }

        Cmd::Filter { action } => match action {
            FilterCmd::Show => render::filters(&mut out, &session.filters())?,
            FilterCmd::Set {
                category,
                source,
                min_score,
                search,
            } => {
                let patch = FilterPatch {
                    category,
                    source,
                    min_score,
                    search,
                };
                let filters = if patch.is_empty() {
                    session.filters()
                } else {
                    session.set_filters(patch).await?
                };
                render::filters(&mut out, &filters)?;
            }
            FilterCmd::Clear => {
                session.clear_filters().await?;
                writeln!(out, "Filters cleared.")?;
            }
        },

        Cmd::Login { email, password } => {
            let password = read_password(password).await?;
            let user = sign_in(client, &AuthForm::sign_in(email, password))
                .await
                .map_err(auth_error)?;
            writeln!(out, "Signed in as {}", user.email)?;
        }

        Cmd::Register {
            email,
            username,
            password,
        } => {
            let password = read_password(password).await?;
            let mut form = AuthForm::register(email, password.clone(), password);
            form.username = username;
            let user = sign_up(client, &form).await.map_err(auth_error)?;
            writeln!(out, "Account created. Signed in as {}", user.email)?;
        }

        Cmd::Logout => {
            session.logout().await?;
            writeln!(out, "Signed out.")?;
        }

        Cmd::Me => {
            if !session.is_authenticated() {
                anyhow::bail!("Not signed in. Run `ainews login <email>` first.");
            }
            let user = client.users().me().await.map_err(api_error)?;
            session.set_user(Some(user.clone()))?;
            render::user(&mut out, &user)?;
        }

        Cmd::Prefs {
            toggle,
            min_score,
            frequency,
            email,
        } => {
            let mut settings = SettingsPage::new();
            let form = settings.open(client).await.map_err(settings_error)?;
            let untouched = toggle.is_empty()
                && min_score.is_none()
                && frequency.is_none()
                && email.is_none();
            for category in &toggle {
                form.toggle_category(category);
            }
            if let Some(score) = min_score {
                let stored = form.set_min_quality_score(score);
                if stored != score {
                    writeln!(out, "Minimum score adjusted to {stored}")?;
                }
            }
            if let Some(frequency) = frequency {
                form.email_frequency = frequency;
            }
            if let Some(enabled) = email {
                form.email_enabled = enabled;
            }

            let user = if untouched {
                session.user()
            } else {
                Some(settings.save(client).await.map_err(settings_error)?)
            };
            if let Some(user) = user {
                render::user(&mut out, &user)?;
            }
        }

        Cmd::Admin { action } => {
            let admin = client.admin();
            match action {
                AdminCmd::Crawl => {
                    let ack = admin.crawl().await.map_err(api_error)?;
                    render::crawl_ack(&mut out, &ack)?;
                }
                AdminCmd::Process { limit } => {
                    let ack = admin
                        .process(limit.unwrap_or(config.process_limit))
                        .await
                        .map_err(api_error)?;
                    render::process_ack(&mut out, &ack)?;
                }
                AdminCmd::Stats => {
                    let stats = admin.stats().await.map_err(api_error)?;
                    render::admin_stats(&mut out, &stats)?;
                }
            }
        }

        Cmd::Browse => {
            drop(out);
            restore_user(client).await;
            return ui::run(client.clone(), config.page_size).await;
        }
    }

    Ok(())
}

/// Refresh the cached profile for a restored token. A rejected token is
/// cleared by the client; other failures just leave the profile uncached.
async fn restore_user(client: &ApiClient) {
    let session = client.session();
    if !session.is_authenticated() || session.user().is_some() {
        return;
    }
    match client.users().me().await {
        Ok(user) => {
            if let Err(e) = session.set_user(Some(user)) {
                tracing::debug!(error = %e, "Session ended before profile arrived");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not restore signed-in profile"),
    }
}

fn fail_on_error<T>(state: &ViewState<T>) -> Result<()> {
    match state {
        ViewState::Failed(err) => Err(anyhow::anyhow!(message_for(err))),
        _ => Ok(()),
    }
}

fn api_error(err: ApiError) -> anyhow::Error {
    anyhow::anyhow!(message_for(&err))
}

fn auth_error(err: AuthError) -> anyhow::Error {
    match err {
        AuthError::Api(e) => api_error(e),
        other => other.into(),
    }
}

fn settings_error(err: SettingsError) -> anyhow::Error {
    match err {
        SettingsError::Api(e) => api_error(e),
        SettingsError::NotSignedIn => {
            anyhow::anyhow!("Not signed in. Run `ainews login <email>` first.")
        }
        other => other.into(),
    }
}

/// `--password`, then `AINEWS_PASSWORD`, then a hidden prompt.
async fn read_password(flag: Option<String>) -> Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        if !password.is_empty() {
            return Ok(password);
        }
    }
    tokio::task::spawn_blocking(|| ui::read_password("Password: "))
        .await
        .context("Password prompt task failed")?
        .context("Failed to read password")
}
