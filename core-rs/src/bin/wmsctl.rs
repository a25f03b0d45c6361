//! wmsctl - WMS access command line
//!
//! Sign in against the backend, inspect the session, check permissions and
//! issue authenticated calls from a terminal.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wms_access::rbac::{granted_keys, is_admin, satisfies};
use wms_access::{
    AuthService, ClientConfig, CredentialStore, FileCredentialStore, MemoryCredentialStore, Method, PermissionCatalog,
    Requirement, SessionState, SessionStore,
};

#[derive(Parser)]
#[command(name = "wmsctl")]
#[command(version)]
#[command(about = "WMS access client", long_about = None)]
struct Cli {
    /// Client config file (YAML)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session token
    Login {
        /// Account email
        email: String,
        /// Password (falls back to WMS_PASSWORD)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show the signed-in profile and its permissions
    Whoami,
    /// Check a permission requirement ("a|b" any-of, "a,b" all-of)
    Can {
        /// Requirement expression
        requirement: String,
        /// Exit non-zero when the requirement is not met
        #[arg(long)]
        strict: bool,
    },
    /// Issue a raw backend call
    Call {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,
        /// Path relative to the backend base URL
        path: String,
        /// JSON body
        #[arg(long, short = 'd')]
        data: Option<String>,
        /// Send without the bearer token
        #[arg(long)]
        public: bool,
    },
    /// Set a password from an emailed setup token
    SetPassword {
        /// Setup token
        token: String,
        /// New password (falls back to WMS_PASSWORD)
        #[arg(long, short = 'p')]
        password: Option<String>,
    },
    /// Validate a permission catalog file
    Catalog {
        /// Catalog YAML path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ClientConfig::load_or_default(cli.config.as_deref())
        .with_context(|| "failed to load client config")?;

    match cli.command {
        Commands::Catalog { path } => handle_catalog(&path),
        Commands::Login { email, password } => handle_login(&build_service(&config)?, &email, password).await,
        Commands::Logout => {
            build_service(&config)?.sign_out();
            println!("{} signed out", "✓".green());
            Ok(())
        }
        Commands::Whoami => handle_whoami(&build_service(&config)?).await,
        Commands::Can { requirement, strict } => handle_can(&build_service(&config)?, &requirement, strict).await,
        Commands::Call { method, path, data, public } => {
            handle_call(&build_service(&config)?, &method, &path, data.as_deref(), public).await
        }
        Commands::SetPassword { token, password } => {
            let password = password_or_env(password)?;
            build_service(&config)?.set_password(&token, &password).await?;
            println!("{} password set", "✓".green());
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(config: &ClientConfig) -> anyhow::Result<AuthService> {
    let credentials: Box<dyn CredentialStore> = match credentials_path(config) {
        Some(path) => Box::new(FileCredentialStore::new(path)),
        None => Box::new(MemoryCredentialStore::new()),
    };
    let store = Arc::new(SessionStore::new(credentials).with_token_key(config.spec.credentials.storage_key.clone()));
    SessionStore::install_global(store.clone())?;
    Ok(AuthService::from_config(config, SessionStore::global())?)
}

/// Configured path, else ~/.wms/credentials.json
fn credentials_path(config: &ClientConfig) -> Option<PathBuf> {
    config
        .spec
        .credentials
        .path
        .clone()
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".wms").join("credentials.json")))
}

fn password_or_env(password: Option<String>) -> anyhow::Result<String> {
    match password.or_else(|| std::env::var("WMS_PASSWORD").ok()) {
        Some(p) if !p.is_empty() => Ok(p),
        _ => bail!("no password given (use --password or WMS_PASSWORD)"),
    }
}

async fn handle_login(service: &AuthService, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = password_or_env(password)?;
    match service.sign_in(email, &password).await? {
        SessionState::Authenticated { session, .. } => {
            println!("{} signed in as {}", "✓".green(), session.profile.display_name().bold());
            Ok(())
        }
        SessionState::Error { cause, .. } => bail!("signed in but profile failed to load: {}", cause),
        other => bail!("sign-in did not complete (state: {:?})", other),
    }
}

async fn handle_whoami(service: &AuthService) -> anyhow::Result<()> {
    let state = service.restore().await;
    let session = match &state {
        SessionState::Authenticated { session, .. } => session.clone(),
        SessionState::Error { cause, .. } => bail!("profile failed to load: {}", cause),
        _ => {
            println!("{}", "not signed in".yellow());
            return Ok(());
        }
    };

    let profile = &session.profile;
    println!("{} {}", profile.display_name().bold(), format!("({})", profile.id).dimmed());
    if let Some(email) = &profile.email {
        println!("  Email:   {}", email);
    }
    if let Some(company) = &profile.company_id {
        println!("  Company: {}", company);
    }
    match &profile.role {
        Some(role) => println!("  Role:    {} [{}]", role.name, role.id),
        None => println!("  Role:    {}", "none".yellow()),
    }
    if is_admin(&state) {
        println!("  Admin:   {}", "yes".cyan());
    }

    let keys = granted_keys(&state);
    println!("\n  Permissions ({}):", keys.len());
    for key in keys {
        println!("    {}", key);
    }
    Ok(())
}

async fn handle_can(service: &AuthService, expression: &str, strict: bool) -> anyhow::Result<()> {
    let requirement: Requirement = expression.parse()?;
    let state = service.restore().await;
    let allowed = satisfies(&state, &requirement);

    if allowed {
        println!("{} {}", "allow".green().bold(), requirement);
    } else {
        println!("{} {}", "deny".red().bold(), requirement);
        if strict {
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn handle_call(
    service: &AuthService,
    method: &str,
    path: &str,
    data: Option<&str>,
    public: bool,
) -> anyhow::Result<()> {
    let method: Method = method
        .to_ascii_uppercase()
        .parse()
        .with_context(|| format!("invalid HTTP method '{}'", method))?;
    let body = data
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .with_context(|| "--data is not valid JSON")?;

    if !public {
        service.restore().await;
    }

    let response = service.client().api_call(path, method, body.as_ref(), !public).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn handle_catalog(path: &Path) -> anyhow::Result<()> {
    let catalog = PermissionCatalog::load(path).with_context(|| format!("invalid catalog {}", path.display()))?;
    println!(
        "{} {} permissions, {} roles",
        "✓".green(),
        catalog.len(),
        catalog.roles().len()
    );

    let mut unknown = 0;
    for role in catalog.roles() {
        for key in catalog.validate_role(role) {
            unknown += 1;
            println!("  {} role '{}' grants unknown key {}", "!".yellow(), role.name, key);
        }
    }
    if unknown > 0 {
        bail!("{} unknown permission key(s) in role grants", unknown);
    }
    Ok(())
}
