//! OpenShift Express CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: layer `express.conf` files under command-line
//!    flags.
//! 2. **Wire observability**: install `tracing-subscriber` with an
//!    `EnvFilter` (`RUST_LOG`, default `warn`) and a text or JSON formatter
//!    on stderr.
//! 3. **Construct infrastructure**: build the [`transport::HttpTransport`]
//!    and inject it into a [`client::ExpressService`].
//! 4. **Run one operation** and print its result on stdout.

mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client::config::with_scheme;
use client::{ExpressConfiguration, ExpressService, User};
use protocol::{
    ApplicationName, CartridgeName, ClientIdentity, InstanceId, Login, Namespace, SshPublicKey,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use transport::HttpTransport;

/// Client name rendered into the user-agent.
const CLIENT_NAME: &str = "express-client";

/// OpenShift Express command-line client
#[derive(Parser)]
#[command(name = "express", version, about, long_about = None)]
struct Cli {
    /// Platform host or base URL (overrides libra_server)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Red Hat login (overrides default_rhlogin)
    #[arg(short = 'l', long, global = true)]
    rhlogin: Option<String>,

    /// Password for the login
    #[arg(
        short = 'p',
        long,
        env = "EXPRESS_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    password: Option<String>,

    /// Instance id reported in the user-agent (random if omitted)
    #[arg(long, global = true)]
    instance_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60, global = true)]
    timeout_secs: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show account, domain and applications
    UserInfo,

    /// List available cartridges
    Cartridges {
        /// List embeddable cartridges instead of frameworks
        #[arg(long)]
        embedded: bool,
    },

    /// Create the user's domain
    CreateDomain(DomainArgs),

    /// Change the namespace or SSH key of the user's domain
    ChangeDomain(DomainArgs),

    /// Create an application
    CreateApp(AppArgs),

    /// Start an application
    Start(AppArgs),

    /// Stop an application
    Stop(AppArgs),

    /// Restart an application
    Restart(AppArgs),

    /// Destroy an application
    Destroy(AppArgs),

    /// Show an application's status
    Status(AppArgs),

    /// Embed a cartridge into an application
    Embed(EmbedArgs),

    /// Remove an embedded cartridge from an application
    Unembed(EmbedArgs),

    /// Check that the login and password are accepted
    CheckCredentials,
}

#[derive(Args, Debug)]
struct DomainArgs {
    /// Namespace (alphanumeric, at most 16 characters)
    namespace: String,

    /// OpenSSH public key file
    #[arg(long)]
    ssh_key: PathBuf,
}

#[derive(Args, Debug)]
struct AppArgs {
    /// Application name (alphanumeric, at most 32 characters)
    name: String,

    /// Framework cartridge, e.g. jbossas-7.0
    cartridge: String,
}

#[derive(Args, Debug)]
struct EmbedArgs {
    /// Application name
    application: String,

    /// The application's framework cartridge
    app_cartridge: String,

    /// Cartridge to embed or remove, e.g. mysql-5.1
    embedded_cartridge: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = ExpressConfiguration::load().context("failed to load express.conf")?;
    let server = cli
        .server
        .as_deref()
        .map(with_scheme)
        .unwrap_or_else(|| config.libra_server());
    let login = cli
        .rhlogin
        .clone()
        .or_else(|| config.default_rhlogin().map(str::to_owned))
        .context("no login given: pass --rhlogin or set default_rhlogin in express.conf")?;
    let password = cli
        .password
        .clone()
        .context("no password given: pass --password or set EXPRESS_PASSWORD")?;
    let instance_id = match cli.instance_id.clone() {
        Some(id) => InstanceId::new(id)?,
        None => InstanceId::random(),
    };

    let identity = ClientIdentity::new(CLIENT_NAME, env!("CARGO_PKG_VERSION"), instance_id);
    let transport = HttpTransport::new(Duration::from_secs(cli.timeout_secs))
        .context("failed to build HTTP transport")?;
    let service = ExpressService::new(server, identity, Arc::new(transport))
        .with_default_rhc_domain(config.libra_domain());
    let mut user = User::new(Login::new(login)?, password);

    tracing::debug!(service_url = %service.service_url(), "dispatching command");
    run(cli.command, &service, &mut user).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(command: Command, service: &ExpressService, user: &mut User) -> Result<()> {
    match command {
        Command::UserInfo => {
            let info = service.get_user_info(user).await?;
            print!("{}", output::user_info(info));
        }
        Command::Cartridges { embedded } => {
            let carts = if embedded {
                service.list_embeddable_cartridges(user).await?
            } else {
                service.list_cartridges(user).await?
            };
            print!("{}", output::cartridges(&carts));
        }
        Command::CreateDomain(args) => {
            let (namespace, key) = domain_args(&args)?;
            let domain = service.create_domain(user, namespace, key).await?;
            print!("{}", output::domain(domain));
        }
        Command::ChangeDomain(args) => {
            let (namespace, key) = domain_args(&args)?;
            let domain = service.change_domain(user, namespace, key).await?;
            print!("{}", output::domain(domain));
        }
        Command::CreateApp(args) => {
            let (name, cartridge) = app_args(&args)?;
            let app = service.create_application(user, name, cartridge).await?;
            print!("{}", output::created_application(&app, user.domain()));
        }
        Command::Start(args) => {
            let (name, cartridge) = app_args(&args)?;
            service.start_application(user, &name, &cartridge).await?;
            println!("Started application \"{name}\"");
        }
        Command::Stop(args) => {
            let (name, cartridge) = app_args(&args)?;
            service.stop_application(user, &name, &cartridge).await?;
            println!("Stopped application \"{name}\"");
        }
        Command::Restart(args) => {
            let (name, cartridge) = app_args(&args)?;
            service.restart_application(user, &name, &cartridge).await?;
            println!("Restarted application \"{name}\"");
        }
        Command::Destroy(args) => {
            let (name, cartridge) = app_args(&args)?;
            service.destroy_application(user, &name, &cartridge).await?;
            println!("Destroyed application \"{name}\"");
        }
        Command::Status(args) => {
            let (name, cartridge) = app_args(&args)?;
            let status = service.application_status(user, &name, &cartridge).await?;
            println!("{status}");
        }
        Command::Embed(args) => {
            let (application, cartridge) = embed_args(&args)?;
            let embedded = service.add_embedded_cartridge(user, &application, cartridge).await?;
            print!("{}", output::embedded(application.as_str(), &embedded));
        }
        Command::Unembed(args) => {
            let (application, cartridge) = embed_args(&args)?;
            service
                .remove_embedded_cartridge(user, &application, cartridge.clone())
                .await?;
            println!("Removed \"{cartridge}\" from \"{application}\"");
        }
        Command::CheckCredentials => {
            if !service.validate_credentials(user).await? {
                bail!("credentials for \"{}\" were rejected", user.login());
            }
            println!("Credentials for \"{}\" are valid", user.login());
        }
    }
    Ok(())
}

fn domain_args(args: &DomainArgs) -> Result<(Namespace, SshPublicKey)> {
    let namespace = Namespace::new(args.namespace.as_str())?;
    Ok((namespace, read_ssh_key(&args.ssh_key)?))
}

fn read_ssh_key(path: &Path) -> Result<SshPublicKey> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ssh key \"{}\"", path.display()))?;
    SshPublicKey::from_openssh(text.trim())
        .with_context(|| format!("invalid ssh key in \"{}\"", path.display()))
}

fn app_args(args: &AppArgs) -> Result<(ApplicationName, CartridgeName)> {
    Ok((
        ApplicationName::new(args.name.as_str())?,
        CartridgeName::new(args.cartridge.as_str())?,
    ))
}

/// Validates all three names; the broker request itself needs only the
/// application and the embedded cartridge.
fn embed_args(args: &EmbedArgs) -> Result<(ApplicationName, CartridgeName)> {
    let application = ApplicationName::new(args.application.as_str())?;
    CartridgeName::new(args.app_cartridge.as_str())?;
    Ok((application, CartridgeName::new(args.embedded_cartridge.as_str())?))
}
