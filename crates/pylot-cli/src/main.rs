//! Pylot - remote pyenv provisioner
//!
//! Usage:
//!   pylot setup --host deploy@web1      # full provisioning sequence
//!   pylot versions --host deploy@web1   # query installed versions
//!   pylot build --local                 # provision this machine

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::Confirm;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pylot_core::config::{PylotConfig, load_config};
use pylot_core::configure::ShellConfigPatcher;
use pylot_core::deps::DependencyEnsurer;
use pylot_core::pipeline::run_setup;
use pylot_core::python::Pyenv;
use pylot_core::repo::RepoSync;
use pylot_core::session::Session;
use pylot_core::transport::{LocalShell, SshTransport, Transport};

#[derive(Parser)]
#[command(name = "pylot")]
#[command(about = "Remote pyenv provisioner", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Target host ([user@]host)
    #[arg(long, global = true, conflicts_with = "local")]
    host: Option<String>,

    /// SSH port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// SSH identity file
    #[arg(long, global = true)]
    identity: Option<PathBuf>,

    /// Provision the local machine instead of a remote host
    #[arg(long, global = true)]
    local: bool,
}

#[derive(Args)]
struct OverrideArgs {
    /// Path to a pylot.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Install root on the target (may reference $HOME)
    #[arg(long, global = true)]
    root: Option<String>,

    /// Python version to install and activate
    #[arg(long, global = true)]
    python: Option<String>,

    /// Parallel build jobs
    #[arg(long, global = true)]
    jobs: Option<u32>,

    /// Skip patching shell startup files during setup
    #[arg(long, global = true)]
    no_shell: bool,

    /// Do not set the installed version as the global default
    #[arg(long, global = true)]
    no_global: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full provisioning sequence (dependencies, update, configure, build)
    Setup,

    /// Install missing OS build dependencies
    Dependencies,

    /// Sync the pyenv repository and its plugins
    Update,

    /// Patch shell startup files
    Configure,

    /// Install and activate the configured Python version
    Build,

    /// List installed versions
    Versions {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List versions available to install
    Available {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Set the global default version
    Global {
        /// Version to activate
        version: String,
    },

    /// Refresh shims after installing new executables
    Rehash,

    /// Run a command under the managed version
    Exec {
        /// Version override
        #[arg(long)]
        version: Option<String>,

        /// Command and arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Locate an executable under the managed version
    Which {
        /// Executable name
        command: String,

        /// Version override
        #[arg(long)]
        version: Option<String>,
    },

    /// Uninstall an installed version
    Uninstall {
        /// Version to remove
        version: String,
    },

    /// Remove the entire install root
    Purge {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable listing
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pylot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let transport = build_transport(&cli.connection)?;
    let session = Session::new(&config, transport.as_ref());
    run_command(cli.command, &session)
}

fn build_config(cli: &Cli) -> Result<PylotConfig> {
    let mut config = load_config(cli.overrides.config.as_deref())?;
    if let Some(root) = &cli.overrides.root {
        config.root = root.clone();
    }
    if let Some(python) = &cli.overrides.python {
        config.python_version = python.clone();
    }
    if let Some(jobs) = cli.overrides.jobs {
        config.make_jobs = Some(jobs);
    }
    if cli.overrides.no_shell {
        config.setup_shell = false;
    }
    if cli.overrides.no_global {
        config.setup_global_version = false;
    }
    Ok(config)
}

fn build_transport(connection: &ConnectionArgs) -> Result<Box<dyn Transport>> {
    if connection.local {
        return Ok(Box::new(LocalShell::new()));
    }
    let Some(host) = &connection.host else {
        bail!("either --host or --local is required");
    };
    let (user, host) = match host.split_once('@') {
        Some((user, host)) => (Some(user.to_string()), host.to_string()),
        None => (None, host.clone()),
    };
    let mut transport = SshTransport::new(host);
    if let Some(user) = user {
        transport = transport.with_user(user);
    }
    if let Some(port) = connection.port {
        transport = transport.with_port(port);
    }
    if let Some(identity) = &connection.identity {
        transport = transport.with_identity(identity.display().to_string());
    }
    debug!(target = %transport.target(), "using ssh transport");
    Ok(Box::new(transport))
}

fn run_command(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::Setup => {
            run_setup(session)?;
            println!(
                "{} pyenv is ready on {}",
                style("ok").green().bold(),
                session.transport().target()
            );
        }
        Commands::Dependencies => DependencyEnsurer::new(session).ensure()?,
        Commands::Update => RepoSync::new(session).update()?,
        Commands::Configure => ShellConfigPatcher::new(session).configure()?,
        Commands::Build => Pyenv::new(session).build()?,
        Commands::Versions { format } => {
            print_versions(Pyenv::new(session).versions()?, format)?;
        }
        Commands::Available { format } => {
            print_versions(Pyenv::new(session).available_versions()?, format)?;
        }
        Commands::Global { version } => Pyenv::new(session).global(&version)?,
        Commands::Rehash => Pyenv::new(session).rehash()?,
        Commands::Exec { version, command } => {
            Pyenv::new(session).exec(&command, version.as_deref())?;
        }
        Commands::Which { command, version } => {
            let path = Pyenv::new(session).which(&command, version.as_deref())?;
            println!("{path}");
        }
        Commands::Uninstall { version } => Pyenv::new(session).uninstall(&version)?,
        Commands::Purge { yes } => {
            let target = session.transport().target();
            if !yes {
                let prompt = format!("Remove the entire pyenv install on {target}?");
                if !Confirm::new().with_prompt(prompt).default(false).interact()? {
                    println!("{}", style("aborted").yellow());
                    return Ok(());
                }
            }
            Pyenv::new(session).purge()?;
            println!("{} install root removed", style("ok").green().bold());
        }
    }
    Ok(())
}

fn print_versions(versions: Vec<String>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for version in &versions {
                println!("{version}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&versions)?),
    }
    Ok(())
}
