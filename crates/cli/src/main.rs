// Hubble CLI - resolve identity and fetch cluster kubeconfigs

mod exit_codes;
mod hubble;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use hubble_config::{Config, ConfigError};

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "hubble")]
#[command(about = "Resolve Hubble identities and fetch cluster kubeconfigs")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/hubble/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log requests to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(flatten)]
    identity: IdentityArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Identity parameters, accepted before or after the subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentityArgs {
    /// Hubble endpoint, host[:port] or URL (overrides the config file)
    #[arg(long, global = true, env = "HUBBLE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = "HUBBLE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, global = true)]
    pub user_uid: Option<String>,

    #[arg(long, global = true)]
    pub project_uid: Option<String>,

    #[arg(long, global = true)]
    pub cluster_uid: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the token and print the user it belongs to
    #[command(after_help = "\
Examples:
  hubble whoami --token $TOKEN --user-uid u1 --project-uid p1 --cluster-uid c1
  hubble whoami --json")]
    Whoami {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the cluster kubeconfig for the token
    #[command(after_help = "\
Examples:
  hubble kubeconfig --cluster-uid c1 ... > kubeconfig.yaml
  hubble kubeconfig --cluster-uid c1 ... --output ~/.kube/hubble --force")]
    Kubeconfig {
        /// Write to this file instead of stdout (mode 0600)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Replace an existing output file
        #[arg(long)]
        force: bool,
    },

    /// Check that the endpoint answers with 200
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let identity = cli.identity;
    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Whoami { json } => hubble::cmd_whoami(identity, &config, json),
        Commands::Kubeconfig { output, force } => {
            hubble::cmd_kubeconfig(identity, &config, output, force)
        }
        Commands::Ping => hubble::cmd_ping(identity.endpoint, &config),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config, CliError> {
    let mut config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(config_error)?;
    config.apply_env();
    Ok(config)
}

fn config_error(err: ConfigError) -> CliError {
    CliError {
        code: EXIT_CONFIG,
        message: err.to_string(),
        hint: Some(format!("default location: {}", hubble_config::config_file_path().display())),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }
}
