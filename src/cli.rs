use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ferry::config::{IgnoreList, RawConfig};

/// ferry - deploy a local file tree over FTP or SFTP
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output NDJSON events
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit GitHub Actions workflow commands (auto-detected in workflows)
    #[arg(long, global = true)]
    pub ci: bool,

    /// Verbosity level (-v prints every transferred file, -vv enables debug logs)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect and run the actions
    Deploy {
        #[command(flatten)]
        input: InputArgs,

        /// Compile and print the actions without connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Compile and print the actions without connecting
    Plan {
        #[command(flatten)]
        input: InputArgs,
    },
}

/// Deploy inputs; each one overrides config files and environment
#[derive(Args, Debug, Default, Clone)]
pub struct InputArgs {
    /// Config file (default: ./ferry.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remote URL, e.g. sftp://example.com:22
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    /// Prefer FERRY_PASSWORD; command lines are visible to other users
    #[arg(long)]
    pub password: Option<String>,

    /// Read the SFTP private key from a file
    #[arg(long)]
    pub private_key_file: Option<PathBuf>,

    /// Upgrade FTP to explicit TLS
    #[arg(long)]
    pub secure: bool,

    /// Remote directory relative paths are joined onto
    #[arg(long)]
    pub remote_path: Option<String>,

    /// Local directory every uploaded path must lie under
    #[arg(long)]
    pub local_path: Option<String>,

    /// Comma-separated ignore patterns
    #[arg(long)]
    pub ignore: Option<String>,

    /// Action text or JSON change set
    #[arg(long, conflicts_with = "actions_file")]
    pub actions: Option<String>,

    /// Read actions from a file (`-` for stdin)
    #[arg(long)]
    pub actions_file: Option<PathBuf>,

    /// Log every protocol operation
    #[arg(long)]
    pub debug: bool,
}

impl InputArgs {
    /// CLI layer of the configuration; file contents are resolved by the caller
    pub fn to_raw(&self) -> RawConfig {
        RawConfig {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            private_key: None,
            private_key_passphrase: None,
            secure: self.secure.then_some(true),
            remote_path: self.remote_path.clone(),
            local_path: self.local_path.clone(),
            ignore: self.ignore.clone().map(IgnoreList::Text),
            actions: self.actions.clone(),
            debug: self.debug.then_some(true),
        }
    }
}
