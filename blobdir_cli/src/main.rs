use crate::init_config::CmdConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use directories::ProjectDirs;
use std::path::PathBuf;

mod cmd;
mod config;
mod init_config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read blobs from this local store directory, ignoring the configured store
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the blobdir config file
    Config {
        #[command(subcommand)]
        cmd: CmdConfig,
    },
    /// List the entries of a directory blob
    Ls {
        /// Reference of the directory schema blob
        dir_ref: String,
        /// Entries per page; 0 lists everything in one batch
        #[arg(short = 'n', long, value_name = "COUNT", default_value_t = 0)]
        count: usize,
    },
    /// Print the tree below a directory blob
    Tree {
        /// Reference of the directory schema blob
        dir_ref: String,
    },
    /// Print a decoded schema blob as JSON
    Show {
        /// Reference of the schema blob
        blob_ref: String,
    },
    /// Store a local directory tree as schema blobs and print its reference
    Import {
        /// Local directory to import
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    // Configs under ~/.config/blobdir/config.toml, blobs under
    // ~/.local/share/blobdir/blobs unless configured otherwise.
    let dirs = ProjectDirs::from("", "", "blobdir")
        .context("failed to determine config directory path")?;

    let config_file = cli
        .config
        .clone()
        .unwrap_or_else(|| dirs.config_dir().join("config.toml"));

    cmd::run_command(&config_file, dirs.data_dir(), cli.store.as_deref(), cli.cmd).await
}
