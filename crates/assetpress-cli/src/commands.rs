//! CLI command definitions.

use assetpress_core::AssetKind;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Mint the token and signature for a file group
    Encode {
        /// Asset kind (js or css)
        #[arg(short, long)]
        kind: AssetKind,

        /// Alphanumeric group name
        #[arg(short, long)]
        group: String,

        /// Files relative to the content root, in concatenation order
        #[arg(required = true)]
        files: Vec<String>,

        /// Print the append URL instead of the compress URL
        #[arg(long)]
        append: bool,

        /// Print the HTML tag for the group
        #[arg(long)]
        tag: bool,
    },

    /// Verify a token and list the files it names
    Decode {
        /// Asset kind (js or css)
        #[arg(short, long)]
        kind: AssetKind,

        group: String,
        token: String,
        signature: String,
    },

    /// Run the configured compressor on a file and print the result
    Compress {
        /// Asset kind (js or css)
        #[arg(short, long)]
        kind: AssetKind,

        file: PathBuf,
    },

    /// Manage the job cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run one compression job read from stdin (process strategy worker)
    #[command(hide = true)]
    Job,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove cache entries
    Clear {
        /// Keys to remove
        keys: Vec<String>,

        /// Remove every entry of the filesystem cache
        #[arg(long, conflicts_with = "keys")]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}
