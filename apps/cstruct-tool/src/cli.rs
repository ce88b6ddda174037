use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile every struct in a declaration file
    Check {
        /// Declaration file (JSON)
        file: PathBuf,
    },

    /// Print compiled schemas
    Inspect {
        /// Declaration file (JSON)
        file: PathBuf,

        /// Only print this struct
        #[arg(short, long = "struct")]
        structure: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a generated constructor and print the instance
    Construct {
        /// Declaration file (JSON)
        file: PathBuf,

        /// Struct to construct
        structure: String,

        /// Positional arguments as a JSON array, e.g. '[1, [0.5], true]'
        #[arg(default_value = "[]")]
        args: String,
    },
}
