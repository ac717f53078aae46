use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "fs-image")]
#[command(about = "Inventory a directory tree into an SQLite image", long_about = None)]
pub struct Cli {
    /// Image database to use instead of the job's configured file (`:memory:` allowed)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new image of a configured scan job (no checksums)
    CreateImage { job: String },
    /// Calculate checksums for files of an existing image
    CalcHashes {
        job: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Recalculate checksums that already exist
        #[arg(long)]
        recalc: bool,
    },
    /// Create the image, then checksum every file
    Scan { job: String },
    /// Print the audit trail of an image
    History { job: String },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// SQL `like` pattern over file names, e.g. '%.jpg'
    #[arg(long)]
    pub name_like: Option<String>,
    /// Only files of at least this many bytes
    #[arg(long)]
    pub min_size: Option<u64>,
    /// Only files smaller than this many bytes
    #[arg(long)]
    pub max_size: Option<u64>,
}
