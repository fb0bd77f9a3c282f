use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "ads",
    about = "Analyst data synchronization: notes, opinions and relationships across peer instances",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the peer endpoints
    Serve(ServeArgs),
    /// Print the minimal index of a record file
    Index(IndexArgs),
    /// Capture a record file and report what would be imported
    Capture(CaptureArgs),
    /// Validate a server configuration file
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, short)]
    pub config: PathBuf,
    /// JSON array of records captured before serving
    #[arg(long)]
    pub seed: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct IndexArgs {
    /// JSON array of records
    #[arg(long)]
    pub data: PathBuf,
    /// Organization reading the index; holds records that name no holder
    #[arg(long)]
    pub org: Uuid,
}

#[derive(Args)]
pub struct CaptureArgs {
    /// JSON array of records
    #[arg(long)]
    pub data: PathBuf,
    /// Organization of the capturing user
    #[arg(long, default_value_t = Uuid::nil())]
    pub org: Uuid,
    /// Capture as a sync user
    #[arg(long)]
    pub sync: bool,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    #[arg(long, short)]
    pub config: PathBuf,
}
