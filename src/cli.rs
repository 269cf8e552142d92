use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "driver-stats",
    version,
    about = "Normalize yearly accident-driver workbooks into one age/sex dataset"
)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Normalize(NormalizeArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    #[arg(long = "year")]
    pub years: Vec<u32>,

    #[arg(long)]
    pub csv_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub skip_db: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
