use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kin_types::Handle;

#[derive(Parser)]
#[command(
    name = "kin",
    about = "Kinstore: merge duplicate people and families in a family tree",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Datastore snapshot (JSON)
    #[arg(long, global = true, default_value = "kin.json")]
    pub db: PathBuf,

    /// Merge settings (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

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
    /// Merge one person into another
    MergePerson(MergePersonArgs),
    /// Merge one family into another
    MergeFamily(MergeFamilyArgs),
    /// Run the referential-integrity check
    Check,
    /// List every record that references a handle
    Backlinks(HandleArgs),
    /// Show the person or family behind a handle
    Show(HandleArgs),
}

#[derive(Args)]
pub struct MergePersonArgs {
    /// The person that remains
    pub survivor: Handle,
    /// The person merged away
    pub casualty: Handle,
    /// Only run the checks; write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct MergeFamilyArgs {
    /// The family that remains
    pub survivor: Handle,
    /// The family merged away
    pub casualty: Handle,
    /// Pair the casualty father with the survivor mother and vice versa
    #[arg(long)]
    pub crossed: bool,
    /// Only run the checks; write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct HandleArgs {
    pub handle: Handle,
}
