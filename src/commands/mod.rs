use crate::commands::plan::PlanCommand;
use crate::commands::split::SplitCommand;
use clap::{Parser, Subcommand};

pub mod plan;
pub mod split;

/// CLI for splitting single-file CUE + audio albums into one file per track.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Split(SplitCommand),
    Plan(PlanCommand),
}
