pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "scimctl")]
#[command(about = "scimctl - inspect how the SCIM bridge rewrites requests")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Normalize a request body offline, against a fixed current membership")]
    Normalize(commands::normalize::NormalizeArgs),

    #[command(about = "Resolve the current members of a group from the downstream service")]
    Members(commands::members::MembersArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.text && !cli.json {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Normalize(args) => commands::normalize::handle(args, output_format).await,
        Commands::Members(args) => commands::members::handle(args, output_format).await,
    }
}
