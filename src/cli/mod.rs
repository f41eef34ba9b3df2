pub mod commands;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "guard")]
#[command(about = "content-guard - sanitize and validate content API payloads against schemas")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, default_value = "schemas", help = "Directory of JSON/YAML schema definitions")]
    pub schemas: PathBuf,

    #[arg(long, global = true, help = "JSON/YAML file declaring extra query and input params")]
    pub params: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Strip everything a payload may not carry")]
    Sanitize {
        #[command(subcommand)]
        cmd: commands::sanitize::SanitizeCommands,
    },

    #[command(about = "Reject payloads that carry anything they may not")]
    Validate {
        #[command(subcommand)]
        cmd: commands::validate::ValidateCommands,
    },

    #[command(about = "Inspect the loaded schemas")]
    Schema {
        #[command(subcommand)]
        cmd: commands::schema::SchemaCommands,
    },

    #[command(about = "Serve the pipelines over HTTP")]
    Serve {
        #[arg(long, default_value_t = 3000, help = "Port to listen on")]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let api = utils::load_api(&cli.schemas, cli.params.as_deref())?;

    match cli.command {
        Commands::Sanitize { cmd } => commands::sanitize::handle(cmd, &api, output_format).await,
        Commands::Validate { cmd } => commands::validate::handle(cmd, &api, output_format).await,
        Commands::Schema { cmd } => commands::schema::handle(cmd, &cli.schemas, output_format),
        Commands::Serve { port } => commands::serve::handle(api, port).await,
    }
}
