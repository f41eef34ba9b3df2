use std::path::Path;

use clap::Subcommand;
use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::schema::{ModelSource, SchemaRegistry};

#[derive(Subcommand)]
pub enum SchemaCommands {
    #[command(about = "List loaded model uids")]
    List,

    #[command(about = "Show one schema definition")]
    Show {
        #[arg(help = "Model uid")]
        uid: String,
    },
}

pub fn handle(cmd: SchemaCommands, dir: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let registry = SchemaRegistry::load_dir(dir)?;

    match cmd {
        SchemaCommands::List => {
            let uids = registry.uids();
            if uids.is_empty() {
                return utils::output_empty_collection(&output_format, "schemas", "No schemas found");
            }
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "schemas": uids }))?),
                OutputFormat::Text => {
                    for uid in uids {
                        println!("{}", uid);
                    }
                }
            }
            Ok(())
        }
        SchemaCommands::Show { uid } => {
            let schema = registry.get_model(&uid)?;
            let value = serde_json::to_value(schema.as_ref())?;
            utils::output_value(&output_format, &format!("Schema {}", uid), value)
        }
    }
}
