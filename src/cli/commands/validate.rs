use clap::Subcommand;
use serde_json::json;

use super::PayloadArgs;
use crate::cli::{utils, OutputFormat};
use crate::content_api::ContentApi;

#[derive(Subcommand)]
pub enum ValidateCommands {
    #[command(about = "Validate a request body")]
    Input(PayloadArgs),

    #[command(about = "Validate a parsed query object")]
    Query(PayloadArgs),
}

pub async fn handle(cmd: ValidateCommands, api: &ContentApi, output_format: OutputFormat) -> anyhow::Result<()> {
    let (kind, args) = match &cmd {
        ValidateCommands::Input(args) => ("input", args),
        ValidateCommands::Query(args) => ("query", args),
    };

    let payload = utils::read_payload(args.file.as_deref())?;
    let options = args.request_options();

    let result = match &cmd {
        ValidateCommands::Input(_) => api.validate.input(&payload, &args.uid, &options).await,
        ValidateCommands::Query(_) => api.validate.query(&payload, &args.uid, &options).await,
    };

    match result {
        Ok(()) => utils::output_success(
            &output_format,
            &format!("{} is valid for {}", kind, args.uid),
            Some(json!({ "valid": true })),
        ),
        Err(e) => {
            match &output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&e.to_json())?),
                OutputFormat::Text => utils::output_error(&output_format, &e.to_string(), Some(e.error_code()))?,
            }
            Err(e.into())
        }
    }
}
