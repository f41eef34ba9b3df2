use clap::Subcommand;

use super::PayloadArgs;
use crate::cli::{utils, OutputFormat};
use crate::content_api::ContentApi;

#[derive(Subcommand)]
pub enum SanitizeCommands {
    #[command(about = "Sanitize an entity (or list) about to be returned")]
    Output(PayloadArgs),

    #[command(about = "Sanitize a request body")]
    Input(PayloadArgs),

    #[command(about = "Sanitize a parsed query object")]
    Query(PayloadArgs),
}

pub async fn handle(cmd: SanitizeCommands, api: &ContentApi, output_format: OutputFormat) -> anyhow::Result<()> {
    let (kind, args) = match &cmd {
        SanitizeCommands::Output(args) => ("output", args),
        SanitizeCommands::Input(args) => ("input", args),
        SanitizeCommands::Query(args) => ("query", args),
    };

    let payload = utils::read_payload(args.file.as_deref())?;
    let options = args.request_options();

    let result = match &cmd {
        SanitizeCommands::Output(_) => api.sanitize.output(payload, &args.uid, &options).await,
        SanitizeCommands::Input(_) => api.sanitize.input(payload, &args.uid, &options).await,
        SanitizeCommands::Query(_) => api.sanitize.query(payload, &args.uid, &options).await,
    };

    match result {
        Ok(sanitized) => utils::output_value(&output_format, &format!("Sanitized {} for {}", kind, args.uid), sanitized),
        Err(e) => {
            utils::output_error(&output_format, &e.to_string(), Some(e.error_code()))?;
            Err(e.into())
        }
    }
}
