pub mod sanitize;
pub mod schema;
pub mod serve;
pub mod validate;

use std::path::PathBuf;

use clap::Args;

use crate::options::RequestOptions;

/// Model uid plus the document to run through a pipeline
#[derive(Args, Debug, Clone)]
pub struct PayloadArgs {
    #[arg(help = "Model uid (e.g. api::article.article)")]
    pub uid: String,

    #[arg(long, short, help = "Read the JSON document from a file instead of stdin")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Only allow core and registered query/body keys")]
    pub strict: bool,

    #[arg(long, value_delimiter = ',', help = "Comma separated field paths the caller may see")]
    pub allow: Option<Vec<String>>,
}

impl PayloadArgs {
    pub fn request_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new();
        if self.strict {
            options = options.with_strict_params(true);
        }
        if let Some(allow) = &self.allow {
            options = options.with_allowed_fields(allow.iter().cloned());
        }
        options
    }
}
