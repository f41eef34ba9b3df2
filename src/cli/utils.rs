use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::content_api::ContentApi;
use crate::extensions::Extensions;
use crate::params::{ExtraParams, ParamDeclaration, ParamSchema};
use crate::schema::SchemaRegistry;

/// Extra params declared for the CLI and `guard serve`
#[derive(Debug, Default, Deserialize)]
pub struct ParamsFile {
    #[serde(default)]
    pub query: BTreeMap<String, ParamSchema>,
    #[serde(default)]
    pub input: BTreeMap<String, ParamSchema>,
}

impl ParamsFile {
    pub fn parse(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
        let file = if is_json { serde_json::from_str(&source)? } else { serde_yaml::from_str(&source)? };
        Ok(file)
    }

    /// Register every declaration and freeze
    pub fn into_registry(self) -> anyhow::Result<ExtraParams> {
        let declare = |params: BTreeMap<String, ParamSchema>| {
            params.into_iter().map(|(name, schema)| ParamDeclaration::new(name, schema)).collect::<Vec<_>>()
        };

        let mut registry = ExtraParams::new();
        registry.add_query_params(declare(self.query))?;
        registry.add_input_params(declare(self.input))?;
        registry.freeze();
        Ok(registry)
    }
}

/// Build the pipelines from a schema directory and optional params file
pub fn load_api(schemas: &Path, params: Option<&Path>) -> anyhow::Result<ContentApi> {
    let registry = match schemas.is_dir() {
        true => SchemaRegistry::load_dir(schemas)?,
        false => {
            tracing::warn!("Schema directory {} not found, starting empty", schemas.display());
            SchemaRegistry::new()
        }
    };

    let params = match params {
        Some(path) => ParamsFile::parse(path)?,
        None => ParamsFile::default(),
    };

    Ok(ContentApi::new(Arc::new(registry), Arc::new(params.into_registry()?), Arc::new(Extensions::new())))
}

/// Read a JSON document from `file`, or stdin when absent
pub fn read_payload(file: Option<&Path>) -> anyhow::Result<Value> {
    let source = match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).context("reading stdin")?;
            buffer
        }
    };
    serde_json::from_str(&source).context("payload is not valid JSON")
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(response), Some(Value::Object(data))) = (response.as_object_mut(), data) {
                response.extend(data);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a pipeline result: wrapped as `data` in JSON mode, bare in text mode
pub fn output_value(output_format: &OutputFormat, message: &str, value: Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_success(output_format, message, Some(json!({ "data": value }))),
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_file_registers_and_freezes() {
        let file: ParamsFile = serde_yaml::from_str(
            "query:\n  search:\n    type: string\ninput:\n  clientId:\n    type: string\n    maxLength: 64\n",
        )
        .unwrap();
        let registry = file.into_registry().unwrap();

        assert!(registry.is_frozen());
        assert!(registry.query().contains("search"));
        assert!(registry.input().contains("clientId"));
    }

    #[test]
    fn params_file_rejects_reserved_names() {
        let file: ParamsFile = serde_json::from_str(r#"{ "query": { "filters": { "type": "string" } } }"#).unwrap();
        let err = file.into_registry().unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }
}
