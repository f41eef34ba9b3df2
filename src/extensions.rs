// Sanitizer/validator extension points registered by plugins at bootstrap
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::options::RequestOptions;
use crate::schema::Schema;

/// Where an extension runs inside the pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionPoint {
    /// After the built-in input visitors
    Input,
    /// After the built-in output visitors
    Output,
    /// After the built-in query sub-pipelines
    Query,
}

/// Extra sanitize step; returns the transformed value
#[async_trait]
pub trait DataSanitizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn sanitize(&self, data: Value, schema: &Schema, options: &RequestOptions) -> Result<Value>;
}

/// Extra validate step; an `Err` rejects the request
#[async_trait]
pub trait DataValidator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn validate(&self, data: &Value, schema: &Schema, options: &RequestOptions) -> Result<()>;
}

pub type SanitizerBox = Arc<dyn DataSanitizer>;
pub type ValidatorBox = Arc<dyn DataValidator>;

/// Registered extensions by point, in registration order
#[derive(Default)]
pub struct Extensions {
    sanitizers: HashMap<ExtensionPoint, Vec<SanitizerBox>>,
    validators: HashMap<ExtensionPoint, Vec<ValidatorBox>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sanitizer(&mut self, point: ExtensionPoint, sanitizer: SanitizerBox) {
        tracing::debug!("Registered sanitizer {} at {:?}", sanitizer.name(), point);
        self.sanitizers.entry(point).or_default().push(sanitizer);
    }

    pub fn add_validator(&mut self, point: ExtensionPoint, validator: ValidatorBox) {
        tracing::debug!("Registered validator {} at {:?}", validator.name(), point);
        self.validators.entry(point).or_default().push(validator);
    }

    pub fn sanitizer_count(&self, point: ExtensionPoint) -> usize {
        self.sanitizers.get(&point).map(Vec::len).unwrap_or(0)
    }

    pub fn validator_count(&self, point: ExtensionPoint) -> usize {
        self.validators.get(&point).map(Vec::len).unwrap_or(0)
    }

    /// Thread `data` through every sanitizer at `point`
    pub async fn sanitize(
        &self,
        point: ExtensionPoint,
        mut data: Value,
        schema: &Schema,
        options: &RequestOptions,
    ) -> Result<Value> {
        for sanitizer in self.sanitizers.get(&point).into_iter().flatten() {
            data = sanitizer.sanitize(data, schema, options).await?;
        }
        Ok(data)
    }

    /// Run every validator at `point`; the first error wins
    pub async fn validate(
        &self,
        point: ExtensionPoint,
        data: &Value,
        schema: &Schema,
        options: &RequestOptions,
    ) -> Result<()> {
        for validator in self.validators.get(&point).into_iter().flatten() {
            validator.validate(data, schema, options).await?;
        }
        Ok(())
    }
}
