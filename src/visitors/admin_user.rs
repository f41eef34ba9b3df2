// Admin-user redaction: creator relations never leak credentials or flags
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::Policy;
use crate::error::Result;
use crate::schema::{ADMIN_USER_ALLOWED_FIELDS, ADMIN_USER_UID};
use crate::traverse::{is_operator, Mutation, Shape, VisitContext, Visitor};

fn pick_allowed(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| ADMIN_USER_ALLOWED_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(pick_allowed).collect()),
        other => other.clone(),
    }
}

/// Relations to `admin::user` keep only the public user fields
pub struct PickAllowedAdminUserFields;

#[async_trait]
impl Visitor for PickAllowedAdminUserFields {
    fn name(&self) -> &'static str {
        "pickAllowedAdminUserFields"
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        let targets_admin = ctx
            .attribute
            .filter(|attribute| attribute.is_relation())
            .and_then(|attribute| attribute.target_uid())
            .map(|target| target == ADMIN_USER_UID)
            .unwrap_or(false);

        if targets_admin && (ctx.value.is_object() || ctx.value.is_array()) {
            mutation.set(pick_allowed(ctx.value));
        }
        Ok(())
    }
}

/// Inside the `admin::user` schema, keys outside the public field list
///
/// Filter operators and populate fragment keys pass; everything else must be
/// one of the allowed user fields.
pub struct AdminUserFields(pub Policy);

#[async_trait]
impl Visitor for AdminUserFields {
    fn name(&self) -> &'static str {
        self.0.label("omitDisallowedAdminUserFields", "throwDisallowedAdminUserFields")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if ctx.schema.uid != ADMIN_USER_UID {
            return Ok(());
        }

        let exempt = match ctx.shape {
            Shape::Filters => is_operator(ctx.key),
            Shape::PopulateFragment => true,
            Shape::Populate => ctx.key.is_empty(),
            _ => false,
        };
        if !exempt && !ADMIN_USER_ALLOWED_FIELDS.contains(&ctx.key) {
            return self.0.apply(ctx, mutation);
        }
        Ok(())
    }
}
