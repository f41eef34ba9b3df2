use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::schema::{is_id_attribute, WILDCARD};
use crate::traverse::{Mutation, Shape, VisitContext, Visitor};

/// `fields` entries that are not scalar attributes
///
/// Relations, components and media are selected through `populate`.
pub struct NonScalarFields(pub Policy);

#[async_trait]
impl Visitor for NonScalarFields {
    fn name(&self) -> &'static str {
        self.0.label("removeNonScalarFields", "throwNonScalarFields")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if ctx.shape != Shape::Fields || ctx.key == WILDCARD || is_id_attribute(ctx.key) {
            return Ok(());
        }
        match ctx.attribute {
            Some(attribute) if attribute.is_scalar() => Ok(()),
            _ => self.0.apply(ctx, mutation),
        }
    }
}
