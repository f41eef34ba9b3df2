// Visitors driven by a single attribute flag or kind
use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::schema::Attribute;
use crate::traverse::{Mutation, VisitContext, Visitor};

fn check(
    policy: Policy,
    ctx: &VisitContext<'_>,
    mutation: &mut Mutation,
    rejects: impl Fn(&Attribute) -> bool,
) -> Result<()> {
    match ctx.attribute {
        Some(attribute) if rejects(attribute) => policy.apply(ctx, mutation),
        _ => Ok(()),
    }
}

/// Attributes configured `hidden`
pub struct HiddenFields(pub Policy);

#[async_trait]
impl Visitor for HiddenFields {
    fn name(&self) -> &'static str {
        self.0.label("removeHiddenFields", "throwHiddenFields")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        check(self.0, ctx, mutation, |attribute| attribute.hidden)
    }
}

/// Attributes that cannot be written (input)
pub struct NonWritableFields(pub Policy);

#[async_trait]
impl Visitor for NonWritableFields {
    fn name(&self) -> &'static str {
        self.0.label("removeNonWritable", "throwNonWritable")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        check(self.0, ctx, mutation, |attribute| !attribute.writable)
    }
}

/// Attributes that are never shown (output)
pub struct NonVisibleFields(pub Policy);

#[async_trait]
impl Visitor for NonVisibleFields {
    fn name(&self) -> &'static str {
        self.0.label("removeNonVisible", "throwNonVisible")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        check(self.0, ctx, mutation, |attribute| !attribute.visible)
    }
}

/// Attributes marked `private` on the content API
pub struct PrivateFields(pub Policy);

#[async_trait]
impl Visitor for PrivateFields {
    fn name(&self) -> &'static str {
        self.0.label("removePrivate", "throwPrivate")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        check(self.0, ctx, mutation, |attribute| attribute.private)
    }
}

/// Password attributes, at any depth
pub struct PasswordFields(pub Policy);

#[async_trait]
impl Visitor for PasswordFields {
    fn name(&self) -> &'static str {
        self.0.label("removePassword", "throwPassword")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        check(self.0, ctx, mutation, Attribute::is_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::ARTICLE;
    use crate::traverse::VisitorChain;
    use crate::visitors::test_support::{run, Walk};

    #[tokio::test]
    async fn hidden_and_password_removed_at_every_depth() {
        let chain: VisitorChain = vec![Box::new(HiddenFields(Policy::Remove)), Box::new(PasswordFields(Policy::Remove))];
        let result = run(
            Walk::Entity,
            ARTICLE,
            chain,
            json!({
                "title": "t",
                "internalNotes": "x",
                "accessKey": "x",
                "seo": { "metaTitle": "m", "internalNotes": "x", "accessKey": "x" },
                "blocks": [{ "__component": "blocks.hero", "heading": "h", "accessKey": "x" }],
                "author": { "name": "n", "internalNotes": "x", "accessKey": "x" }
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            result,
            json!({
                "title": "t",
                "seo": { "metaTitle": "m" },
                "blocks": [{ "__component": "blocks.hero", "heading": "h" }],
                "author": { "name": "n" }
            })
        );
    }

    #[tokio::test]
    async fn throw_policy_names_the_key() {
        let chain: VisitorChain = vec![Box::new(HiddenFields(Policy::Throw))];
        let err = run(Walk::Filters, ARTICLE, chain, json!({ "seo": { "internalNotes": { "$eq": "x" } } }))
            .await
            .unwrap_err();

        let details = &err.as_validation().unwrap().details;
        assert_eq!(err.to_string(), "Invalid key internalNotes");
        assert_eq!(details.path.as_deref(), Some("seo.internalNotes"));
    }

    #[tokio::test]
    async fn flags_are_independent() {
        let chain: VisitorChain = vec![
            Box::new(NonWritableFields(Policy::Remove)),
            Box::new(NonVisibleFields(Policy::Remove)),
            Box::new(PrivateFields(Policy::Remove)),
        ];
        let result = run(
            Walk::Entity,
            ARTICLE,
            chain,
            json!({ "title": "t", "slug": "s", "rank": 1, "secretCode": "c", "internalNotes": "n" }),
        )
        .await
        .unwrap();
        assert_eq!(result, json!({ "title": "t", "internalNotes": "n" }));
    }
}
