// Permission field-set resolver: the opaque ability consumed by the pipelines
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::schema::{COMPONENT_DISCRIMINATOR, DOC_ID_ATTRIBUTE, ID_ATTRIBUTE};

/// Default action checked against relation targets
pub const READ_ACTION: &str = "find";

/// Permission predicate supplied by the caller
///
/// How rules and conditions are computed is outside this crate; pipelines only
/// ask yes/no questions and read field sets.
#[async_trait]
pub trait Ability: Send + Sync {
    async fn can(&self, action: &str, subject: &str) -> bool;

    /// Permitted field paths for (action, subject); includes everything by default
    async fn permitted_fields(&self, _action: &str, _subject: &str) -> PermissionFieldSet {
        PermissionFieldSet::include_all()
    }
}

/// Ability that allows every action
pub struct AllowAll;

#[async_trait]
impl Ability for AllowAll {
    async fn can(&self, _action: &str, _subject: &str) -> bool {
        true
    }
}

/// Auth context of one request
#[derive(Clone)]
pub struct Auth {
    pub ability: Arc<dyn Ability>,
    pub read_action: String,
}

impl Auth {
    pub fn new(ability: Arc<dyn Ability>) -> Self {
        Self {
            ability,
            read_action: READ_ACTION.to_string(),
        }
    }

    pub fn with_read_action(mut self, action: impl Into<String>) -> Self {
        self.read_action = action.into();
        self
    }

    /// Whether relations pointing at `target` may be read
    pub async fn can_read(&self, target: &str) -> bool {
        self.ability.can(&self.read_action, target).await
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth").field("read_action", &self.read_action).finish()
    }
}

/// One permission rule as far as field selection is concerned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// `None` grants every field
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// Field paths permitted for one (action, subject) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionFieldSet {
    pub permitted_fields: Vec<String>,
    pub has_at_least_one_registered: bool,
    pub should_include_all: bool,
}

impl PermissionFieldSet {
    pub fn include_all() -> Self {
        Self {
            permitted_fields: Vec::new(),
            has_at_least_one_registered: true,
            should_include_all: true,
        }
    }

    /// Merge the field grants of every rule matching the pair
    pub fn from_rules(rules: &[FieldRule]) -> Self {
        let mut fields = BTreeSet::new();
        let mut should_include_all = false;

        for rule in rules {
            match &rule.fields {
                None => should_include_all = true,
                Some(granted) => fields.extend(granted.iter().cloned()),
            }
        }

        Self {
            permitted_fields: fields.into_iter().collect(),
            has_at_least_one_registered: !rules.is_empty(),
            should_include_all,
        }
    }

    /// Allow-list for the restricted-fields visitor
    ///
    /// `None` keeps everything. Identifiers and the component discriminator
    /// are always allowed once a list applies.
    pub fn allow_list(&self) -> Option<Vec<String>> {
        if self.should_include_all {
            return None;
        }

        let mut allowed = self.permitted_fields.clone();
        for always in [ID_ATTRIBUTE, DOC_ID_ATTRIBUTE, COMPONENT_DISCRIMINATOR] {
            if !allowed.iter().any(|field| field == always) {
                allowed.push(always.to_string());
            }
        }
        Some(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_rule_includes_all() {
        let set = PermissionFieldSet::from_rules(&[
            FieldRule { fields: Some(vec!["title".into()]) },
            FieldRule { fields: None },
        ]);
        assert!(set.should_include_all);
        assert_eq!(set.allow_list(), None);
    }

    #[test]
    fn allow_list_adds_identifiers() {
        let set = PermissionFieldSet::from_rules(&[
            FieldRule { fields: Some(vec!["title".into(), "author.name".into()]) },
            FieldRule { fields: Some(vec!["title".into()]) },
        ]);
        assert!(set.has_at_least_one_registered);
        assert_eq!(
            set.allow_list(),
            Some(vec![
                "author.name".to_string(),
                "title".to_string(),
                "id".to_string(),
                "documentId".to_string(),
                "__component".to_string(),
            ])
        );
    }

    #[test]
    fn no_rules_allows_only_identifiers() {
        let set = PermissionFieldSet::from_rules(&[]);
        assert!(!set.has_at_least_one_registered);
        assert_eq!(set.allow_list().map(|fields| fields.len()), Some(3));
    }

    #[tokio::test]
    async fn auth_uses_read_action() {
        struct OnlyFindOne;

        #[async_trait]
        impl Ability for OnlyFindOne {
            async fn can(&self, action: &str, _subject: &str) -> bool {
                action == "findOne"
            }
        }

        let auth = Auth::new(Arc::new(OnlyFindOne));
        assert!(!auth.can_read("api::a.a").await);
        assert!(auth.with_read_action("findOne").can_read("api::a.a").await);
    }
}
