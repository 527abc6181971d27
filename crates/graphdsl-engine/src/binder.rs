//! Token binding.
//!
//! Binding runs in two phases. First every group is resolved against the
//! store, each in its own write transaction, and each resolved id is checked
//! against any id the token already holds. Only when every group resolved
//! are the ids written into the tokens, so a failed binding leaves every
//! token as it was.
//!
//! The two phases are not atomic with respect to other threads. Tokens shared
//! between databases, such as `static` groups, may be bound concurrently only
//! against the same store. Binding them from two threads against different
//! stores can leave a group partly bound to each.

use crate::token::{AnyToken, TokenGroup};
use graphdsl_common::types::TokenType;
use graphdsl_common::utils::error::Result;
use graphdsl_core::LpgStore;
use std::sync::Arc;

/// Counts of the tokens bound by a [`Database`](crate::Database).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingSummary {
    /// Number of groups walked.
    pub groups: usize,
    /// Bound labels.
    pub labels: usize,
    /// Bound relationship types.
    pub relationship_types: usize,
    /// Bound property keys.
    pub property_keys: usize,
}

impl BindingSummary {
    /// Total number of bound tokens.
    #[must_use]
    pub fn total(&self) -> usize {
        self.labels + self.relationship_types + self.property_keys
    }

    fn count(&mut self, kind: TokenType) {
        match kind {
            TokenType::Label => self.labels += 1,
            TokenType::RelationshipType => self.relationship_types += 1,
            TokenType::PropertyKey => self.property_keys += 1,
        }
    }
}

/// Resolves every token of `groups` against `store` and binds it.
///
/// # Errors
///
/// Returns the first resolution or binding conflict. No token is bound then,
/// unless another thread binds the same tokens against a different store
/// meanwhile. See the module docs.
pub fn bind_tokens(store: &Arc<LpgStore>, groups: &[&dyn TokenGroup]) -> Result<BindingSummary> {
    let mut resolved: Vec<(&dyn AnyToken, u32)> = Vec::new();
    let mut summary = BindingSummary::default();

    for group in groups {
        let tokens = group.tokens();
        summary.groups += 1;
        if tokens.is_empty() {
            continue;
        }

        let members = tokens.len();
        let tx = store.begin_write()?;
        for token in tokens {
            let kind = token.token_type();
            let id = tx.get_or_create_token(kind, token.name())?;
            token.check_bind(id)?;
            summary.count(kind);
            resolved.push((token, id));
        }
        tx.commit()?;

        tracing::debug!(
            group = group.group_name(),
            members,
            "resolved token group"
        );
    }

    for (token, id) in resolved {
        token.bind(id)?;
    }

    tracing::info!(
        groups = summary.groups,
        labels = summary.labels,
        relationship_types = summary.relationship_types,
        property_keys = summary.property_keys,
        "bound tokens"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Label, LabelKind, PropertyKeyKind, PropertyName, RelTypeKind};
    use crate::token_group;
    use graphdsl_common::types::{EdgeTypeId, LabelId, PropertyKeyId};
    use graphdsl_common::utils::error::{Error, TokenError};

    token_group! {
        struct Labels: LabelKind {
            person => "Person",
            company => "Company",
        }
    }

    token_group! {
        struct Rels: RelTypeKind {
            knows => "KNOWS",
        }
    }

    token_group! {
        struct Props: PropertyKeyKind {
            name => "name",
        }
    }

    #[test]
    fn test_binds_to_store_ids() {
        let store = Arc::new(LpgStore::new());
        store.create_node(&["A", "B", "C"]).unwrap();

        let labels = Labels::new();
        let rels = Rels::new();
        let props = Props::new();
        let summary = bind_tokens(&store, &[&labels, &rels, &props]).unwrap();

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.groups, 3);
        assert_eq!(labels.person.ordinal(), LabelId::new(3));
        assert_eq!(labels.company.ordinal(), LabelId::new(4));
        assert_eq!(rels.knows.ordinal(), EdgeTypeId::new(0));
        assert_eq!(props.name.ordinal(), PropertyKeyId::new(0));
        assert_eq!(store.active_transaction_count(), 0);
    }

    #[test]
    fn test_failed_binding_binds_nothing() {
        let store = Arc::new(LpgStore::new());
        let labels = Labels::new();
        let bad = [PropertyName::new("")];

        let err = bind_tokens(&store, &[&labels, &bad]).unwrap_err();
        assert!(matches!(
            err,
            Error::Token(TokenError::IllegalTokenName { .. })
        ));
        assert!(!labels.person.is_bound());
        assert!(!labels.company.is_bound());
    }

    #[test]
    fn test_rebinding_to_other_store_is_rejected() {
        let first = Arc::new(LpgStore::new());
        let second = Arc::new(LpgStore::new());
        second.label_get_or_create("Other").unwrap();

        let person = Label::new("Person");
        let fresh = Label::new("Fresh");
        bind_tokens(&first, &[&person]).unwrap();

        let err = bind_tokens(&second, &[&fresh, &person]).unwrap_err();
        assert!(matches!(
            err,
            Error::Token(TokenError::TokenAlreadyBound {
                bound: 0,
                requested: 2,
                ..
            })
        ));
        assert!(!fresh.is_bound());

        // Same store again is a no-op
        bind_tokens(&first, &[&person]).unwrap();
        assert_eq!(person.ordinal(), LabelId::new(0));
    }

    #[test]
    fn test_concurrent_binding_against_one_store() {
        static SHARED: [Label; 2] = [Label::new("Shared"), Label::new("Other")];
        let store = Arc::new(LpgStore::new());

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| bind_tokens(&store, &[&SHARED]).unwrap());
            }
        });

        assert_eq!(SHARED[0].ordinal(), LabelId::new(0));
        assert_eq!(SHARED[1].ordinal(), LabelId::new(1));
    }

    #[test]
    fn test_empty_group() {
        let store = Arc::new(LpgStore::new());
        let empty: Vec<Label> = Vec::new();
        let summary = bind_tokens(&store, &[&empty]).unwrap();
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.groups, 1);
    }
}
