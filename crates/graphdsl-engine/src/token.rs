//! Symbolic tokens.
//!
//! A [`Token`] is a name plus a set-once ordinal. Tokens are declared by the
//! user, typically grouped with [`token_group!`](crate::token_group) or as
//! `static` items, and bound to the store's ids when a
//! [`Database`](crate::Database) is constructed. After binding, reading the
//! ordinal is a plain load.
//!
//! ```
//! use graphdsl_engine::token::{Label, PropertyName, TokenGroup};
//! use graphdsl_engine::token_group;
//!
//! token_group! {
//!     pub struct Labels: graphdsl_engine::token::LabelKind {
//!         person => "Person",
//!         company => "Company",
//!     }
//! }
//!
//! static NAME: PropertyName = PropertyName::new("name");
//!
//! let labels = Labels::new();
//! assert_eq!(labels.person.name(), "Person");
//! assert!(!labels.person.is_bound());
//! assert_eq!(labels.tokens().len(), 2);
//! assert!(!NAME.is_bound());
//! ```

use graphdsl_common::types::{EdgeTypeId, LabelId, PropertyKeyId, TokenType};
use graphdsl_common::utils::error::{Result, TokenError};
use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::OnceLock;

mod sealed {
    pub trait Sealed {}
}

/// The kind of a token, fixing the id type it binds to.
///
/// Sealed: the three kinds are the store's three token namespaces.
pub trait TokenKind: sealed::Sealed + Send + Sync + 'static {
    /// Id type of this kind.
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Runtime tag of this kind.
    const TYPE: TokenType;

    /// Id of an unbound token.
    const INVALID: Self::Id;

    /// Converts a raw store id.
    fn from_raw(raw: u32) -> Self::Id;
}

/// Node labels.
#[derive(Debug)]
pub enum LabelKind {}

/// Relationship types.
#[derive(Debug)]
pub enum RelTypeKind {}

/// Property keys.
#[derive(Debug)]
pub enum PropertyKeyKind {}

impl sealed::Sealed for LabelKind {}
impl sealed::Sealed for RelTypeKind {}
impl sealed::Sealed for PropertyKeyKind {}

impl TokenKind for LabelKind {
    type Id = LabelId;
    const TYPE: TokenType = TokenType::Label;
    const INVALID: LabelId = LabelId::INVALID;

    fn from_raw(raw: u32) -> LabelId {
        LabelId::new(raw)
    }
}

impl TokenKind for RelTypeKind {
    type Id = EdgeTypeId;
    const TYPE: TokenType = TokenType::RelationshipType;
    const INVALID: EdgeTypeId = EdgeTypeId::INVALID;

    fn from_raw(raw: u32) -> EdgeTypeId {
        EdgeTypeId::new(raw)
    }
}

impl TokenKind for PropertyKeyKind {
    type Id = PropertyKeyId;
    const TYPE: TokenType = TokenType::PropertyKey;
    const INVALID: PropertyKeyId = PropertyKeyId::INVALID;

    fn from_raw(raw: u32) -> PropertyKeyId {
        PropertyKeyId::new(raw)
    }
}

/// A node label token.
pub type Label = Token<LabelKind>;

/// A relationship type token.
pub type RelType = Token<RelTypeKind>;

/// A property key token.
pub type PropertyName = Token<PropertyKeyKind>;

/// A named token whose ordinal is set once, by binding.
pub struct Token<K: TokenKind> {
    name: Cow<'static, str>,
    ordinal: OnceLock<u32>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: TokenKind> Token<K> {
    /// Creates an unbound token. Usable in `static` items.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            ordinal: OnceLock::new(),
            _kind: PhantomData,
        }
    }

    /// Creates an unbound token from an owned name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            ordinal: OnceLock::new(),
            _kind: PhantomData,
        }
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bound id, or the kind's invalid id if unbound.
    #[inline]
    #[must_use]
    pub fn ordinal(&self) -> K::Id {
        self.ordinal.get().map_or(K::INVALID, |&raw| K::from_raw(raw))
    }

    /// Returns the bound id, or `None` if unbound.
    #[inline]
    #[must_use]
    pub fn try_ordinal(&self) -> Option<K::Id> {
        self.ordinal.get().map(|&raw| K::from_raw(raw))
    }

    /// Returns the bound id.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TokenUnbound`] if the token is unbound.
    pub fn resolve(&self) -> Result<K::Id> {
        self.try_ordinal().ok_or_else(|| {
            TokenError::TokenUnbound {
                kind: K::TYPE,
                name: self.name.to_string(),
            }
            .into()
        })
    }

    /// Returns `true` once bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.ordinal.get().is_some()
    }

    /// Returns the kind tag.
    #[must_use]
    pub fn token_type(&self) -> TokenType {
        K::TYPE
    }

    fn already_bound(&self, bound: u32, requested: u32) -> TokenError {
        TokenError::TokenAlreadyBound {
            kind: K::TYPE,
            name: self.name.to_string(),
            bound,
            requested,
        }
    }
}

impl<K: TokenKind> Clone for Token<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            ordinal: self.ordinal.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: TokenKind> fmt::Debug for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("kind", &K::TYPE)
            .field("name", &self.name)
            .field("ordinal", &self.try_ordinal())
            .finish()
    }
}

impl<K: TokenKind> fmt::Display for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Kind-erased view of a token, used by the binder.
pub trait AnyToken: Send + Sync {
    /// Returns the name.
    fn name(&self) -> &str;

    /// Returns the kind tag.
    fn token_type(&self) -> TokenType;

    /// Returns the bound raw id.
    fn raw_ordinal(&self) -> Option<u32>;

    /// Checks that binding to `raw` would succeed.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TokenAlreadyBound`] if bound to another id.
    fn check_bind(&self, raw: u32) -> Result<()>;

    /// Binds to `raw`. Binding again to the same id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TokenAlreadyBound`] if bound to another id.
    fn bind(&self, raw: u32) -> Result<()>;
}

impl<K: TokenKind> AnyToken for Token<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn token_type(&self) -> TokenType {
        K::TYPE
    }

    fn raw_ordinal(&self) -> Option<u32> {
        self.ordinal.get().copied()
    }

    fn check_bind(&self, raw: u32) -> Result<()> {
        match self.ordinal.get() {
            Some(&bound) if bound != raw => Err(self.already_bound(bound, raw).into()),
            _ => Ok(()),
        }
    }

    fn bind(&self, raw: u32) -> Result<()> {
        let bound = *self.ordinal.get_or_init(|| raw);
        if bound == raw {
            Ok(())
        } else {
            Err(self.already_bound(bound, raw).into())
        }
    }
}

/// An ordered collection of tokens that can list its members.
pub trait TokenGroup {
    /// Name used in logs.
    fn group_name(&self) -> &str;

    /// Members in declaration order.
    fn tokens(&self) -> Vec<&dyn AnyToken>;
}

impl<K: TokenKind, const N: usize> TokenGroup for [Token<K>; N] {
    fn group_name(&self) -> &str {
        K::TYPE.as_str()
    }

    fn tokens(&self) -> Vec<&dyn AnyToken> {
        self.iter().map(|t| t as &dyn AnyToken).collect()
    }
}

impl<K: TokenKind> TokenGroup for Vec<Token<K>> {
    fn group_name(&self) -> &str {
        K::TYPE.as_str()
    }

    fn tokens(&self) -> Vec<&dyn AnyToken> {
        self.iter().map(|t| t as &dyn AnyToken).collect()
    }
}

impl<K: TokenKind> TokenGroup for Token<K> {
    fn group_name(&self) -> &str {
        &self.name
    }

    fn tokens(&self) -> Vec<&dyn AnyToken> {
        vec![self as &dyn AnyToken]
    }
}

/// Declares a struct of tokens of one kind that implements [`TokenGroup`].
///
/// ```
/// use graphdsl_engine::token::{RelTypeKind, TokenGroup};
/// use graphdsl_engine::token_group;
///
/// token_group! {
///     /// Relationship types of the social graph.
///     pub struct Rels: RelTypeKind {
///         knows => "KNOWS",
///         works_at => "WORKS_AT",
///     }
/// }
///
/// let rels = Rels::default();
/// assert_eq!(rels.group_name(), "Rels");
/// assert_eq!(rels.works_at.name(), "WORKS_AT");
/// ```
#[macro_export]
macro_rules! token_group {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $kind:ty {
            $( $(#[$field_meta:meta])* $field:ident => $token:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $crate::token::Token<$kind>,
            )*
        }

        impl $name {
            /// Creates the group with every token unbound.
            #[must_use]
            pub fn new() -> Self {
                Self {
                    $( $field: $crate::token::Token::new($token), )*
                }
            }
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::token::TokenGroup for $name {
            fn group_name(&self) -> &str {
                stringify!($name)
            }

            fn tokens(&self) -> ::std::vec::Vec<&dyn $crate::token::AnyToken> {
                ::std::vec![ $( &self.$field as &dyn $crate::token::AnyToken ),* ]
            }
        }
    };
}
