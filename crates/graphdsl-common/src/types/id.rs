//! Identifier newtypes.
//!
//! Entity ids are 64-bit, token ids are 32-bit. Every id type reserves its
//! maximum value as the invalid sentinel, so an unbound token or an unset
//! reference is representable without an `Option`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident($repr:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            /// The invalid sentinel.
            pub const INVALID: Self = Self(<$repr>::MAX);

            /// Creates an id from its raw value.
            #[inline]
            #[must_use]
            pub const fn new(raw: $repr) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[inline]
            #[must_use]
            pub const fn as_raw(self) -> $repr {
                self.0
            }

            /// Returns `true` unless this is the invalid sentinel.
            #[inline]
            #[must_use]
            pub const fn is_valid(self) -> bool {
                self.0 != <$repr>::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($prefix, "({})"), self.0)
                } else {
                    f.write_str(concat!($prefix, "(INVALID)"))
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$repr> for $name {
            fn from(raw: $repr) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $repr {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a node.
    NodeId(u64),
    "NodeId"
);

define_id!(
    /// Identifier of an edge (relationship).
    EdgeId(u64),
    "EdgeId"
);

define_id!(
    /// Store-assigned id of a node label.
    LabelId(u32),
    "LabelId"
);

define_id!(
    /// Store-assigned id of a relationship type.
    EdgeTypeId(u32),
    "EdgeTypeId"
);

define_id!(
    /// Store-assigned id of a property key.
    PropertyKeyId(u32),
    "PropertyKeyId"
);

define_id!(
    /// Transaction identifier.
    TxId(u64),
    "TxId"
);

define_id!(
    /// Commit epoch. Records created at epoch `e` are visible to snapshots taken at `e` or later.
    EpochId(u64),
    "EpochId"
);

impl TxId {
    /// The transaction id used for writes outside an explicit transaction.
    pub const SYSTEM: Self = Self(0);
}

impl EpochId {
    /// The epoch of an empty store.
    pub const INITIAL: Self = Self(0);
}
