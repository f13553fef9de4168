//! A dollar position in a single security.

use crate::exposure::Bucket;
use crate::security::Security;
use crate::types::{Dollars, Symbol};

/// A position in a single security within one account.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub symbol: Symbol,
    /// Market value in dollars.
    pub value: Dollars,
    /// Must be kept verbatim; the allocator never sells or moves it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hold: bool,
}

impl Position {
    /// A freely reallocatable position.
    pub fn new(symbol: Symbol, value: Dollars) -> Self {
        Self {
            symbol,
            value,
            hold: false,
        }
    }

    /// A position pinned in place.
    pub fn held(symbol: Symbol, value: Dollars) -> Self {
        Self {
            symbol,
            value,
            hold: true,
        }
    }

    /// Dollars of this position attributable to `bucket`.
    #[inline]
    pub fn exposure(&self, security: &Security, bucket: Bucket) -> Dollars {
        self.value * security.coverage(bucket)
    }
}
