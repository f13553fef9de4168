//! Core types: Symbol, Dollars

use std::fmt;

/// Dollar amount. Fractional values are expected: the allocator divides
/// purchases by fractional coverage ratios.
pub type Dollars = f64;

/// Amounts at or below this magnitude are treated as zero by the allocator.
pub const DUST: Dollars = 1e-6;

/// Sum of dollar amounts. An empty input yields `+0.0`, where
/// `Iterator::sum` yields `-0.0` for floats.
pub(crate) fn sum_dollars(values: impl IntoIterator<Item = Dollars>) -> Dollars {
    values.into_iter().fold(0.0, |acc, v| acc + v)
}

/// Maximum ticker length in bytes.
pub const SYMBOL_MAX_LEN: usize = 8;

/// A ticker symbol, stored inline and normalized to upper case.
///
/// `Symbol` is `Copy` so it can be used freely as a map key and inside
/// positions and orders without allocation.
///
/// ```
/// use nanofolio::Symbol;
///
/// let s = Symbol::new("vtsax");
/// assert_eq!(s.as_str(), "VTSAX");
/// assert_eq!(Symbol::try_new("TOOLONGNAME"), None);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    // Zero padding keeps the derived byte ordering lexicographic.
    bytes: [u8; SYMBOL_MAX_LEN],
    len: u8,
}

impl Symbol {
    /// Create a symbol, normalizing to upper case.
    ///
    /// # Panics
    ///
    /// Panics if `s` is empty, longer than 8 bytes, or not ASCII.
    /// Use [`Symbol::try_new`] for untrusted input.
    pub fn new(s: &str) -> Self {
        match Self::try_new(s) {
            Some(sym) => sym,
            None => panic!("invalid symbol {s:?}: must be 1-8 ASCII bytes"),
        }
    }

    /// Create a symbol, returning `None` if `s` is empty, longer than
    /// 8 bytes, or not ASCII.
    pub fn try_new(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s.len() > SYMBOL_MAX_LEN || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; SYMBOL_MAX_LEN];
        for (dst, src) in bytes.iter_mut().zip(s.bytes()) {
            *dst = src.to_ascii_uppercase();
        }
        Some(Self {
            bytes,
            len: s.len() as u8,
        })
    }

    /// The symbol as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII bytes are ever stored.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Symbol::try_new(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid symbol {s:?}")))
    }
}
