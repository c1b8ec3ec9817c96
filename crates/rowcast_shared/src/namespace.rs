//! # Property Namespaces
//!
//! Every renderer descriptor owns one namespace, generated once from a
//! random token. Wire keys are `namespace + property`, so two descriptors
//! bound to the same item schema never write the same payload key.
//!
//! ```text
//! rr_ab12cd34ef56ab78_name
//! └────── namespace ─────┘└ property
//! ```

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{NAMESPACE_PREFIX, NAMESPACE_TOKEN_LEN};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Per-descriptor prefix of every wire key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Generates a namespace from the thread RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generates a namespace with the default prefix and token length.
    #[must_use]
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_prefix(NAMESPACE_PREFIX, NAMESPACE_TOKEN_LEN, rng)
    }

    /// Generates `"{prefix}_{token}_"` with a lowercase hex token of
    /// `token_len` characters.
    #[must_use]
    pub fn with_prefix<R: Rng + ?Sized>(prefix: &str, token_len: usize, rng: &mut R) -> Self {
        let mut value = String::with_capacity(prefix.len() + token_len + 2);
        value.push_str(prefix);
        value.push('_');
        for _ in 0..token_len {
            value.push(char::from(HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())]));
        }
        value.push('_');
        Self(value)
    }

    /// Wraps an existing namespace string without validation.
    ///
    /// Used when decoding instructions and in fixtures.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the namespace as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the wire key for a property.
    #[must_use]
    pub fn key_for(&self, property: &str) -> String {
        let mut key = String::with_capacity(self.0.len() + property.len());
        key.push_str(&self.0);
        key.push_str(property);
        key
    }

    /// Returns the property name of a wire key owned by this namespace.
    #[must_use]
    pub fn strip<'a>(&self, wire_key: &'a str) -> Option<&'a str> {
        wire_key.strip_prefix(self.0.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true if `name` matches `^[A-Za-z0-9]+$`.
///
/// Callable names become plain object keys in the client runtime, so
/// anything outside this set could shadow protocol fields or prototype
/// properties.
#[must_use]
pub fn is_valid_callable_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_generated_namespace_shape() {
        let ns = Namespace::generate();
        let s = ns.as_str();

        assert_eq!(s.len(), NAMESPACE_PREFIX.len() + NAMESPACE_TOKEN_LEN + 2);
        assert!(s.starts_with("rr_"));
        assert!(s.ends_with('_'));

        let token = &s[3..s.len() - 1];
        assert!(token.bytes().all(|b| HEX_DIGITS.contains(&b)));
    }

    #[test]
    fn test_seeded_namespace_is_deterministic() {
        let a = Namespace::generate_with(&mut ChaCha8Rng::seed_from_u64(7));
        let b = Namespace::generate_with(&mut ChaCha8Rng::seed_from_u64(7));
        let c = Namespace::generate_with(&mut ChaCha8Rng::seed_from_u64(8));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_custom_prefix_and_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ns = Namespace::with_prefix("grid", 8, &mut rng);

        assert!(ns.as_str().starts_with("grid_"));
        assert_eq!(ns.as_str().len(), "grid_".len() + 8 + 1);
    }

    #[test]
    fn test_key_for_and_strip() {
        let ns = Namespace::from_raw("rr_ab12cd34ef56ab78_");

        let key = ns.key_for("name");
        assert_eq!(key, "rr_ab12cd34ef56ab78_name");
        assert_eq!(ns.strip(&key), Some("name"));
        assert_eq!(ns.strip("rr_0000000000000000_name"), None);
        assert_eq!(ns.strip("key"), None);
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let a = Namespace::generate_with(&mut rng);
        let b = Namespace::generate_with(&mut rng);

        assert_ne!(a.key_for("name"), b.key_for("name"));
    }

    #[test]
    fn test_callable_name_pattern() {
        for name in ["onClick", "a", "Z9", "handle2Things", "123"] {
            assert!(is_valid_callable_name(name), "{name} should be valid");
        }
        for name in ["", "bad name", "on-click", "on_click", "__proto__", "héllo", "a.b", "x\n"] {
            assert!(!is_valid_callable_name(name), "{name:?} should be invalid");
        }
    }
}
