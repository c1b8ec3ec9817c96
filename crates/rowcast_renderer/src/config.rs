//! Renderer configuration, loaded once at startup.
//!
//! ```toml
//! namespace_prefix = "rr"
//! namespace_token_len = 16
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use rowcast_shared::{NAMESPACE_PREFIX, NAMESPACE_TOKEN_LEN};

use crate::error::{RendererError, RendererResult};

/// Shortest accepted namespace token.
pub const MIN_TOKEN_LEN: usize = 8;

/// Longest accepted namespace token.
pub const MAX_TOKEN_LEN: usize = 32;

/// Namespace settings for renderer descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Prefix of every generated namespace.
    pub namespace_prefix: String,
    /// Random hex characters per namespace.
    pub namespace_token_len: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: NAMESPACE_PREFIX.to_string(),
            namespace_token_len: NAMESPACE_TOKEN_LEN,
        }
    }
}

impl RendererConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidConfig`] on parse or validation failure.
    pub fn from_toml_str(source: &str) -> RendererResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RendererError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidConfig`] if the file cannot be read,
    /// parsed or validated.
    pub fn from_toml_file(path: impl AsRef<Path>) -> RendererResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            RendererError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks that generated namespaces stay safe as object-key prefixes.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidConfig`] if the prefix is empty or not
    /// ASCII alphanumeric, or the token length is outside
    /// [`MIN_TOKEN_LEN`]..=[`MAX_TOKEN_LEN`].
    pub fn validate(&self) -> RendererResult<()> {
        if self.namespace_prefix.is_empty()
            || !self
                .namespace_prefix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric())
        {
            return Err(RendererError::InvalidConfig(format!(
                "namespace_prefix must be non-empty and alphanumeric, got {:?}",
                self.namespace_prefix
            )));
        }
        if !(MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&self.namespace_token_len) {
            return Err(RendererError::InvalidConfig(format!(
                "namespace_token_len must be in {MIN_TOKEN_LEN}..={MAX_TOKEN_LEN}, got {}",
                self.namespace_token_len
            )));
        }
        Ok(())
    }
}
