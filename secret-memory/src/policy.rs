//! Configuration of how guarded memory is set up.
//!
//! A [MemoryPolicy] is plain data handed to the constructors that use it; there is no
//! process wide default that could be changed behind a caller's back.
//!
//! ```rust
//! # use sodalock_secret_memory::{MemoryPolicy, Protection};
//! let policy = MemoryPolicy::from_toml(r#"
//!     initial_protection = "read_only"
//!     lock_keys = true
//! "#)?;
//! assert_eq!(policy.initial_protection, Protection::ReadOnly);
//! assert!(policy.zero_fill);
//! assert!(policy.lock_keys);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::protection::Protection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryPolicy {
    /// Protection applied to regions right after allocation
    pub initial_protection: Protection,
    /// Whether fresh regions are zeroed instead of holding the allocator's fill pattern
    pub zero_fill: bool,
    /// Whether secure keys are explicitly locked into memory after allocation
    pub lock_keys: bool,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            initial_protection: Protection::ReadWrite,
            zero_fill: true,
            lock_keys: false,
        }
    }
}

impl MemoryPolicy {
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("Could not parse memory policy")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let p = path.as_ref();
        let contents = std::fs::read_to_string(p)
            .with_context(|| format!("Could not load memory policy from {p:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string(self)?)
    }
}
