//! Store configuration and builder
use crate::clock::{Clock, SystemClock};
use crate::paths;
use crate::store::Store;
use filecache_core::{Result, DEFAULT_EXTENSION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// What to do when the backing file exists but does not parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    /// Fail the operation with `Error::CorruptStore`; the file is left untouched
    #[default]
    Reject,
    /// Log a warning and behave as if the file did not exist. The next write
    /// replaces the unreadable content, discarding it.
    TreatAsAbsent,
}

/// Configuration of one store
///
/// Deserializable so embedding applications can keep it in their own config
/// files; only `name` and `directory` are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Logical cache name, sanitized before it reaches any path
    pub name: String,
    /// Base directory for the backing file
    pub directory: PathBuf,
    /// Suffix appended to the safe name
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Spread stores over three levels of two-character directories
    #[serde(default)]
    pub sharded: bool,
    /// Hold an advisory lock around every load-modify-persist cycle
    #[serde(default)]
    pub locking: bool,
    /// Handling of unparseable backing files
    #[serde(default)]
    pub corrupt_policy: CorruptPolicy,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl StoreConfig {
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            extension: default_extension(),
            sharded: false,
            locking: false,
            corrupt_policy: CorruptPolicy::default(),
        }
    }

    /// Sanitized form of `name` used in paths
    pub fn safe_name(&self) -> String {
        paths::safe_name(&self.name)
    }

    /// Check that the configuration resolves to a file inside `directory`
    pub fn validate(&self) -> Result<()> {
        paths::validate_layout(&self.name, &self.safe_name(), &self.extension, self.sharded)
    }
}

/// Builder for creating stores
#[derive(Debug)]
pub struct StoreBuilder {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl StoreBuilder {
    /// Create a new builder with default settings
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self::from_config(StoreConfig::new(name, directory))
    }

    /// Start from an existing configuration
    pub fn from_config(config: StoreConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the file extension (default `.cache`)
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.config.extension = extension.into();
        self
    }

    /// Enable or disable sharded directories
    pub fn sharded(mut self, sharded: bool) -> Self {
        self.config.sharded = sharded;
        self
    }

    /// Enable or disable the advisory write lock
    pub fn locking(mut self, locking: bool) -> Self {
        self.config.locking = locking;
        self
    }

    /// Set the corrupt file policy
    pub fn corrupt_policy(mut self, policy: CorruptPolicy) -> Self {
        self.config.corrupt_policy = policy;
        self
    }

    /// Replace the time source
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration and build the store
    pub fn build(self) -> Result<Store> {
        self.config.validate()?;
        Ok(Store::with_clock(self.config, self.clock))
    }
}
