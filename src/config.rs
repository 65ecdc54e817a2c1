//! # Configuration Module
//!
//! The named provider section the harness reads its configuration base from,
//! plus environment-driven harness settings.
//!
//! ## Provider Section
//!
//! A section is an ordered list of named provider entries, each carrying a
//! parameter mapping. The harness looks up the entry whose name matches its fixed
//! provider name and uses that entry's parameters as the starting point of the
//! effective configuration.
//!
//! ```yaml
//! membership:
//!   providers:
//!     - name: StubMembership
//!       type: Acme.Membership.StubProvider
//!       parameters:
//!         applicationName: /
//!         requiresUniqueEmail: true
//!         minRequiredPasswordLength: 7
//! ```
//!
//! The top-level `membership:` key is optional; a bare `providers:` list is
//! accepted too. Files ending in `.json` are parsed as JSON, everything else as
//! YAML.
//!
//! ## Environment Variables
//!
//! ### `PROVIDER_OVERRIDE_NAME`
//!
//! Provider name to resolve in the section. Default: `StubMembership`.
//!
//! ### `PROVIDER_OVERRIDE_CONFIG`
//!
//! Path of the section file. When unset the section is empty, so every
//! injection fails with `ConfigurationMissing` until one is supplied.
//!
//! ```rust
//! use provider_override::config::HarnessConfig;
//!
//! let config = HarnessConfig::from_env();
//! println!("Resolving provider '{}'", config.provider_name);
//! ```

use crate::settings::Settings;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Section key used when the provider list is nested.
pub const SECTION_NAME: &str = "membership";

/// Provider name resolved when nothing else is configured.
pub const DEFAULT_PROVIDER_NAME: &str = "StubMembership";

/// Setting forced on every injected provider.
pub const CONNECTION_STRING_KEY: &str = "connectionStringName";

/// Value forced into [`CONNECTION_STRING_KEY`] so tests never reach real storage.
pub const STUB_CONNECTION_STRING: &str = "StubConnectionString";

/// One named provider parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    /// Provider type as written in the section; informational only
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub parameters: Settings,
}

/// Ordered collection of named provider entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProvidersSection {
    pub providers: Vec<ProviderEntry>,
}

impl ProvidersSection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, builder style.
    #[must_use]
    pub fn with_provider(mut self, name: impl Into<String>, parameters: Settings) -> Self {
        self.providers.push(ProviderEntry {
            name: name.into(),
            type_name: None,
            parameters,
        });
        self
    }

    /// First entry whose name matches exactly.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers.iter().find(|entry| entry.name == name)
    }

    /// Parse a YAML section, nested under [`SECTION_NAME`] or bare.
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let mut doc: serde_yaml::Value = serde_yaml::from_str(content)?;
        let nested = doc.as_mapping_mut().and_then(|map| map.remove(SECTION_NAME));
        Ok(serde_yaml::from_value(nested.unwrap_or(doc))?)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let mut doc: serde_json::Value = serde_json::from_str(content)?;
        let nested = doc.as_object_mut().and_then(|map| map.remove(SECTION_NAME));
        Ok(serde_json::from_value(nested.unwrap_or(doc))?)
    }

    /// Load a section file, choosing the parser by extension.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read provider section: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let section = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .with_context(|| format!("Failed to parse provider section: {}", path.display()))?;

        debug!(
            path = %path.display(),
            providers = section.providers.len(),
            "loaded provider section"
        );
        Ok(section)
    }
}

/// Harness settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Provider name resolved in the section
    pub provider_name: String,
    /// Section file, if any
    pub section_path: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            section_path: None,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let provider_name = env::var("PROVIDER_OVERRIDE_NAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string());
        let section_path = env::var_os("PROVIDER_OVERRIDE_CONFIG")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        HarnessConfig {
            provider_name,
            section_path,
        }
    }

    /// Read the configured section, or an empty one when no path is set.
    pub fn load_section(&self) -> anyhow::Result<ProvidersSection> {
        match &self.section_path {
            Some(path) => ProvidersSection::from_path(path),
            None => Ok(ProvidersSection::new()),
        }
    }
}
