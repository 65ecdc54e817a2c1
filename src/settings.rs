//! # Settings Module
//!
//! Ordered provider settings and the override-key validation policy.
//!
//! ## Overview
//!
//! [`Settings`] is the effective configuration handed to
//! [`AuthProvider::initialize`](crate::provider::AuthProvider::initialize). It keeps
//! insertion order and matches keys ASCII-case-insensitively, so an override of
//! `minrequiredpasswordlength` replaces a configured `minRequiredPasswordLength`
//! in place instead of adding a second entry.
//!
//! ## Override Validation
//!
//! Test overrides may only target a fixed set of recognized provider settings
//! ([`RECOGNIZED_SETTINGS`]). `name` and `type` are reserved for provider
//! identity and type resolution and are rejected in any casing. Unknown keys fail
//! fast so a typo in a test shows up as an error instead of a silently ignored
//! setting.
//!
//! ```rust
//! use provider_override::settings::{validate_override_key, Settings};
//!
//! let mut settings = Settings::new();
//! settings.set("minRequiredPasswordLength", "7");
//! settings.set("MINREQUIREDPASSWORDLENGTH", "8");
//!
//! assert_eq!(settings.len(), 1);
//! assert_eq!(settings.get("minRequiredPasswordLength"), Some("8"));
//!
//! assert!(validate_override_key("requiresUniqueEmail").is_ok());
//! assert!(validate_override_key("Type").is_err());
//! assert!(validate_override_key("bogusSetting").is_err());
//! ```

use crate::error::InvalidKey;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use smallvec::SmallVec;
use std::fmt;

/// Keys the harness supplies itself; overrides may never set them.
pub const RESERVED_KEYS: [&str; 2] = ["name", "type"];

/// Provider settings test overrides are allowed to target (exact match).
pub const RECOGNIZED_SETTINGS: [&str; 10] = [
    "connectionStringName",
    "enablePasswordRetrieval",
    "enablePasswordReset",
    "requiresQuestionAndAnswer",
    "requiresUniqueEmail",
    "maxInvalidPasswordAttempts",
    "minRequiredPasswordLength",
    "minRequiredNonalphanumericCharacters",
    "passwordAttemptWindow",
    "applicationName",
];

/// Inline capacity: every recognized setting plus a couple of extras fit on the stack.
type SettingsVec = SmallVec<[(String, String); 12]>;

/// Ordered, case-insensitive provider settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: SettingsVec,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Get a value by key (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].1.as_str())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Set a value, replacing an existing entry in place or appending a new one.
    ///
    /// A replaced entry keeps its original position and key spelling.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Settings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (k, v) in iter {
            settings.set(k, v);
        }
        settings
    }
}

impl<K, V> Extend<(K, V)> for Settings
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

struct SettingsVisitor;

impl<'de> Visitor<'de> for SettingsVisitor {
    type Value = Settings;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of provider setting names to values")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Settings, M::Error> {
        let mut settings = Settings::new();
        while let Some((key, value)) = map.next_entry::<String, ScalarString>()? {
            settings.set(key, value.0);
        }
        Ok(settings)
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SettingsVisitor)
    }
}

/// Config files write `requiresUniqueEmail: true` or `minRequiredPasswordLength: 7`;
/// providers receive every value as a string.
struct ScalarString(String);

impl<'de> Deserialize<'de> for ScalarString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(ScalarString(s)),
            serde_json::Value::Bool(b) => Ok(ScalarString(b.to_string())),
            serde_json::Value::Number(n) => Ok(ScalarString(n.to_string())),
            serde_json::Value::Null => Ok(ScalarString(String::new())),
            other => Err(serde::de::Error::custom(format!(
                "provider setting values must be scalars, got {other}"
            ))),
        }
    }
}

/// Check that a test override may target `key`.
///
/// # Errors
///
/// - [`InvalidKey::Reserved`] for `name`/`type` in any casing
/// - [`InvalidKey::Unrecognized`] for anything not in [`RECOGNIZED_SETTINGS`]
pub fn validate_override_key(key: &str) -> Result<(), InvalidKey> {
    if RESERVED_KEYS.iter().any(|r| key.eq_ignore_ascii_case(r)) {
        return Err(InvalidKey::Reserved {
            key: key.to_string(),
        });
    }
    if !RECOGNIZED_SETTINGS.contains(&key) {
        return Err(InvalidKey::Unrecognized {
            key: key.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place_case_insensitively() {
        let mut settings = Settings::new();
        settings.set("applicationName", "/");
        settings.set("minRequiredPasswordLength", "7");
        settings.set("ApplicationName", "/tests");

        let pairs: Vec<_> = settings.iter().collect();
        assert_eq!(
            pairs,
            vec![("applicationName", "/tests"), ("minRequiredPasswordLength", "7")]
        );
    }

    #[test]
    fn test_contains_key_ignores_case() {
        let settings: Settings = [("a", "1"), ("b", "2")].into_iter().collect();
        assert!(settings.contains_key("A"));
        assert!(!settings.contains_key("c"));
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn test_deserialize_preserves_order_and_stringifies_scalars() {
        let yaml = "zeta: one\nrequiresUniqueEmail: true\nminRequiredPasswordLength: 7\nalpha: ~\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();

        let keys: Vec<_> = settings.keys().collect();
        assert_eq!(
            keys,
            vec!["zeta", "requiresUniqueEmail", "minRequiredPasswordLength", "alpha"]
        );
        assert_eq!(settings.get("requiresUniqueEmail"), Some("true"));
        assert_eq!(settings.get("minRequiredPasswordLength"), Some("7"));
        assert_eq!(settings.get("alpha"), Some(""));
    }

    #[test]
    fn test_deserialize_rejects_nested_values() {
        let yaml = "applicationName:\n  nested: value\n";
        assert!(serde_yaml::from_str::<Settings>(yaml).is_err());
    }

    #[test]
    fn test_reserved_keys_any_case() {
        for key in ["name", "Name", "NAME", "type", "Type", "TYPE"] {
            assert!(
                matches!(validate_override_key(key), Err(InvalidKey::Reserved { .. })),
                "{key} should be reserved"
            );
        }
    }

    #[test]
    fn test_every_recognized_setting_is_accepted() {
        for key in RECOGNIZED_SETTINGS {
            assert!(validate_override_key(key).is_ok(), "{key} should be accepted");
        }
    }

    #[test]
    fn test_password_attempt_window_without_trailing_equals() {
        assert!(validate_override_key("passwordAttemptWindow").is_ok());
        assert!(validate_override_key("passwordAttemptWindow=").is_err());
    }

    #[test]
    fn test_unrecognized_keys_are_case_sensitive() {
        assert_eq!(
            validate_override_key("bogusSetting"),
            Err(InvalidKey::Unrecognized {
                key: "bogusSetting".to_string()
            })
        );
        assert!(validate_override_key("MinRequiredPasswordLength").is_err());
        assert!(validate_override_key("").is_err());
    }
}
