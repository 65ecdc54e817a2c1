use crate::provider::InitializationError;
use std::fmt;

/// Rejected override key
///
/// Returned by [`validate_override_key`](crate::settings::validate_override_key)
/// and wrapped in [`OverrideError::InvalidConfiguration`] by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidKey {
    /// `name` or `type` (any casing)
    ///
    /// These are resolved by the harness itself and must not be spoofed
    /// through test overrides.
    Reserved {
        /// The key as the caller spelled it
        key: String,
    },
    /// Not one of the recognized provider settings
    Unrecognized {
        /// The key as the caller spelled it
        key: String,
    },
}

impl InvalidKey {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            InvalidKey::Reserved { key } | InvalidKey::Unrecognized { key } => key,
        }
    }
}

impl fmt::Display for InvalidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidKey::Reserved { key } => write!(
                f,
                "Tried to set configuration property '{}' which is reserved for provider initialization.",
                key
            ),
            InvalidKey::Unrecognized { key } => write!(
                f,
                "Provider override was asked to configure unknown provider setting '{}'.",
                key
            ),
        }
    }
}

impl std::error::Error for InvalidKey {}

/// Failure of [`ProviderOverride::inject`](crate::controller::ProviderOverride::inject)
///
/// Every variant aborts the injection before anything is installed; the
/// registry is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    /// No entry named `provider` in the configuration section
    ConfigurationMissing {
        /// The fixed provider name that was looked up
        provider: String,
    },
    /// An override key is reserved or not recognized
    InvalidConfiguration(InvalidKey),
    /// The provider rejected the effective configuration
    Initialization(InitializationError),
}

impl fmt::Display for OverrideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideError::ConfigurationMissing { provider } => write!(
                f,
                "Configuration not found for provider '{}'.",
                provider
            ),
            OverrideError::InvalidConfiguration(e) => write!(f, "{e}"),
            OverrideError::Initialization(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for OverrideError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OverrideError::ConfigurationMissing { .. } => None,
            OverrideError::InvalidConfiguration(e) => Some(e),
            OverrideError::Initialization(e) => Some(e),
        }
    }
}

impl From<InvalidKey> for OverrideError {
    fn from(e: InvalidKey) -> Self {
        OverrideError::InvalidConfiguration(e)
    }
}

impl From<InitializationError> for OverrideError {
    fn from(e: InitializationError) -> Self {
        OverrideError::Initialization(e)
    }
}

/// Provider collection mutation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The collection was marked read-only
    ReadOnly,
    /// A provider with this name is already in the collection
    Duplicate {
        /// The clashing provider name
        name: String,
    },
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::ReadOnly => write!(f, "Provider collection is read-only."),
            CollectionError::Duplicate { name } => {
                write!(f, "Provider collection already contains '{}'.", name)
            }
        }
    }
}

impl std::error::Error for CollectionError {}
