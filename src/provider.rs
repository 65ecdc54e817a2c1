//! # Provider Module
//!
//! The capability contract every substitute authentication provider must honour.
//!
//! ## Overview
//!
//! A provider is a pluggable component implementing authentication/identity
//! operations, selected and configured by name. The harness never looks inside
//! a provider; it only needs to:
//!
//! - **Initialize** it with a name and an effective [`Settings`] mapping
//! - **Release** it on restoration, when the provider opts into disposal
//!
//! Disposal is a capability, not a subtype. A provider that allocates resources
//! returns itself from [`AuthProvider::as_disposable`]; everything else keeps the
//! default `None` and is simply detached.
//!
//! ```rust
//! use provider_override::provider::{AuthProvider, Disposable, InitializationError};
//! use provider_override::settings::Settings;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! struct PooledProvider { closed: AtomicBool }
//!
//! impl AuthProvider for PooledProvider {
//!     fn name(&self) -> &str { "pooled" }
//!
//!     fn initialize(&mut self, _name: &str, _settings: &Settings) -> Result<(), InitializationError> {
//!         Ok(())
//!     }
//!
//!     fn as_disposable(&self) -> Option<&dyn Disposable> { Some(self) }
//! }
//!
//! impl Disposable for PooledProvider {
//!     fn dispose(&self) { self.closed.store(true, Ordering::SeqCst); }
//! }
//! ```

use crate::settings::Settings;
use std::fmt;
use std::sync::Arc;

/// Release capability for providers that hold resources.
///
/// Invoked once, at restoration, before the provider is detached from the
/// registry. Takes `&self` because the provider is shared through a
/// [`ProviderHandle`] by then.
pub trait Disposable {
    fn dispose(&self);
}

/// Trait for authentication providers the harness can install.
pub trait AuthProvider: Send + Sync {
    /// Name the provider was initialized with (empty before initialization).
    fn name(&self) -> &str;

    /// Configure the provider.
    ///
    /// # Arguments
    ///
    /// * `name` - The fixed provider name the harness resolves configuration for
    /// * `settings` - The effective configuration (section entry + stub connection + overrides)
    ///
    /// # Errors
    ///
    /// Returns [`InitializationError`] when the provider rejects the settings.
    fn initialize(&mut self, name: &str, settings: &Settings) -> Result<(), InitializationError>;

    /// Disposal capability check.
    ///
    /// # Default Implementation
    ///
    /// Returns `None`: the provider holds nothing that needs releasing.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

/// Shared handle to an installed provider.
///
/// Equality is identity: two handles are equal only when they point at the same
/// provider instance, regardless of how the providers are configured.
pub struct ProviderHandle(Arc<dyn AuthProvider>);

impl ProviderHandle {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self(provider)
    }

    pub fn from_boxed(provider: Box<dyn AuthProvider>) -> Self {
        Self(Arc::from(provider))
    }

    #[must_use]
    pub fn provider(&self) -> &dyn AuthProvider {
        self.0.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Identity comparison on the data pointer.
    ///
    /// `Arc::ptr_eq` on trait objects also compares vtable pointers, which are
    /// not guaranteed unique per type, so only the address is compared here.
    #[must_use]
    pub fn same_provider(&self, other: &ProviderHandle) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }

    /// Invoke the disposal capability if the provider has one.
    ///
    /// Returns `true` when `dispose()` was called.
    pub fn dispose_if_supported(&self) -> bool {
        match self.0.as_disposable() {
            Some(disposable) => {
                disposable.dispose();
                true
            }
            None => false,
        }
    }
}

impl Clone for ProviderHandle {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl PartialEq for ProviderHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_provider(other)
    }
}

impl Eq for ProviderHandle {}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("name", &self.name())
            .field("addr", &(Arc::as_ptr(&self.0) as *const ()))
            .finish()
    }
}

/// A provider rejected its effective configuration during `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializationError {
    /// Provider name passed to `initialize`
    pub provider: String,
    /// Provider-supplied reason
    pub message: String,
}

impl InitializationError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for InitializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Provider '{}' failed to initialize: {}",
            self.provider, self.message
        )
    }
}

impl std::error::Error for InitializationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Plain;

    impl AuthProvider for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        fn initialize(
            &mut self,
            _name: &str,
            _settings: &Settings,
        ) -> Result<(), InitializationError> {
            Ok(())
        }
    }

    struct Releasing {
        released: AtomicUsize,
    }

    impl AuthProvider for Releasing {
        fn name(&self) -> &str {
            "releasing"
        }

        fn initialize(
            &mut self,
            _name: &str,
            _settings: &Settings,
        ) -> Result<(), InitializationError> {
            Ok(())
        }

        fn as_disposable(&self) -> Option<&dyn Disposable> {
            Some(self)
        }
    }

    impl Disposable for Releasing {
        fn dispose(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_handle_equality_is_identity() {
        let a = ProviderHandle::from_boxed(Box::new(Plain));
        let b = ProviderHandle::from_boxed(Box::new(Plain));
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_dispose_only_when_capable() {
        let plain = ProviderHandle::from_boxed(Box::new(Plain));
        assert!(!plain.dispose_if_supported());

        let releasing = Arc::new(Releasing {
            released: AtomicUsize::new(0),
        });
        let handle = ProviderHandle::new(Arc::clone(&releasing) as Arc<dyn AuthProvider>);
        assert!(handle.dispose_if_supported());
        assert_eq!(releasing.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_initialization_error_display() {
        let err = InitializationError::new(
            "StubMembership",
            "minRequiredPasswordLength must be numeric",
        );
        assert_eq!(
            err.to_string(),
            "Provider 'StubMembership' failed to initialize: minRequiredPasswordLength must be numeric"
        );
    }
}
