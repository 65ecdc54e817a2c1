//! # Controller Module
//!
//! Reversible substitution of the active authentication provider for the
//! duration of a test.
//!
//! ## Lifecycle
//!
//! ```text
//!          inject()                     restore()
//!   Idle ───────────▶ Injected ───────────────────▶ Idle
//!    ▲                   │
//!    └── restore() ──────┘ (no-op when Idle, or when another override
//!                            has replaced the installed provider since)
//! ```
//!
//! ## Inject
//!
//! 1. Snapshot the current provider (absent when the registry is not initialized)
//!    and the current provider collection
//! 2. Ask the fixture for a fresh provider
//! 3. Build the effective configuration: the section entry for the fixed
//!    provider name, `connectionStringName` forced to the stub value, then each
//!    override in order (validated first; later duplicates win)
//! 4. Initialize the provider with the fixed name and the effective configuration
//! 5. Run the fixture's post-initialization hook
//! 6. Install the provider as current, mark the registry initialized, and install
//!    a read-only collection holding only this provider
//!
//! Any failure aborts before step 6, leaving the registry untouched. A provider
//! built in step 2 but never installed is disposed if it supports disposal.
//!
//! ## Restore
//!
//! Only acts when the installed provider is still the one this controller
//! injected. The injected provider is disposed first (if capable), then the
//! snapshot is put back and cleared.
//!
//! ## Limitations
//!
//! A controller holds one snapshot. Injecting twice without restoring in between
//! overwrites it with the first injected provider and the true original is lost.
//! Nothing here locks: tests sharing [`ProviderRegistry::global`] must not run
//! concurrently.
//!
//! ## Usage
//!
//! ```rust
//! use provider_override::config::ProvidersSection;
//! use provider_override::controller::{OverrideState, ProviderOverride};
//! use provider_override::registry::{ProviderRegistry, RegistryAccessor};
//! use provider_override::settings::Settings;
//! use provider_override::stub::StubFixture;
//!
//! let registry = ProviderRegistry::new();
//! let section = ProvidersSection::new().with_provider("StubMembership", Settings::new());
//! let mut harness = ProviderOverride::new(StubFixture::new(), &registry, section);
//!
//! harness.inject([("minRequiredPasswordLength", "8")]).unwrap();
//! assert!(registry.is_initialized());
//! assert_eq!(
//!     harness.effective_settings().unwrap().get("connectionStringName"),
//!     Some("StubConnectionString")
//! );
//!
//! harness.restore();
//! assert_eq!(harness.state(), OverrideState::Idle);
//! assert!(!registry.is_initialized());
//! ```

use crate::config::{
    HarnessConfig, ProvidersSection, CONNECTION_STRING_KEY, DEFAULT_PROVIDER_NAME,
    STUB_CONNECTION_STRING,
};
use crate::error::OverrideError;
use crate::fixture::ProviderFixture;
use crate::provider::{AuthProvider, ProviderHandle};
use crate::registry::{ProviderCollection, ProviderRegistry, RegistryAccessor};
use crate::settings::{validate_override_key, Settings};
use std::ops::Deref;
use tracing::{debug, info, warn};

/// Where a controller is in its inject/restore cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideState {
    Idle,
    Injected,
}

#[derive(Debug, Default)]
struct Snapshot {
    original_provider: Option<ProviderHandle>,
    original_providers: ProviderCollection,
}

/// The provider a controller installed, with the configuration it was given.
#[derive(Debug, Clone)]
pub struct InjectedProvider {
    handle: ProviderHandle,
    settings: Settings,
}

impl InjectedProvider {
    #[must_use]
    pub fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    /// Effective configuration passed to `initialize`.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Provider override controller.
///
/// Owns the fixture, the configuration section and, between `inject` and
/// `restore`, the snapshot and the injected provider. The registry is borrowed
/// so tests can point it at [`ProviderRegistry::global`] or an isolated store.
pub struct ProviderOverride<'r, F, R: ?Sized = ProviderRegistry> {
    fixture: F,
    registry: &'r R,
    section: ProvidersSection,
    provider_name: String,
    snapshot: Option<Snapshot>,
    injected: Option<InjectedProvider>,
}

impl<'r, F, R> ProviderOverride<'r, F, R>
where
    F: ProviderFixture,
    R: RegistryAccessor + ?Sized,
{
    pub fn new(fixture: F, registry: &'r R, section: ProvidersSection) -> Self {
        Self {
            fixture,
            registry,
            section,
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            snapshot: None,
            injected: None,
        }
    }

    /// Controller configured from `PROVIDER_OVERRIDE_NAME` / `PROVIDER_OVERRIDE_CONFIG`.
    pub fn from_env(fixture: F, registry: &'r R) -> anyhow::Result<Self> {
        let config = HarnessConfig::from_env();
        let section = config.load_section()?;
        Ok(Self::new(fixture, registry, section).with_provider_name(config.provider_name))
    }

    /// Resolve a different entry in the section.
    #[must_use]
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    #[must_use]
    pub fn fixture(&self) -> &F {
        &self.fixture
    }

    #[must_use]
    pub fn is_sql_backed(&self) -> bool {
        self.fixture.is_sql_backed()
    }

    #[must_use]
    pub fn state(&self) -> OverrideState {
        if self.injected.is_some() {
            OverrideState::Injected
        } else {
            OverrideState::Idle
        }
    }

    #[must_use]
    pub fn injected(&self) -> Option<&InjectedProvider> {
        self.injected.as_ref()
    }

    #[must_use]
    pub fn effective_settings(&self) -> Option<&Settings> {
        self.injected.as_ref().map(InjectedProvider::settings)
    }

    /// Merge the section entry, the stub connection and `overrides`.
    ///
    /// # Errors
    ///
    /// - [`OverrideError::ConfigurationMissing`] if the section has no entry for the provider name
    /// - [`OverrideError::InvalidConfiguration`] for the first reserved or unrecognized key
    pub fn build_settings<I, K, V>(&self, overrides: I) -> Result<Settings, OverrideError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entry = self.section.find(&self.provider_name).ok_or_else(|| {
            OverrideError::ConfigurationMissing {
                provider: self.provider_name.clone(),
            }
        })?;

        let mut settings = entry.parameters.clone();
        settings.set(CONNECTION_STRING_KEY, STUB_CONNECTION_STRING);

        for (key, value) in overrides {
            let key = key.as_ref();
            validate_override_key(key)?;
            settings.set(key, value);
        }
        Ok(settings)
    }

    /// Build the effective settings and hand them to `provider`.
    fn configure<I, K, V>(
        &self,
        provider: &mut dyn AuthProvider,
        overrides: I,
    ) -> Result<Settings, OverrideError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let settings = self.build_settings(overrides)?;
        provider.initialize(&self.provider_name, &settings)?;
        Ok(settings)
    }

    /// Install a freshly configured provider from the fixture.
    ///
    /// Returns the handle of the installed provider.
    ///
    /// # Errors
    ///
    /// Any [`OverrideError`]; the registry is unchanged when one is returned.
    pub fn inject<I, K, V>(&mut self, overrides: I) -> Result<ProviderHandle, OverrideError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let snapshot = Snapshot {
            original_provider: if self.registry.is_initialized() {
                self.registry.current_provider()
            } else {
                None
            },
            original_providers: self.registry.provider_collection(),
        };

        let mut provider = self.fixture.create_provider();
        let settings = match self.configure(&mut *provider, overrides) {
            Ok(settings) => settings,
            Err(e) => {
                if let Some(disposable) = provider.as_disposable() {
                    disposable.dispose();
                }
                warn!(provider = %self.provider_name, error = %e, "provider injection aborted");
                return Err(e);
            }
        };

        self.fixture.post_initialize(&mut *provider);
        let handle = ProviderHandle::from_boxed(provider);

        if self.injected.is_some() {
            warn!(
                provider = %self.provider_name,
                "injecting over an unrestored override; the earlier original provider is lost"
            );
        }

        self.registry
            .install(handle.clone(), ProviderCollection::single(handle.clone()));

        info!(
            provider = %self.provider_name,
            had_original = snapshot.original_provider.is_some(),
            sql_backed = self.fixture.is_sql_backed(),
            settings = settings.len(),
            "provider injected"
        );

        self.snapshot = Some(snapshot);
        self.injected = Some(InjectedProvider {
            handle: handle.clone(),
            settings,
        });
        Ok(handle)
    }

    /// Put back whatever was installed before [`inject`](Self::inject).
    ///
    /// Returns `true` when state was restored, `false` on the no-op paths
    /// (nothing injected, or the installed provider is no longer ours).
    pub fn restore(&mut self) -> bool {
        let Some(injected) = self.injected.as_ref() else {
            debug!("restore: nothing injected");
            return false;
        };

        let still_installed = self
            .registry
            .current_provider()
            .is_some_and(|current| current.same_provider(&injected.handle));
        if !still_installed {
            debug!(
                provider = %self.provider_name,
                "restore: injected provider was replaced, leaving registry alone"
            );
            return false;
        }

        if injected.handle.dispose_if_supported() {
            debug!(provider = %self.provider_name, "disposed injected provider");
        }

        let snapshot = self.snapshot.take().unwrap_or_default();
        let had_original = snapshot.original_provider.is_some();
        let read_only = snapshot.original_providers.is_read_only();

        self.registry.set_initialized(had_original);
        self.registry.set_current_provider(snapshot.original_provider);
        self.registry
            .set_provider_collection(snapshot.original_providers, read_only);
        self.injected = None;

        info!(provider = %self.provider_name, had_original, "provider restored");
        true
    }

    /// Inject and return a guard that restores on drop.
    ///
    /// # Errors
    ///
    /// Same as [`inject`](Self::inject); no guard is created on failure.
    pub fn scoped<I, K, V>(
        &mut self,
        overrides: I,
    ) -> Result<OverrideGuard<'_, 'r, F, R>, OverrideError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.inject(overrides)?;
        Ok(OverrideGuard { controller: self })
    }
}

/// Restores the override when dropped.
pub struct OverrideGuard<'a, 'r, F, R>
where
    F: ProviderFixture,
    R: RegistryAccessor + ?Sized,
{
    controller: &'a mut ProviderOverride<'r, F, R>,
}

impl<'a, 'r, F, R> Deref for OverrideGuard<'a, 'r, F, R>
where
    F: ProviderFixture,
    R: RegistryAccessor + ?Sized,
{
    type Target = ProviderOverride<'r, F, R>;

    fn deref(&self) -> &Self::Target {
        &*self.controller
    }
}

impl<'a, 'r, F, R> Drop for OverrideGuard<'a, 'r, F, R>
where
    F: ProviderFixture,
    R: RegistryAccessor + ?Sized,
{
    fn drop(&mut self) {
        self.controller.restore();
    }
}
