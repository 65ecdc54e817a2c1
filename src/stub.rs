//! # Stub Module
//!
//! In-crate test doubles: a provider that records how it was configured and a
//! fixture that builds it.
//!
//! Providers end up behind a [`ProviderHandle`](crate::provider::ProviderHandle)
//! once installed, so observations go through a shared [`StubProbe`] rather than
//! through the provider itself.
//!
//! ```rust
//! use provider_override::config::ProvidersSection;
//! use provider_override::controller::ProviderOverride;
//! use provider_override::registry::ProviderRegistry;
//! use provider_override::settings::Settings;
//! use provider_override::stub::StubFixture;
//!
//! let registry = ProviderRegistry::new();
//! let fixture = StubFixture::new().disposable(true);
//! let probe = fixture.probe();
//!
//! let section = ProvidersSection::new().with_provider("StubMembership", Settings::new());
//! let mut harness = ProviderOverride::new(fixture, &registry, section);
//!
//! harness.inject([("minRequiredPasswordLength", "8")]).unwrap();
//! let record = probe.last_initialized().unwrap();
//! assert_eq!(record.settings.get("minRequiredPasswordLength"), Some("8"));
//!
//! harness.restore();
//! assert_eq!(probe.disposals(), 1);
//! ```

use crate::fixture::ProviderFixture;
use crate::provider::{AuthProvider, Disposable, InitializationError};
use crate::settings::Settings;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Arguments of the most recent successful `initialize` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRecord {
    pub name: String,
    pub settings: Settings,
}

#[derive(Default)]
struct ProbeInner {
    last_initialized: ArcSwapOption<InitRecord>,
    providers_created: AtomicUsize,
    initializations: AtomicUsize,
    post_initializations: AtomicUsize,
    disposals: AtomicUsize,
}

/// Shared observation point for stub providers and fixtures.
#[derive(Clone, Default)]
pub struct StubProbe(Arc<ProbeInner>);

impl StubProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_initialized(&self) -> Option<Arc<InitRecord>> {
        self.0.last_initialized.load_full()
    }

    #[must_use]
    pub fn providers_created(&self) -> usize {
        self.0.providers_created.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn initializations(&self) -> usize {
        self.0.initializations.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn post_initializations(&self) -> usize {
        self.0.post_initializations.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn disposals(&self) -> usize {
        self.0.disposals.load(Ordering::SeqCst)
    }
}

/// Provider double that accepts any settings unless told to reject one.
pub struct StubProvider {
    name: String,
    probe: StubProbe,
    disposable: bool,
    reject_key: Option<String>,
}

impl StubProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::with_probe(StubProbe::new())
    }

    #[must_use]
    pub fn with_probe(probe: StubProbe) -> Self {
        Self {
            name: String::new(),
            probe,
            disposable: false,
            reject_key: None,
        }
    }

    /// Provider that already reports `name`, for registry tests that skip `initialize`.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let mut provider = Self::new();
        provider.name = name.into();
        provider
    }

    /// Expose the disposal capability.
    #[must_use]
    pub fn disposable(mut self, disposable: bool) -> Self {
        self.disposable = disposable;
        self
    }

    /// Fail `initialize` whenever the effective settings contain `key`.
    #[must_use]
    pub fn rejecting(mut self, key: impl Into<String>) -> Self {
        self.reject_key = Some(key.into());
        self
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, name: &str, settings: &Settings) -> Result<(), InitializationError> {
        if let Some(key) = &self.reject_key {
            if settings.contains_key(key) {
                return Err(InitializationError::new(
                    name,
                    format!("setting '{key}' is not supported"),
                ));
            }
        }
        self.name = name.to_string();
        self.probe.0.initializations.fetch_add(1, Ordering::SeqCst);
        self.probe
            .0
            .last_initialized
            .store(Some(Arc::new(InitRecord {
                name: name.to_string(),
                settings: settings.clone(),
            })));
        Ok(())
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        if self.disposable {
            Some(self)
        } else {
            None
        }
    }
}

impl Disposable for StubProvider {
    fn dispose(&self) {
        self.probe.0.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fixture building [`StubProvider`]s that all report to one [`StubProbe`].
#[derive(Clone, Default)]
pub struct StubFixture {
    probe: StubProbe,
    disposable: bool,
    sql_backed: bool,
    reject_key: Option<String>,
}

impl StubFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn probe(&self) -> StubProbe {
        self.probe.clone()
    }

    #[must_use]
    pub fn disposable(mut self, disposable: bool) -> Self {
        self.disposable = disposable;
        self
    }

    #[must_use]
    pub fn sql_backed(mut self, sql_backed: bool) -> Self {
        self.sql_backed = sql_backed;
        self
    }

    #[must_use]
    pub fn rejecting(mut self, key: impl Into<String>) -> Self {
        self.reject_key = Some(key.into());
        self
    }
}

impl ProviderFixture for StubFixture {
    fn create_provider(&self) -> Box<dyn AuthProvider> {
        self.probe.0.providers_created.fetch_add(1, Ordering::SeqCst);
        let mut provider = StubProvider::with_probe(self.probe.clone()).disposable(self.disposable);
        if let Some(key) = &self.reject_key {
            provider = provider.rejecting(key.clone());
        }
        Box::new(provider)
    }

    fn post_initialize(&self, _provider: &mut dyn AuthProvider) {
        self.probe
            .0
            .post_initializations
            .fetch_add(1, Ordering::SeqCst);
    }

    fn is_sql_backed(&self) -> bool {
        self.sql_backed
    }
}
