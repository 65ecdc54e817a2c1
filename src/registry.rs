//! # Registry Module
//!
//! Single point of read/write access to the process-wide provider state.
//!
//! ## Overview
//!
//! Provider state is three pieces of data that live for the whole process:
//!
//! - the **current provider** (absent until something installs one)
//! - the **initialized flag** (when `true`, a current provider is present)
//! - the **provider collection**, normally marked read-only once installed
//!
//! The override controller never touches that state directly. It goes through a
//! [`RegistryAccessor`] handed to it explicitly, so tests can run against the
//! process-wide [`ProviderRegistry::global`] or against an isolated
//! [`ProviderRegistry::new`] without hidden coupling.
//!
//! ## Concurrency
//!
//! [`ProviderRegistry`] keeps its state in an [`ArcSwap`]: reads are lock-free
//! snapshots and every setter publishes a new copy. That makes each individual
//! read and write consistent, but an inject/restore pair is still a multi-step
//! protocol. Tests that share the global registry must be serialized by the
//! test runner; interleaved pairs can lose the original provider.
//!
//! ```rust
//! use provider_override::registry::{ProviderRegistry, RegistryAccessor};
//!
//! let registry = ProviderRegistry::new();
//! assert!(!registry.is_initialized());
//! assert!(registry.current_provider().is_none());
//! ```

use crate::error::CollectionError;
use crate::provider::ProviderHandle;
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

/// Named, ordered set of providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCollection {
    providers: Vec<ProviderHandle>,
    read_only: bool,
}

impl ProviderCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only collection holding exactly `provider`.
    #[must_use]
    pub fn single(provider: ProviderHandle) -> Self {
        Self {
            providers: vec![provider],
            read_only: true,
        }
    }

    /// Add a provider, keyed by its name.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::ReadOnly`] once [`set_read_only`](Self::set_read_only) was called
    /// - [`CollectionError::Duplicate`] if a provider with the same name is present
    pub fn add(&mut self, provider: ProviderHandle) -> Result<(), CollectionError> {
        if self.read_only {
            return Err(CollectionError::ReadOnly);
        }
        if self.get(provider.name()).is_some() {
            return Err(CollectionError::Duplicate {
                name: provider.name().to_string(),
            });
        }
        self.providers.push(provider);
        Ok(())
    }

    pub fn set_read_only(&mut self) {
        self.read_only = true;
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProviderHandle> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Identity membership check.
    #[must_use]
    pub fn contains(&self, provider: &ProviderHandle) -> bool {
        self.providers.iter().any(|p| p.same_provider(provider))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Full provider state at one point in time.
#[derive(Debug, Clone, Default)]
pub struct ProviderState {
    pub current: Option<ProviderHandle>,
    pub initialized: bool,
    pub providers: ProviderCollection,
}

impl ProviderState {
    /// `initialized` implies a current provider.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.initialized || self.current.is_some()
    }
}

/// Read/write access to provider state.
///
/// No method reports errors: the backing store is assumed to exist. Every
/// setter is immediately visible to any other reader of the same store.
pub trait RegistryAccessor {
    fn is_initialized(&self) -> bool;

    fn set_initialized(&self, initialized: bool);

    fn current_provider(&self) -> Option<ProviderHandle>;

    fn set_current_provider(&self, provider: Option<ProviderHandle>);

    fn provider_collection(&self) -> ProviderCollection;

    /// Replace the collection, marking it read-only first when `read_only` is set.
    fn set_provider_collection(&self, providers: ProviderCollection, read_only: bool);

    /// Make `provider` current, mark the registry initialized and install
    /// `providers` as the read-only collection.
    ///
    /// # Default Implementation
    ///
    /// Calls the three setters in turn. Stores that can publish all three
    /// fields at once should override this.
    fn install(&self, provider: ProviderHandle, providers: ProviderCollection) {
        self.set_current_provider(Some(provider));
        self.set_initialized(true);
        self.set_provider_collection(providers, true);
    }
}

static GLOBAL: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::new);

/// Provider state store backed by [`ArcSwap`].
pub struct ProviderRegistry {
    state: ArcSwap<ProviderState>,
}

impl ProviderRegistry {
    /// Isolated, uninitialized store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(ProviderState::default()),
        }
    }

    /// The process-wide store.
    #[must_use]
    pub fn global() -> &'static ProviderRegistry {
        &GLOBAL
    }

    /// Current state as one consistent snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ProviderState> {
        self.state.load_full()
    }

    /// Drop everything back to the uninitialized state.
    pub fn reset(&self) {
        self.state.store(Arc::new(ProviderState::default()));
    }

    fn update<F>(&self, mut f: F)
    where
        F: FnMut(&mut ProviderState),
    {
        self.state.rcu(|current| {
            let mut next = ProviderState::clone(current);
            f(&mut next);
            next
        });
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAccessor for ProviderRegistry {
    fn is_initialized(&self) -> bool {
        self.state.load().initialized
    }

    fn set_initialized(&self, initialized: bool) {
        self.update(|s| s.initialized = initialized);
    }

    fn current_provider(&self) -> Option<ProviderHandle> {
        self.state.load().current.clone()
    }

    fn set_current_provider(&self, provider: Option<ProviderHandle>) {
        self.update(|s| s.current = provider.clone());
    }

    fn provider_collection(&self) -> ProviderCollection {
        self.state.load().providers.clone()
    }

    fn set_provider_collection(&self, mut providers: ProviderCollection, read_only: bool) {
        if read_only {
            providers.set_read_only();
        }
        self.update(|s| s.providers = providers.clone());
    }

    fn install(&self, provider: ProviderHandle, mut providers: ProviderCollection) {
        providers.set_read_only();
        debug!(provider = provider.name(), "installing provider");
        self.update(|s| {
            s.current = Some(provider.clone());
            s.initialized = true;
            s.providers = providers.clone();
        });
    }
}
