//! # provider-override
//!
//! **provider-override** temporarily swaps the process-wide authentication
//! provider for a configured test double and puts the original back afterwards.
//!
//! ## Overview
//!
//! Code under test usually reaches its authentication provider through a
//! process-wide singleton. To test it against a double, a harness has to:
//!
//! - remember whatever provider is installed right now
//! - build and configure the substitute from simulated settings
//! - install the substitute as the current provider
//! - after the test, release the substitute and restore the original
//!
//! This crate implements that protocol and nothing else. Real membership logic,
//! password storage and the test runner are the caller's business.
//!
//! ## Architecture
//!
//! - **[`registry`]** - Accessor over the process-wide provider state (current provider,
//!   initialized flag, read-only provider collection)
//! - **[`controller`]** - Inject/restore orchestration and configuration merging
//! - **[`settings`]** - Ordered settings and the override-key whitelist
//! - **[`config`]** - Named provider section loading and environment settings
//! - **[`provider`]** - Provider capability contract (initialize, optional disposal)
//! - **[`fixture`]** - Extension points a concrete test fixture implements
//! - **[`stub`]** - Recording provider and fixture doubles
//!
//! ### Inject / Restore Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Test
//!     participant Ctl as ProviderOverride
//!     participant Fix as ProviderFixture
//!     participant Reg as RegistryAccessor
//!     participant P as Substitute Provider
//!
//!     Test->>Ctl: inject(overrides)
//!     Ctl->>Reg: is_initialized() / current_provider()
//!     Reg-->>Ctl: snapshot
//!     Ctl->>Fix: create_provider()
//!     Fix-->>Ctl: provider
//!     Ctl->>Ctl: section entry + stub connection + validated overrides
//!     alt Missing entry or bad key
//!         Ctl-->>Test: OverrideError (registry untouched)
//!     end
//!     Ctl->>P: initialize(name, settings)
//!     Ctl->>Fix: post_initialize(provider)
//!     Ctl->>Reg: install(provider, read-only collection)
//!
//!     Note over Test: test body runs
//!
//!     Test->>Ctl: restore()
//!     Ctl->>Reg: current_provider()
//!     alt Not ours any more
//!         Ctl-->>Test: no-op
//!     end
//!     Ctl->>P: dispose() (if capable)
//!     Ctl->>Reg: set_initialized / set_current_provider / set_provider_collection
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use provider_override::{ProviderOverride, ProviderRegistry, ProvidersSection, RegistryAccessor};
//! use provider_override::settings::Settings;
//! use provider_override::stub::StubFixture;
//!
//! let registry = ProviderRegistry::new();
//! let section = ProvidersSection::new().with_provider("StubMembership", Settings::new());
//! let mut harness = ProviderOverride::new(StubFixture::new(), &registry, section);
//!
//! {
//!     let guard = harness.scoped([("minRequiredPasswordLength", "8")]).unwrap();
//!     assert!(registry.is_initialized());
//!     assert_eq!(
//!         guard.effective_settings().unwrap().get("minRequiredPasswordLength"),
//!         Some("8")
//!     );
//! }
//!
//! assert!(!registry.is_initialized());
//! ```
//!
//! ## Runtime Considerations
//!
//! Everything is synchronous and local. The process-wide registry
//! ([`ProviderRegistry::global`]) is shared mutable state: tests that inject into
//! it must be serialized by the test runner, and every `inject` must be paired
//! with exactly one `restore` (or held in an [`OverrideGuard`]).

pub mod config;
pub mod controller;
pub mod error;
pub mod fixture;
pub mod provider;
pub mod registry;
pub mod settings;
pub mod stub;

pub use config::{HarnessConfig, ProviderEntry, ProvidersSection};
pub use controller::{InjectedProvider, OverrideGuard, OverrideState, ProviderOverride};
pub use error::{CollectionError, InvalidKey, OverrideError};
pub use fixture::ProviderFixture;
pub use provider::{AuthProvider, Disposable, InitializationError, ProviderHandle};
pub use registry::{ProviderCollection, ProviderRegistry, ProviderState, RegistryAccessor};
pub use settings::{validate_override_key, Settings};
