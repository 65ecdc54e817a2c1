//! Integration tests against the process-wide registry
//!
//! These share `ProviderRegistry::global()`, so every test takes the
//! registry lock from `common::global_registry` and resets state first.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{global_registry, membership_section, no_overrides};
use provider_override::stub::{StubFixture, StubProvider};
use provider_override::{
    OverrideState, ProviderCollection, ProviderHandle, ProviderOverride, ProviderRegistry,
    RegistryAccessor,
};

#[test]
fn test_global_round_trip_with_application_provider() {
    let _lock = global_registry::lock();
    let registry = ProviderRegistry::global();
    registry.reset();

    let app = ProviderHandle::from_boxed(Box::new(StubProvider::named("application")));
    registry.install(app.clone(), ProviderCollection::single(app.clone()));

    let fixture = StubFixture::new().disposable(true);
    let probe = fixture.probe();
    let mut harness = ProviderOverride::new(fixture, registry, membership_section());

    let injected = harness.inject([("requiresQuestionAndAnswer", "true")]).unwrap();
    assert_eq!(ProviderRegistry::global().current_provider(), Some(injected));

    harness.restore();

    let state = ProviderRegistry::global().snapshot();
    assert!(state.initialized);
    assert_eq!(state.current, Some(app.clone()));
    assert!(state.providers.contains(&app));
    assert!(state.is_consistent());
    assert_eq!(probe.disposals(), 1);

    registry.reset();
}

#[test]
fn test_global_guard_restores_uninitialized_state() {
    let _lock = global_registry::lock();
    let registry = ProviderRegistry::global();
    registry.reset();

    let mut harness = ProviderOverride::new(StubFixture::new(), registry, membership_section());
    {
        let guard = harness.scoped(no_overrides()).unwrap();
        assert_eq!(guard.state(), OverrideState::Injected);
        assert!(registry.snapshot().is_consistent());
        assert!(registry.is_initialized());
    }

    assert!(!registry.is_initialized());
    assert!(registry.current_provider().is_none());
    assert!(registry.provider_collection().is_empty());
}

#[test]
fn test_global_failed_inject_leaves_state() {
    let _lock = global_registry::lock();
    let registry = ProviderRegistry::global();
    registry.reset();

    let mut harness = ProviderOverride::new(StubFixture::new(), registry, membership_section());
    assert!(harness.scoped([("name", "spoofed")]).is_err());

    assert!(!registry.is_initialized());
    assert!(registry.current_provider().is_none());
}
