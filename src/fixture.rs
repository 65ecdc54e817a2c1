use crate::provider::AuthProvider;

/// Extension points a concrete test fixture supplies to the override controller.
///
/// Each fixture decides how its substitute provider is built; the controller
/// handles configuration, installation and restoration.
///
/// ```rust
/// use provider_override::fixture::ProviderFixture;
/// use provider_override::provider::AuthProvider;
/// use provider_override::stub::StubProvider;
///
/// struct InMemoryFixture;
///
/// impl ProviderFixture for InMemoryFixture {
///     fn create_provider(&self) -> Box<dyn AuthProvider> {
///         Box::new(StubProvider::new())
///     }
/// }
/// ```
pub trait ProviderFixture {
    /// Build a fresh, uninitialized provider instance.
    fn create_provider(&self) -> Box<dyn AuthProvider>;

    /// Runs once, synchronously, after `initialize` succeeds and before the
    /// provider is installed.
    fn post_initialize(&self, _provider: &mut dyn AuthProvider) {}

    /// Descriptive only; the controller reports it but never branches on it.
    fn is_sql_backed(&self) -> bool {
        false
    }
}

impl<T: ProviderFixture + ?Sized> ProviderFixture for Box<T> {
    fn create_provider(&self) -> Box<dyn AuthProvider> {
        (**self).create_provider()
    }

    fn post_initialize(&self, provider: &mut dyn AuthProvider) {
        (**self).post_initialize(provider);
    }

    fn is_sql_backed(&self) -> bool {
        (**self).is_sql_backed()
    }
}
