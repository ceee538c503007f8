use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{AssessmentStore, StoreError};

/// Backend-agnostic store configuration.
///
/// `backend` must match the [`StoreFactory::backend_name`] of a registered
/// factory. `connection_string` is handed to that factory unchanged.
///
/// | backend  | connection_string |
/// |----------|-------------------|
/// | `memory` | ignored           |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"memory"`).
    pub backend: String,
    pub connection_string: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

/// One implementation per storage backend, registered with a
/// [`StoreRegistry`] at startup.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Opens the backend and returns a ready-to-use store.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn AssessmentStore>, StoreError>;
}

/// Registry of [`StoreFactory`] instances, keyed by backend name.
pub struct StoreRegistry {
    factories: HashMap<&'static str, Box<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a backend factory, replacing any with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn StoreFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatches to the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`StoreError::Configuration`] when no factory is registered under
    ///   the requested name.
    /// * Any error the chosen factory returns.
    pub async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn AssessmentStore>, StoreError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                StoreError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::{AssessmentStore, StoreConfig, StoreError, StoreFactory, StoreRegistry};
    use crate::models::{AssessmentInput, CalculationResult};
    use crate::store::{AssessmentKey, AssessmentRecord, MemoryStoreFactory};

    // Routing tests never call into the store itself.
    struct StubStore;

    #[async_trait]
    impl AssessmentStore for StubStore {
        async fn create(
            &self,
            _key: AssessmentKey,
            _input: AssessmentInput,
            _result: CalculationResult,
        ) -> Result<AssessmentRecord, StoreError> {
            unimplemented!()
        }
        async fn update(
            &self,
            _key: &AssessmentKey,
            _input: AssessmentInput,
            _result: CalculationResult,
        ) -> Result<AssessmentRecord, StoreError> {
            unimplemented!()
        }
        async fn get(
            &self,
            _key: &AssessmentKey,
        ) -> Result<AssessmentRecord, StoreError> {
            unimplemented!()
        }
        async fn list_for_tenant(
            &self,
            _tenant_id: &str,
        ) -> Result<Vec<AssessmentRecord>, StoreError> {
            unimplemented!()
        }
    }

    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StoreFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &StoreConfig,
        ) -> Result<Box<dyn AssessmentStore>, StoreError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubStore))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl StoreFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &StoreConfig,
        ) -> Result<Box<dyn AssessmentStore>, StoreError> {
            Err(StoreError::Backend("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn StoreFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> StoreConfig {
        StoreConfig {
            backend: backend.to_string(),
            connection_string: String::new(),
        }
    }

    // =========================================================================
    // registration tests
    // =========================================================================

    #[test]
    fn default_config_is_memory() {
        assert_eq!(StoreConfig::default().backend, "memory");
    }

    #[test]
    fn new_registry_has_no_backends() {
        assert!(StoreRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut registry = StoreRegistry::new();
        let (first, _) = stub_factory("remote");
        let (second, _) = stub_factory("archive");
        registry.register(first);
        registry.register(second);

        assert_eq!(registry.available_backends(), vec!["archive", "remote"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut registry = StoreRegistry::new();
        let (old, _) = stub_factory("remote");
        let (new, _) = stub_factory("remote");
        registry.register(old);
        registry.register(new);

        assert_eq!(registry.available_backends(), vec!["remote"]);
    }

    // =========================================================================
    // dispatch tests
    // =========================================================================

    #[tokio::test]
    async fn create_calls_matching_factory() {
        let mut registry = StoreRegistry::new();
        let (remote, remote_called) = stub_factory("remote");
        let (archive, archive_called) = stub_factory("archive");
        registry.register(remote);
        registry.register(archive);

        let result = registry.create(&config("remote")).await;

        assert!(result.is_ok());
        assert!(remote_called.load(Ordering::SeqCst));
        assert!(!archive_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut registry = StoreRegistry::new();
        registry.register(Box::new(MemoryStoreFactory));

        match registry.create(&config("remote")).await {
            Err(StoreError::Configuration(message)) => {
                assert!(message.contains("remote"));
                assert!(message.contains("memory"));
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a store"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut registry = StoreRegistry::new();
        registry.register(Box::new(FailingFactory));

        let result = registry.create(&config("failing")).await;

        assert_eq!(
            result.err(),
            Some(StoreError::Backend("intentional failure".to_string()))
        );
    }

    #[tokio::test]
    async fn memory_backend_is_registered_by_name() {
        let mut registry = StoreRegistry::new();
        registry.register(Box::new(MemoryStoreFactory));

        let store = registry.create(&StoreConfig::default()).await;

        assert!(store.is_ok());
    }
}
