//! Backend registry keyed on URL scheme.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::backend::JobBackend;
use crate::error::{SchedError, SchedResult};
use crate::pbs::PbsBackend;
use crate::slurm::SlurmBackend;

/// Factory function type for backends.
type BackendFactory = Box<dyn Fn() -> Box<dyn JobBackend> + Send + Sync>;

/// Shell transports a scheduler family can be reached through.
const TRANSPORT_SUFFIXES: [&str; 3] = ["", "+ssh", "+gsissh"];

/// Maps URL schemes such as `slurm+ssh` to backend constructors.
pub struct BackendRegistry {
    factories: FxHashMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Registry with the SLURM and PBS families.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_family("slurm", || Box::new(SlurmBackend::new()));
        registry.register_family("pbs", || Box::new(PbsBackend::new()));
        registry
    }

    /// Register a backend under a single scheme.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        factory: impl Fn() -> Box<dyn JobBackend> + Send + Sync + 'static,
    ) {
        let scheme = scheme.into();
        debug!("Registering backend for scheme: {}", scheme);
        self.factories.insert(scheme, Box::new(factory));
    }

    /// Register a backend for `family`, `family+ssh` and `family+gsissh`.
    pub fn register_family(
        &mut self,
        family: &str,
        factory: impl Fn() -> Box<dyn JobBackend> + Clone + Send + Sync + 'static,
    ) {
        for suffix in TRANSPORT_SUFFIXES {
            self.register(format!("{family}{suffix}"), factory.clone());
        }
    }

    /// Create the backend registered for `scheme`.
    pub fn create(&self, scheme: &str) -> SchedResult<Box<dyn JobBackend>> {
        self.factories
            .get(scheme)
            .map(|factory| factory())
            .ok_or_else(|| {
                SchedError::BadParameter(format!("no backend registered for scheme '{scheme}'"))
            })
    }

    /// List all registered schemes, sorted.
    pub fn available_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<_> = self.factories.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Check if a scheme is registered.
    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.factories.contains_key(scheme)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
