use std::sync::Arc;

use crate::config::AppConfig;
use crate::crud::{build_entity_operations, EntityOperations, PageLimits};
use crate::database::DocumentStore;
use crate::middleware::auth::{AuthVerifier, JwtVerifier};
use crate::profile::ProfileService;
use crate::schema::Entity;

/// Everything a request handler may reach. Built once at startup and passed
/// explicitly; there is no global.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn AuthVerifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        let verifier = Arc::new(JwtVerifier::new(&config.security.jwt_secret));
        Self {
            store,
            verifier,
            config: Arc::new(config),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn AuthVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default: self.config.api.default_page_limit,
            max: self.config.api.max_page_limit,
        }
    }

    pub fn operations<E: Entity>(&self) -> EntityOperations<E> {
        build_entity_operations::<E>(self.store.clone(), E::SCHEMA.collection).with_limits(self.page_limits())
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.store.clone(), self.config.security.password_hash_cost)
    }
}
