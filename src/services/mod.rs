//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;
pub mod redis;
pub mod sessions;

use std::sync::Arc;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

use sessions::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sessions: Arc<dyn SessionStore>,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            sessions,
            repository,
        }
    }

    /// Readiness probe: the storage backend answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
