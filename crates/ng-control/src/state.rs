//! Control-plane state

use std::sync::Arc;

use ng_core::config::ControlConfig;
use ng_core::traits::AccountManager;

use crate::auth::{AuditSink, OperatorAllowList, PrincipalResolver, ScopeAuthorizer};
use crate::service::ManagementService;

/// Everything a request needs, wired from one configuration
pub struct ControlState {
    /// Configuration
    pub config: ControlConfig,
    /// Account manager
    pub manager: Arc<dyn AccountManager>,
    /// Principal resolver
    pub resolver: Arc<PrincipalResolver>,
    /// Management operations
    pub service: Arc<ManagementService>,
}

impl ControlState {
    /// Build the state with the operator allow-list from `config`
    pub fn new(
        config: ControlConfig,
        manager: Arc<dyn AccountManager>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let resolver = Arc::new(PrincipalResolver::new(
            manager.clone(),
            config.default_domain.clone(),
        ));
        let operators = Arc::new(OperatorAllowList::from_config(&config.operators));
        if operators.is_empty() {
            tracing::debug!("No operators configured; scope overrides are ignored");
        } else {
            tracing::debug!("{} operator identities configured", operators.len());
        }
        let authorizer = Arc::new(ScopeAuthorizer::new(resolver.clone(), operators, audit));
        let service = Arc::new(ManagementService::new(
            manager.clone(),
            resolver.clone(),
            authorizer,
            config.default_setup_key_ttl,
        ));

        Self {
            config,
            manager,
            resolver,
            service,
        }
    }

    /// Get the management service
    pub fn service(&self) -> &Arc<ManagementService> {
        &self.service
    }
}
