//! Shared state for the HTTP front-end

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{BackendConfig, DEFAULT_PREFIX};
use crate::lightrag::{LightRagClient, LightRagResult};
use crate::tools::ToolExecutor;

/// Prefix to backend mapping, fixed after startup
#[derive(Clone, Default)]
pub struct ClientTable {
    clients: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ClientTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one backend client per configured prefix
    pub fn from_backends(backends: &[BackendConfig]) -> LightRagResult<Self> {
        let mut table = Self::new();
        for backend in backends {
            let client = LightRagClient::new(&backend.base_url, backend.api_key.as_deref(), backend.timeout)?;
            tracing::info!(
                prefix = %backend.prefix,
                base_url = %backend.base_url,
                authenticated = backend.api_key.is_some(),
                "Registered backend"
            );
            table.insert(backend.prefix.clone(), Arc::new(client));
        }
        Ok(table)
    }

    pub fn insert(&mut self, prefix: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        self.clients.insert(prefix.into(), executor);
    }

    /// Client for `prefix`, falling back to the default entry
    pub fn resolve(&self, prefix: &str) -> Option<Arc<dyn ToolExecutor>> {
        if let Some(client) = self.clients.get(prefix) {
            return Some(client.clone());
        }

        let fallback = self.clients.get(DEFAULT_PREFIX).cloned();
        if fallback.is_some() {
            tracing::debug!(prefix = %prefix, "Unknown prefix, using default backend");
        }
        fallback
    }

    /// Configured prefixes, sorted
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.clients.keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for ClientTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTable")
            .field("prefixes", &self.prefixes())
            .finish()
    }
}

/// Application state handed to every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub clients: Arc<ClientTable>,
}

impl AppState {
    pub fn new(clients: ClientTable) -> Self {
        Self {
            clients: Arc::new(clients),
        }
    }
}
