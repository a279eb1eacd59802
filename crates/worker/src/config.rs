//! Worker node configuration.

use factorization::FactorizationConfig;

/// Default port shared by worker listeners and the coordinator result endpoint
pub const DEFAULT_NODE_PORT: u16 = 9002;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Address the worker accepts shards on
    pub listen_addr: String,
    /// Coordinator result endpoint the ranking is sent back to
    pub coordinator_addr: String,
    pub factorization: FactorizationConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_NODE_PORT),
            coordinator_addr: format!("127.0.0.1:{}", DEFAULT_NODE_PORT),
            factorization: FactorizationConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    pub fn with_coordinator_addr(mut self, addr: impl Into<String>) -> Self {
        self.coordinator_addr = addr.into();
        self
    }

    pub fn with_factorization(mut self, factorization: FactorizationConfig) -> Self {
        self.factorization = factorization;
        self
    }
}
