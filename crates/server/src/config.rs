//! Coordinator configuration.
//!
//! The worker list is static for the lifetime of the process: its length is
//! the node count N used to partition every request.

use std::time::Duration;

use crate::reducer::{DEFAULT_FINAL_SIZE, DEFAULT_INTERMEDIATE_CAPACITY};

/// How a failed dial during distribution affects the fan-in count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanInPolicy {
    /// Keep waiting for all N result connections, even for workers that were
    /// never reached
    #[default]
    AwaitAll,
    /// Lower the expected count by one for every worker that could not be
    /// dialed
    SkipFailedDials,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// `host:port` of every worker, in shard order
    pub worker_addrs: Vec<String>,
    /// Endpoint workers connect back to with their results
    pub result_listen_addr: String,
    /// Bound M on the intermediate global ranking
    pub intermediate_capacity: usize,
    /// Length R of the final ranking
    pub final_size: usize,
    pub fan_in_policy: FanInPolicy,
    /// Give up waiting for results after this long; `None` waits forever
    pub fan_in_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker_addrs: Vec::new(),
            result_listen_addr: "0.0.0.0:9002".to_string(),
            intermediate_capacity: DEFAULT_INTERMEDIATE_CAPACITY,
            final_size: DEFAULT_FINAL_SIZE,
            fan_in_policy: FanInPolicy::AwaitAll,
            fan_in_timeout: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn new(worker_addrs: Vec<String>) -> Self {
        Self {
            worker_addrs,
            ..Self::default()
        }
    }

    /// Number of worker nodes N
    pub fn node_count(&self) -> usize {
        self.worker_addrs.len()
    }

    pub fn with_result_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.result_listen_addr = addr.into();
        self
    }

    /// Configure the intermediate bound M (default: 15)
    pub fn with_intermediate_capacity(mut self, capacity: usize) -> Self {
        self.intermediate_capacity = capacity;
        self
    }

    /// Configure the final ranking length R (default: 3)
    pub fn with_final_size(mut self, size: usize) -> Self {
        self.final_size = size;
        self
    }

    pub fn with_fan_in_policy(mut self, policy: FanInPolicy) -> Self {
        self.fan_in_policy = policy;
        self
    }

    pub fn with_fan_in_timeout(mut self, timeout: Duration) -> Self {
        self.fan_in_timeout = Some(timeout);
        self
    }
}
