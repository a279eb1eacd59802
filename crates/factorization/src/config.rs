//! Training hyper-parameters.

/// Hyper-parameters of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorizationConfig {
    /// Latent dimension F shared by every user and item vector
    pub factors: usize,
    pub learning_rate: f64,
    /// Full passes over the observed ratings
    pub epochs: usize,
    /// Length K of the ranking returned for the target user
    pub top_k: usize,
    /// Fixed generator seed; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for FactorizationConfig {
    fn default() -> Self {
        Self {
            factors: 3,
            learning_rate: 0.01,
            epochs: 10,
            top_k: 5,
            seed: None,
        }
    }
}

impl FactorizationConfig {
    /// Configure latent dimension (default: 3)
    pub fn with_factors(mut self, factors: usize) -> Self {
        self.factors = factors;
        self
    }

    /// Configure learning rate (default: 0.01)
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Configure number of epochs (default: 10)
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Configure ranking length (default: 5)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
