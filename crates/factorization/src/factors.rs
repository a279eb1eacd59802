//! Latent factor tables: one fixed-length vector per user or item id.

use rand::Rng;
use std::collections::HashMap;

/// Dense, row-major storage of `id → vector<f64>` with a shared dimension.
#[derive(Debug, Clone)]
pub struct LatentFactors {
    dimension: usize,
    index: HashMap<String, usize>,
    data: Vec<f64>,
}

impl LatentFactors {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            index: HashMap::new(),
            data: Vec::new(),
        }
    }

    /// Build a table whose vectors are drawn uniformly from `[0, 1)`.
    ///
    /// Ids are initialised in iteration order, so the same ids and the same
    /// generator state always produce the same table.
    pub fn random<'a, I, R>(ids: I, dimension: usize, rng: &mut R) -> Self
    where
        I: IntoIterator<Item = &'a String>,
        R: Rng,
    {
        let mut factors = Self::new(dimension);
        for id in ids {
            let vector: Vec<f64> = (0..dimension).map(|_| rng.random::<f64>()).collect();
            factors.insert(id.clone(), &vector);
        }
        factors
    }

    /// Insert or overwrite the vector of `id`.
    ///
    /// Vectors shorter or longer than the table dimension are padded with
    /// zeros or cut, so every row keeps the same length.
    pub fn insert(&mut self, id: String, vector: &[f64]) {
        let dim = self.dimension;
        let row = match self.index.get(&id) {
            Some(&row) => row,
            None => {
                let row = self.index.len();
                self.index.insert(id, row);
                self.data.resize(self.data.len() + dim, 0.0);
                row
            }
        };
        let slot = &mut self.data[row * dim..(row + 1) * dim];
        slot.fill(0.0);
        let n = vector.len().min(dim);
        slot[..n].copy_from_slice(&vector[..n]);
    }

    pub fn get(&self, id: &str) -> Option<&[f64]> {
        let row = *self.index.get(id)?;
        Some(&self.data[row * self.dimension..(row + 1) * self.dimension])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut [f64]> {
        let row = *self.index.get(id)?;
        Some(&mut self.data[row * self.dimension..(row + 1) * self.dimension])
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Dot product over the common prefix of two vectors
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
