//! Configuration structures for KorvoDB.

use crate::error::{KorvoError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for an in-memory index instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Arena chunk size in bytes. Must be a power of two; node allocations
    /// never span a chunk boundary.
    pub arena_chunk_bytes: usize,
    /// Total arena ceiling in bytes. Allocation past this limit fails the
    /// insert that triggered it.
    pub arena_max_bytes: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            arena_chunk_bytes: 1024 * 1024,       // 1 MB
            arena_max_bytes: 256 * 1024 * 1024,   // 256 MB
        }
    }
}

impl IndexConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.arena_chunk_bytes.is_power_of_two() {
            return Err(KorvoError::InvalidConfig(format!(
                "arena_chunk_bytes must be a power of two, got {}",
                self.arena_chunk_bytes
            )));
        }
        if self.arena_max_bytes < self.arena_chunk_bytes {
            return Err(KorvoError::InvalidConfig(format!(
                "arena_max_bytes ({}) must hold at least one chunk ({})",
                self.arena_max_bytes, self.arena_chunk_bytes
            )));
        }
        Ok(())
    }

    /// Returns the maximum number of chunks the arena may allocate.
    pub fn max_chunks(&self) -> usize {
        self.arena_max_bytes / self.arena_chunk_bytes
    }
}
