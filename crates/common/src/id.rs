//! ID generation utilities.

use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use ulid::{Generator, Ulid};
use uuid::Uuid;

/// Process-wide monotonic source. Ids minted within one millisecond
/// increment the previous id instead of drawing fresh random bits.
static MONOTONIC: Lazy<Mutex<Generator>> = Lazy::new(|| Mutex::new(Generator::new()));

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// IDs are monotonic within the process, so ordering by ID doubles as
    /// ordering by insertion (newest recipes first, cart entries in the order added).
    #[must_use]
    pub fn generate(&self) -> String {
        let next = MONOTONIC
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate();
        // Overflow needs 2^80 ids in one millisecond
        next.unwrap_or_else(|_| Ulid::new()).to_string().to_lowercase()
    }

    /// Generate an API access token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component in tokens
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_back_to_back_ids_sort_in_generation_order() {
        let id_gen = IdGenerator::new();
        for _ in 0..200 {
            let batch: Vec<String> = (0..5).map(|_| id_gen.generate()).collect();
            let mut sorted = batch.clone();
            sorted.sort();
            assert_eq!(batch, sorted);
        }
    }

    #[test]
    fn test_generators_share_ordering() {
        let first = IdGenerator::new().generate();
        let second = IdGenerator::new().generate();
        assert!(first < second);
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32);
        assert_ne!(token, id_gen.generate_token());
    }
}
