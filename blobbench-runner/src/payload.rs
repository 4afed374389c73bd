//! The object payload shared by all upload workers.

use bytes::Bytes;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// A fixed-size buffer of random bytes, generated once per run.
///
/// Cloning is cheap and all clones refer to the same bytes, so every write of a run uploads
/// identical content.
#[derive(Clone, Debug)]
pub struct ObjectPayload {
    data: Bytes,
}

impl ObjectPayload {
    /// Generates a payload of `size` bytes from a random seed.
    pub fn random(size: usize) -> Self {
        Self::seeded(size, rand::random())
    }

    /// Generates a payload of `size` bytes from the given seed.
    pub fn seeded(size: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut data = vec![0; size];
        rng.fill_bytes(&mut data);
        Self { data: data.into() }
    }

    /// Returns a handle to the payload bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// The payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a zero-sized payload.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_stable() {
        let payload = ObjectPayload::seeded(4096, 42);
        assert_eq!(payload.len(), 4096);
        assert_eq!(payload.bytes(), payload.bytes());
        assert_eq!(payload.bytes(), ObjectPayload::seeded(4096, 42).bytes());
        assert_ne!(payload.bytes(), ObjectPayload::seeded(4096, 43).bytes());
    }
}
