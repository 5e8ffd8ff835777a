//! Entropy Sources for Temperature Noise

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::future::Future;

/// Source of random bytes for the noise term
///
/// `ready` resolves once the source can serve a draw; the generator awaits
/// it before every draw, so a source that is still gathering entropy stalls
/// the tick cooperatively instead of failing it.
pub trait EntropySource: Send + 'static {
    /// Wait until random bytes are available
    fn ready(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Fill `dest` with random bytes
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Entropy source seeded from the operating system
pub struct OsEntropy {
    rng: StdRng,
}

impl OsEntropy {
    /// Create a source seeded from the OS random number generator
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for OsEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for OsEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }
}
