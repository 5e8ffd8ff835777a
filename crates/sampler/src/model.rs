//! Simulated Temperature Model

use crate::config::SampleMode;
use crate::entropy::EntropySource;

/// Base temperature for normal and noisy modes (25.000 °C)
pub const BASE_TEMP_MC: i32 = 25_000;
/// Noise span in normal mode (±100 m°C)
pub const NORMAL_NOISE_MC: i32 = 100;
/// Noise span in noisy mode (±1 °C)
pub const NOISY_NOISE_MC: i32 = 1_000;
/// Ramp increment per tick
pub const RAMP_STEP_MC: i32 = 1_000;
/// Ramp wraps back to zero at this value
pub const RAMP_WRAP_MC: i32 = 100_000;

/// Produces the next temperature for a mode
///
/// The last produced value is kept here so ramp mode continues from it.
pub struct TemperatureModel<E> {
    entropy: E,
    last_mc: i32,
}

impl<E: EntropySource> TemperatureModel<E> {
    /// Create a model starting at [`BASE_TEMP_MC`]
    pub fn new(entropy: E) -> Self {
        Self::with_start(entropy, BASE_TEMP_MC)
    }

    /// Create a model starting at an arbitrary temperature
    pub fn with_start(entropy: E, start_mc: i32) -> Self {
        Self {
            entropy,
            last_mc: start_mc,
        }
    }

    /// Last produced temperature
    pub fn last(&self) -> i32 {
        self.last_mc
    }

    /// Compute the next temperature
    pub async fn next(&mut self, mode: SampleMode) -> i32 {
        let temp_mc = match mode {
            SampleMode::Normal => BASE_TEMP_MC + self.noise(NORMAL_NOISE_MC).await,
            SampleMode::Noisy => BASE_TEMP_MC + self.noise(NOISY_NOISE_MC).await,
            SampleMode::Ramp => {
                (self.last_mc.rem_euclid(RAMP_WRAP_MC) + RAMP_STEP_MC).rem_euclid(RAMP_WRAP_MC)
            }
        };
        self.last_mc = temp_mc;
        temp_mc
    }

    /// Random value in (-span, span)
    async fn noise(&mut self, span: i32) -> i32 {
        self.entropy.ready().await;

        let mut bytes = [0u8; 4];
        self.entropy.fill_bytes(&mut bytes);
        i32::from_ne_bytes(bytes) % span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the same 4 bytes on every draw
    struct FixedEntropy(i32);

    impl EntropySource for FixedEntropy {
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.copy_from_slice(&self.0.to_ne_bytes());
        }
    }

    #[tokio::test]
    async fn test_ramp_wraps_after_hundred_ticks() {
        let mut model = TemperatureModel::with_start(FixedEntropy(0), 0);

        let mut values = Vec::new();
        for _ in 0..100 {
            values.push(model.next(SampleMode::Ramp).await);
        }

        assert_eq!(values[0], 1_000);
        assert_eq!(values[98], 99_000);
        assert_eq!(values[99], 0);
    }

    #[tokio::test]
    async fn test_noise_is_reduced_into_range() {
        let mut model = TemperatureModel::new(FixedEntropy(12_345));
        assert_eq!(model.next(SampleMode::Normal).await, BASE_TEMP_MC + 45);
        assert_eq!(model.next(SampleMode::Noisy).await, BASE_TEMP_MC + 345);

        let mut model = TemperatureModel::new(FixedEntropy(-12_345));
        assert_eq!(model.next(SampleMode::Normal).await, BASE_TEMP_MC - 45);

        let mut model = TemperatureModel::new(FixedEntropy(i32::MIN));
        let temp = model.next(SampleMode::Noisy).await;
        assert!((BASE_TEMP_MC - 1_000..BASE_TEMP_MC + 1_000).contains(&temp));
    }

    #[tokio::test]
    async fn test_ramp_continues_from_last_value() {
        let mut model = TemperatureModel::new(FixedEntropy(7));
        assert_eq!(model.next(SampleMode::Normal).await, 25_007);
        assert_eq!(model.next(SampleMode::Ramp).await, 26_007);
        assert_eq!(model.last(), 26_007);
    }

    #[tokio::test]
    async fn test_ramp_from_extreme_start_stays_in_range() {
        let mut model = TemperatureModel::with_start(FixedEntropy(0), i32::MAX);
        // i32::MAX = 21474 * 100_000 + 83_647
        assert_eq!(model.next(SampleMode::Ramp).await, 84_647);

        let mut model = TemperatureModel::with_start(FixedEntropy(0), i32::MIN);
        // i32::MIN rem_euclid 100_000 = 16_352
        assert_eq!(model.next(SampleMode::Ramp).await, 17_352);
    }
}
