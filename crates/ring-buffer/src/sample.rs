//! Temperature Sample and Record Layout

use crate::error::RecordError;
use crate::flags;
use serde::{Deserialize, Serialize};

/// Size of one encoded sample: 8-byte timestamp, 4-byte temperature, 4-byte flags
pub const RECORD_SIZE: usize = 16;

/// One timestamped temperature reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Temperature in milli-degrees Celsius (44123 = 44.123 °C)
    pub temp_mc: i32,
    /// Event flags (see [`crate::flags`])
    pub flags: u32,
}

impl Sample {
    /// Create a new sample
    pub fn new(timestamp_ns: u64, temp_mc: i32, flags: u32) -> Self {
        Self {
            timestamp_ns,
            temp_mc,
            flags,
        }
    }

    /// True if the sample was produced above the alert threshold
    pub fn is_alert(&self) -> bool {
        self.flags & flags::THRESHOLD_CROSSED != 0
    }

    /// True if the sample carries the NEW flag
    pub fn is_new(&self) -> bool {
        self.flags & flags::NEW != 0
    }

    /// Temperature in degrees Celsius
    pub fn temp_celsius(&self) -> f64 {
        f64::from(self.temp_mc) / 1000.0
    }

    /// Encode into the fixed little-endian record layout
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut record = [0u8; RECORD_SIZE];
        record[0..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        record[8..12].copy_from_slice(&self.temp_mc.to_le_bytes());
        record[12..16].copy_from_slice(&self.flags.to_le_bytes());
        record
    }

    /// Decode a record produced by [`Sample::encode`]
    ///
    /// Anything other than exactly one full record is rejected; a partial
    /// record is never interpreted.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let record: &[u8; RECORD_SIZE] = bytes.try_into().map_err(|_| RecordError::Length {
            expected: RECORD_SIZE,
            actual: bytes.len(),
        })?;

        let mut timestamp = [0u8; 8];
        let mut temp = [0u8; 4];
        let mut event_flags = [0u8; 4];
        timestamp.copy_from_slice(&record[0..8]);
        temp.copy_from_slice(&record[8..12]);
        event_flags.copy_from_slice(&record[12..16]);

        Ok(Self {
            timestamp_ns: u64::from_le_bytes(timestamp),
            temp_mc: i32::from_le_bytes(temp),
            flags: u32::from_le_bytes(event_flags),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let sample = Sample::new(0x0102_0304_0506_0708, -2, flags::NEW | flags::THRESHOLD_CROSSED);
        let record = sample.encode();

        assert_eq!(record.len(), RECORD_SIZE);
        assert_eq!(&record[0..8], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&record[8..12], &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&record[12..16], &[0x03, 0x00, 0x00, 0x00]);
        assert_eq!(Sample::decode(&record), Ok(sample));
    }

    #[test]
    fn test_decode_rejects_short_record() {
        let record = Sample::default().encode();
        assert_eq!(
            Sample::decode(&record[..12]),
            Err(RecordError::Length { expected: 16, actual: 12 })
        );
    }

    #[test]
    fn test_flag_helpers() {
        let sample = Sample::new(1, 44123, flags::NEW);
        assert!(sample.is_new());
        assert!(!sample.is_alert());
        assert!((sample.temp_celsius() - 44.123).abs() < 1e-9);
    }
}
