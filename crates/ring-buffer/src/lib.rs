//! Sample Ring Buffer
//!
//! Provides the fixed-layout temperature `Sample`, its 16-byte wire record,
//! and a small overwrite-oldest circular store. The buffer does no locking of
//! its own; callers hold their data lock around every operation sequence.

mod buffer;
mod error;
mod sample;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
pub use error::{RecordError, RingError};
pub use sample::{Sample, RECORD_SIZE};

/// Sample event flags
pub mod flags {
    /// Set on every freshly produced sample
    pub const NEW: u32 = 0x0001;
    /// Temperature was strictly above the configured threshold
    pub const THRESHOLD_CROSSED: u32 = 0x0002;
}
