//! Device Context Lifecycle

use crate::channel::DataChannel;
use crate::error::DeviceError;
use crate::platform::PlatformData;
use crate::reader::{OpenOptions, SensorReader};
use crate::Result;
use ring_buffer::DEFAULT_CAPACITY;
use sampler::{
    arm, validate_interval, ConfigStore, Configuration, EntropySource, Generator, OsEntropy,
    SampleMode, Stats, TaskHandle, TemperatureModel,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Process-wide counter used only to assign instance identifiers
static NEXT_INSTANCE_ID: AtomicU32 = AtomicU32::new(0);

/// Device node name for an instance id: `simtemp`, `simtemp-1`, ...
pub fn device_name(id: u32) -> String {
    if id == 0 {
        "simtemp".to_string()
    } else {
        format!("simtemp-{}", id)
    }
}

/// Lifecycle state of a device instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// State allocated, generator not scheduled
    Created,
    /// Generator scheduled
    Armed,
    /// Generator could not be (re)armed; instance must be torn down
    Failed,
    /// Teardown in progress
    TearingDown,
    /// Generator joined and readers released
    Destroyed,
}

enum GeneratorSlot<E> {
    Armed(TaskHandle<E, DataChannel>),
    /// Generator lost; the error is reported again at teardown
    Failed(DeviceError),
    Stopped,
}

/// One simulated sensor instance
///
/// Owns the config lock domain ([`ConfigStore`]), the data lock domain
/// ([`DataChannel`]) and the generator slot. The slot is an async lock held
/// across cancel-join and re-arm, which serialises interval changes and
/// teardown against each other.
pub struct DeviceContext<E = OsEntropy> {
    id: u32,
    name: String,
    config: Arc<ConfigStore>,
    data: Arc<DataChannel>,
    slot: tokio::sync::Mutex<GeneratorSlot<E>>,
    state: parking_lot::Mutex<DeviceState>,
}

impl DeviceContext<OsEntropy> {
    /// Create an instance seeded from OS entropy and arm its generator
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(platform: &PlatformData) -> Result<Self> {
        Self::attach_with(platform, TemperatureModel::new(OsEntropy::new()))
    }
}

impl<E: EntropySource> DeviceContext<E> {
    /// Create an instance with a caller-supplied temperature model
    ///
    /// On error nothing is left running and no instance id is consumed.
    pub fn attach_with(platform: &PlatformData, model: TemperatureModel<E>) -> Result<Self> {
        let initial = platform.resolve();
        let config = Arc::new(ConfigStore::new(initial)?);
        let data = Arc::new(DataChannel::new(DEFAULT_CAPACITY));

        let generator = Generator::new(config.clone(), data.clone(), model);
        let handle = arm(generator, initial.interval()).map_err(|e| {
            error!("Schedule of sample generator failed: {}", e);
            DeviceError::from(e)
        })?;

        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        let name = device_name(id);
        info!(
            device = %name,
            sampling_ms = initial.interval_ms,
            threshold_mc = initial.threshold_mc,
            mode = %initial.mode,
            "Device attached"
        );

        Ok(Self {
            id,
            name,
            config,
            data,
            slot: tokio::sync::Mutex::new(GeneratorSlot::Armed(handle)),
            state: parking_lot::Mutex::new(DeviceState::Armed),
        })
    }

    /// Instance identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Device node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        *self.state.lock()
    }

    fn set_state(&self, state: DeviceState) {
        *self.state.lock() = state;
    }

    /// Snapshot of the configuration
    pub fn config(&self) -> Configuration {
        self.config.snapshot()
    }

    /// Snapshot of the statistics counters
    pub fn stats(&self) -> Stats {
        self.config.stats()
    }

    /// Number of samples waiting to be read
    pub fn pending(&self) -> usize {
        self.data.len()
    }

    /// Change the sampling interval
    ///
    /// The pending tick is cancelled (and an in-flight one joined) before the
    /// new interval is written, then the generator is re-armed to fire
    /// `interval_ms` from now. The handle stays in the slot until the join
    /// completes, so dropping this future part way leaves the instance in
    /// `Created` with the generator stopped; the next `set_interval` or
    /// `shutdown` picks up from there. A lost generator leaves the instance
    /// `Failed`.
    pub async fn set_interval(&self, interval_ms: u32) -> Result<()> {
        validate_interval(interval_ms)?;

        let mut slot = self.slot.lock().await;
        let joined = match &mut *slot {
            GeneratorSlot::Armed(_) if self.state() == DeviceState::TearingDown => {
                return Err(DeviceError::NotPermitted("device is detached"));
            }
            GeneratorSlot::Armed(handle) => {
                self.set_state(DeviceState::Created);
                handle.cancel().await
            }
            GeneratorSlot::Failed(e) => return Err(e.clone()),
            GeneratorSlot::Stopped => {
                return Err(DeviceError::NotPermitted("device is detached"));
            }
        };

        let generator = match joined {
            Ok(generator) => generator,
            Err(e) => {
                error!(device = %self.name, "Generator lost during reconfiguration: {}", e);
                return Err(self.fail(&mut slot, e.into()));
            }
        };

        // Already validated, so this write cannot be rejected
        let written = self.config.write_interval(interval_ms);

        match arm(generator, self.config.snapshot().interval()) {
            Ok(handle) => {
                *slot = GeneratorSlot::Armed(handle);
                self.set_state(DeviceState::Armed);
                info!(device = %self.name, interval_ms, "Generator rescheduled");
                written.map_err(DeviceError::from)
            }
            Err(e) => {
                error!(device = %self.name, "Re-arming generator failed: {}", e);
                Err(self.fail(&mut slot, e.into()))
            }
        }
    }

    fn fail(&self, slot: &mut GeneratorSlot<E>, error: DeviceError) -> DeviceError {
        *slot = GeneratorSlot::Failed(error.clone());
        self.set_state(DeviceState::Failed);
        error
    }

    /// Change the alert threshold; applies from the next tick
    pub fn set_threshold(&self, threshold_mc: i32) {
        self.config.set_threshold(threshold_mc);
    }

    /// Change the sampling mode
    pub fn set_mode(&self, mode: SampleMode) {
        self.config.set_mode(mode);
    }

    /// Change the sampling mode by name (`normal|noisy|ramp`, exact match)
    pub fn set_mode_str(&self, name: &str) -> Result<SampleMode> {
        Ok(self.config.set_mode_str(name)?)
    }

    /// Open a reader on this device
    ///
    /// The interface is read-only: requesting write access is rejected.
    pub fn open(&self, options: OpenOptions) -> Result<SensorReader> {
        if options.is_write() {
            warn!(device = %self.name, "Open was unsuccessful (write not permitted)");
            return Err(DeviceError::NotPermitted("device is read-only"));
        }
        if self.data.is_closed() {
            return Err(DeviceError::Cancelled);
        }

        Ok(SensorReader::new(
            self.name.clone(),
            self.data.clone(),
            options.is_nonblocking(),
        ))
    }

    /// Tear the instance down
    ///
    /// Stops the generator, dropping a tick that is still waiting for
    /// entropy, then closes the data channel so blocked readers return
    /// `Cancelled`. A generator lost earlier is reported here after teardown
    /// completes. Calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if self.state() == DeviceState::Destroyed {
            return Ok(());
        }

        self.set_state(DeviceState::TearingDown);
        let joined = match &mut *slot {
            GeneratorSlot::Armed(handle) => handle
                .interrupt()
                .await
                .map(|_| ())
                .map_err(DeviceError::from),
            GeneratorSlot::Failed(e) => Err(e.clone()),
            GeneratorSlot::Stopped => Ok(()),
        };
        *slot = GeneratorSlot::Stopped;

        self.data.close();
        self.set_state(DeviceState::Destroyed);

        let stats = self.config.stats();
        info!(device = %self.name, %stats, "Device removed");
        joined.map_err(|e| {
            error!(device = %self.name, "Generator terminated abnormally: {}", e);
            e
        })
    }
}

impl<E> Drop for DeviceContext<E> {
    fn drop(&mut self) {
        match self.slot.get_mut() {
            GeneratorSlot::Armed(handle) => {
                warn!(device = %self.name, "Device dropped without shutdown, aborting generator");
                handle.abort();
            }
            GeneratorSlot::Failed(_) => {}
            GeneratorSlot::Stopped => return,
        }
        self.data.close();
    }
}
