//! Sample Generator and Periodic Task

use crate::config::ConfigStore;
use crate::entropy::EntropySource;
use crate::error::SchedulerError;
use crate::model::TemperatureModel;
use ring_buffer::Sample;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Destination of produced samples
///
/// `publish` must commit the sample under the data lock and then wake every
/// waiter. It is called without the config lock held.
pub trait SamplePublisher: Send + Sync + 'static {
    /// Store a sample and notify readers
    fn publish(&self, sample: Sample);
}

/// Per-instance sample generator
///
/// Owns the generator-local temperature state. Ticks are never run
/// concurrently: the generator is moved into its task when armed and handed
/// back when the task is cancelled.
pub struct Generator<E, P> {
    config: Arc<ConfigStore>,
    publisher: Arc<P>,
    model: TemperatureModel<E>,
    ticks: u64,
}

impl<E: EntropySource, P: SamplePublisher> Generator<E, P> {
    /// Create a new generator
    pub fn new(config: Arc<ConfigStore>, publisher: Arc<P>, model: TemperatureModel<E>) -> Self {
        Self {
            config,
            publisher,
            model,
            ticks: 0,
        }
    }

    /// Number of ticks completed by this generator
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Read the configuration and compute the next temperature
    ///
    /// Returns the temperature and the interval read at the start of the
    /// tick. No shared state is modified, so dropping this future part way
    /// (e.g. while stalled on entropy) leaves nothing half done.
    async fn measure(&mut self) -> (i32, Duration) {
        let config = self.config.snapshot();
        let temp_mc = self.model.next(config.mode).await;
        (temp_mc, config.interval())
    }

    /// Classify, account and publish a measured temperature
    fn commit(&mut self, temp_mc: i32) -> Sample {
        let flags = self.config.record_reading(temp_mc);
        let sample = Sample::new(now_ns(), temp_mc, flags);

        self.publisher.publish(sample);
        self.ticks += 1;
        sample
    }

}

/// Handle to an armed generator task
///
/// Joining borrows the handle, so a join whose future is dropped can be
/// resumed by calling [`cancel`](Self::cancel) again. Once a join has
/// returned the handle is spent and must be discarded.
pub struct TaskHandle<E, P> {
    stop: Option<oneshot::Sender<()>>,
    interrupt: Option<oneshot::Sender<()>>,
    join: JoinHandle<Generator<E, P>>,
}

impl<E, P> TaskHandle<E, P> {
    /// Stop the task and wait for any in-flight tick to finish
    ///
    /// A tick that has already left its sleep is measured, accounted and
    /// published before the task exits. Returns the generator so it can be
    /// re-armed with its state intact.
    pub async fn cancel(&mut self) -> Result<Generator<E, P>, SchedulerError> {
        if let Some(stop) = self.stop.take() {
            // The task may already have exited; the join below is what matters.
            let _ = stop.send(());
        }
        (&mut self.join)
            .await
            .map_err(|e| SchedulerError::TickPanicked(e.to_string()))
    }

    /// Stop the task, dropping a tick that is still waiting for entropy
    ///
    /// A tick past its entropy wait is committed synchronously, so it is
    /// either fully applied or not applied at all.
    pub async fn interrupt(&mut self) -> Result<Generator<E, P>, SchedulerError> {
        if let Some(interrupt) = self.interrupt.take() {
            let _ = interrupt.send(());
        }
        self.cancel().await
    }

    /// True once the task has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Abort the task without waiting
    pub fn abort(&self) {
        self.join.abort();
    }
}

/// Arm a generator to fire after `delay` and then every configured interval
///
/// Fails with [`SchedulerError::NoRuntime`] outside a tokio runtime; the
/// generator is dropped in that case.
pub fn arm<E, P>(generator: Generator<E, P>, delay: Duration) -> Result<TaskHandle<E, P>, SchedulerError>
where
    E: EntropySource,
    P: SamplePublisher,
{
    let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
    let (stop_tx, stop_rx) = oneshot::channel();
    let (interrupt_tx, interrupt_rx) = oneshot::channel();

    info!(delay_ms = delay.as_millis() as u64, "Arming sample generator");
    let join = runtime.spawn(run(generator, delay, stop_rx, interrupt_rx));

    Ok(TaskHandle {
        stop: Some(stop_tx),
        interrupt: Some(interrupt_tx),
        join,
    })
}

async fn run<E, P>(
    mut generator: Generator<E, P>,
    mut delay: Duration,
    mut stop: oneshot::Receiver<()>,
    mut interrupt: oneshot::Receiver<()>,
) -> Generator<E, P>
where
    E: EntropySource,
    P: SamplePublisher,
{
    loop {
        tokio::select! {
            biased;
            _ = &mut interrupt => break,
            _ = &mut stop => break,
            _ = tokio::time::sleep(delay) => {}
        }

        // Past this point only an interrupt ends the tick early
        let (temp_mc, next) = tokio::select! {
            biased;
            _ = &mut interrupt => break,
            measured = generator.measure() => measured,
        };

        let sample = generator.commit(temp_mc);
        debug!(
            temp_mc = sample.temp_mc,
            flags = sample.flags,
            tick = generator.ticks,
            next_ms = next.as_millis() as u64,
            "Tick complete"
        );
        delay = next;
    }

    info!(ticks = generator.ticks, "Sample generator stopped");
    generator
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
