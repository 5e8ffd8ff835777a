//! Consumer Interface

use crate::channel::DataChannel;
use crate::error::DeviceError;
use crate::readiness::{Interest, Readiness};
use crate::Result;
use ring_buffer::{Sample, RECORD_SIZE};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Options for opening a reader, modelled on file open flags
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    write: bool,
    nonblocking: bool,
}

impl OpenOptions {
    /// Read-only, blocking
    pub fn new() -> Self {
        Self::default()
    }

    /// Request write access (always refused by the device)
    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Make `read` return `WouldBlock` instead of waiting
    pub fn nonblocking(mut self, nonblocking: bool) -> Self {
        self.nonblocking = nonblocking;
        self
    }

    pub fn is_write(&self) -> bool {
        self.write
    }

    pub fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }
}

/// An open handle on a device's sample stream
///
/// Any number of readers may share one device; each sample is delivered to
/// exactly one of them. Consumption is a single critical section on the data
/// lock, so cancelling a read (dropping its future) never loses a sample.
pub struct SensorReader {
    device: String,
    data: Arc<DataChannel>,
    nonblocking: bool,
}

impl SensorReader {
    pub(crate) fn new(device: String, data: Arc<DataChannel>, nonblocking: bool) -> Self {
        Self {
            device,
            data,
            nonblocking,
        }
    }

    /// Name of the device this reader is attached to
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }

    /// Read one sample using the mode chosen at open time
    pub async fn read(&self) -> Result<Sample> {
        if self.nonblocking {
            self.try_read()
        } else {
            self.read_blocking().await
        }
    }

    /// Read one sample without waiting
    ///
    /// Returns `WouldBlock` when empty, or `Cancelled` once the device has
    /// been detached and drained.
    pub fn try_read(&self) -> Result<Sample> {
        match self.data.try_take() {
            Some(sample) => {
                debug!(device = %self.device, temp_mc = sample.temp_mc, "Read succeeded");
                Ok(sample)
            }
            None if self.data.is_closed() => Err(DeviceError::Cancelled),
            None => Err(DeviceError::WouldBlock),
        }
    }

    /// Wait until a sample is available and consume it
    pub async fn read_blocking(&self) -> Result<Sample> {
        loop {
            let notified = self.data.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_read() {
                Err(DeviceError::WouldBlock) => notified.await,
                result => return result,
            }
        }
    }

    /// Read one sample, giving up with `Cancelled` when `cancel` resolves first
    pub async fn read_or_cancel<F>(&self, cancel: F) -> Result<Sample>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => Err(DeviceError::Cancelled),
            result = self.read() => result,
        }
    }

    /// Read one sample as its 16-byte record
    pub async fn read_record(&self) -> Result<[u8; RECORD_SIZE]> {
        self.read().await.map(|sample| sample.encode())
    }

    /// Read one record into `buf`, returning the bytes written
    ///
    /// A buffer shorter than one record is a `Fault`; it is detected before
    /// anything is consumed.
    pub async fn read_into(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < RECORD_SIZE {
            return Err(DeviceError::Fault(format!(
                "buffer of {} bytes cannot hold a {}-byte record",
                buf.len(),
                RECORD_SIZE
            )));
        }

        let record = self.read_record().await?;
        buf[..RECORD_SIZE].copy_from_slice(&record);
        Ok(RECORD_SIZE)
    }

    /// Writing is never permitted
    pub fn write(&self, _buf: &[u8]) -> Result<usize> {
        warn!(device = %self.device, "Write operation not permitted");
        Err(DeviceError::NotPermitted("device is read-only"))
    }

    /// Current readiness without consuming anything
    pub fn poll(&self) -> Readiness {
        self.data.readiness()
    }

    /// Wait until `interest` is satisfied or `timeout` elapses
    ///
    /// On timeout the current readiness is returned, which does not satisfy
    /// `interest`. Returns `Cancelled` if the device is detached while waiting.
    pub async fn wait_ready(&self, interest: Interest, timeout: Option<Duration>) -> Result<Readiness> {
        let wait = async {
            loop {
                let notified = self.data.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                let readiness = self.poll();
                if interest.is_satisfied_by(readiness) {
                    return Ok(readiness);
                }
                if self.data.is_closed() {
                    return Err(DeviceError::Cancelled);
                }
                notified.await;
            }
        };

        match timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => Ok(self.poll()),
            },
            None => wait.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring_buffer::flags;
    use sampler::SamplePublisher;

    fn reader(nonblocking: bool) -> (Arc<DataChannel>, SensorReader) {
        let data = Arc::new(DataChannel::new(4));
        let reader = SensorReader::new("simtemp-test".to_string(), data.clone(), nonblocking);
        (data, reader)
    }

    fn sample(temp_mc: i32, alert: bool) -> Sample {
        let flags = if alert {
            flags::NEW | flags::THRESHOLD_CROSSED
        } else {
            flags::NEW
        };
        Sample::new(temp_mc as u64, temp_mc, flags)
    }

    #[tokio::test]
    async fn test_nonblocking_read_on_empty() {
        let (data, reader) = reader(true);
        assert_eq!(reader.read().await, Err(DeviceError::WouldBlock));

        data.publish(sample(1, false));
        assert_eq!(reader.read().await, Ok(sample(1, false)));
        assert_eq!(reader.read().await, Err(DeviceError::WouldBlock));
    }

    #[tokio::test]
    async fn test_blocking_read_wakes_on_publish() {
        let (data, reader) = reader(false);

        let producer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            data.publish(sample(7, false));
        });

        assert_eq!(reader.read().await, Ok(sample(7, false)));
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_read_consumes_nothing() {
        let (data, reader) = reader(false);

        let result = reader.read_or_cancel(async {}).await;
        assert_eq!(result, Err(DeviceError::Cancelled));

        data.publish(sample(3, false));
        let result = reader.read_or_cancel(std::future::ready(())).await;
        assert_eq!(result, Err(DeviceError::Cancelled));
        assert_eq!(data.len(), 1);

        assert_eq!(reader.read_or_cancel(std::future::pending()).await, Ok(sample(3, false)));
    }

    #[tokio::test]
    async fn test_write_is_rejected_without_effect() {
        let (data, reader) = reader(false);
        data.publish(sample(1, true));

        assert!(matches!(reader.write(&[0u8; 16]), Err(DeviceError::NotPermitted(_))));
        assert_eq!(data.len(), 1);
        assert_eq!(reader.poll(), Readiness::READABLE | Readiness::ALERT);
    }

    #[tokio::test]
    async fn test_poll_alert_then_read_same_sample() {
        let (data, reader) = reader(true);
        data.publish(sample(50_000, true));

        assert!(reader.poll().is_alert());
        assert!(reader.poll().is_alert());
        assert_eq!(reader.read().await, Ok(sample(50_000, true)));
        assert!(reader.poll().is_empty());
    }

    #[tokio::test]
    async fn test_read_into_rejects_short_buffer() {
        let (data, reader) = reader(true);
        data.publish(sample(9, false));

        let mut short = [0u8; 8];
        assert!(matches!(reader.read_into(&mut short).await, Err(DeviceError::Fault(_))));
        assert_eq!(data.len(), 1);

        let mut buf = [0u8; 32];
        assert_eq!(reader.read_into(&mut buf).await, Ok(RECORD_SIZE));
        assert_eq!(Sample::decode(&buf[..RECORD_SIZE]), Ok(sample(9, false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ready_timeout() {
        let (data, reader) = reader(false);
        data.publish(sample(1, false));

        let readiness = reader
            .wait_ready(Interest::Alert, Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(readiness, Readiness::READABLE);

        let readiness = reader
            .wait_ready(Interest::Readable, Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(readiness.is_readable());
    }

    #[tokio::test]
    async fn test_close_releases_blocked_readers() {
        let (data, reader) = reader(false);

        let waiter = tokio::spawn(async move {
            (
                reader.read().await,
                reader.wait_ready(Interest::Readable, None).await,
            )
        });
        tokio::task::yield_now().await;
        data.close();

        let (read, ready) = waiter.await.unwrap();
        assert_eq!(read, Err(DeviceError::Cancelled));
        assert_eq!(ready, Err(DeviceError::Cancelled));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_missed_wakeups_under_contention() {
        const READERS: usize = 4;
        const PER_READER: usize = 250;

        let data = Arc::new(DataChannel::new(4));
        let mut consumers = Vec::new();
        for i in 0..READERS {
            let reader = SensorReader::new(format!("reader-{}", i), data.clone(), false);
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::with_capacity(PER_READER);
                for _ in 0..PER_READER {
                    seen.push(reader.read().await.unwrap().timestamp_ns);
                }
                seen
            }));
        }

        // Publish one sample at a time and wait for it to be taken, so the
        // ring never overflows and every sample must reach a reader.
        for n in 0..(READERS * PER_READER) as u64 {
            data.publish(Sample::new(n, 0, flags::NEW));
            while !data.is_empty() {
                tokio::task::yield_now().await;
            }
        }

        let mut all = Vec::new();
        for consumer in consumers {
            let seen = consumer.await.unwrap();
            assert!(seen.windows(2).all(|w| w[0] < w[1]));
            all.extend(seen);
        }
        all.sort_unstable();
        assert_eq!(all, (0..(READERS * PER_READER) as u64).collect::<Vec<_>>());
    }
}
