//! Multi-Instance Device Registry

use crate::device::DeviceContext;
use crate::error::DeviceError;
use crate::platform::PlatformData;
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Maximum number of concurrently attached instances
pub const MAX_DEVICES: usize = 10;

/// Attached device instances, keyed by device name
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<BTreeMap<String, Arc<DeviceContext>>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create, arm and register a new instance
    pub async fn attach(&self, platform: &PlatformData) -> Result<Arc<DeviceContext>> {
        let mut devices = self.devices.write().await;
        if devices.len() >= MAX_DEVICES {
            return Err(DeviceError::ResourceExhausted(format!(
                "at most {} devices can be attached",
                MAX_DEVICES
            )));
        }

        let device = Arc::new(DeviceContext::attach(platform)?);
        devices.insert(device.name().to_string(), device.clone());
        info!(device = %device.name(), total = devices.len(), "Device registered");
        Ok(device)
    }

    /// Look up an attached instance
    pub async fn get(&self, name: &str) -> Option<Arc<DeviceContext>> {
        self.devices.read().await.get(name).cloned()
    }

    /// Names of attached instances
    pub async fn names(&self) -> Vec<String> {
        self.devices.read().await.keys().cloned().collect()
    }

    /// Number of attached instances
    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    /// Tear an instance down and unregister it
    ///
    /// The generator is joined before the entry is removed.
    pub async fn detach(&self, name: &str) -> Result<()> {
        let mut devices = self.devices.write().await;
        let device = devices
            .get(name)
            .cloned()
            .ok_or_else(|| DeviceError::InvalidArgument(format!("no device named {:?}", name)))?;

        let result = device.shutdown().await;
        devices.remove(name);
        info!(device = %name, total = devices.len(), "Device unregistered");
        result
    }

    /// Detach every instance, returning the first error
    pub async fn detach_all(&self) -> Result<()> {
        let mut first_error = None;
        for name in self.names().await {
            if let Err(e) = self.detach(&name).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceState;

    #[tokio::test(start_paused = true)]
    async fn test_attach_and_detach() {
        let registry = DeviceRegistry::new();
        let a = registry.attach(&PlatformData::default()).await.unwrap();
        let b = registry.attach(&PlatformData::default()).await.unwrap();

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(a.name()).await.is_some());
        assert_ne!(a.name(), b.name());

        registry.detach(a.name()).await.unwrap();
        assert_eq!(a.state(), DeviceState::Destroyed);
        assert!(registry.get(a.name()).await.is_none());
        assert_eq!(b.state(), DeviceState::Armed);

        registry.detach_all().await.unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_unknown_name() {
        let registry = DeviceRegistry::new();
        assert!(matches!(
            registry.detach("simtemp-missing").await,
            Err(DeviceError::InvalidArgument(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_limit() {
        let registry = DeviceRegistry::new();
        for _ in 0..MAX_DEVICES {
            registry.attach(&PlatformData::default()).await.unwrap();
        }

        assert!(matches!(
            registry.attach(&PlatformData::default()).await,
            Err(DeviceError::ResourceExhausted(_))
        ));
        registry.detach_all().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attach_registers_nothing() {
        let registry = DeviceRegistry::new();
        let platform = PlatformData {
            sampling_ms: Some(0),
            ..Default::default()
        };

        assert!(registry.attach(&platform).await.is_err());
        assert!(registry.is_empty().await);
    }
}
