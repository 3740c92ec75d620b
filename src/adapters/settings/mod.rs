//! In-process platform settings.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::settings::PlatformSettings;
use crate::ports::PlatformSettingsSource;

/// Settings held in memory and replaced wholesale by an operator update.
///
/// Readers always get a snapshot; a `replace` is observed by the next
/// `current()` call.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<PlatformSettings>,
}

impl SharedSettings {
    pub fn new(settings: PlatformSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub fn replace(&self, settings: PlatformSettings) {
        let mut guard = self
            .inner
            .write()
            .expect("SharedSettings: settings lock poisoned");
        tracing::info!(
            platform_cut_percent = settings.platform_cut_percent.value(),
            hold_hours = settings.hold_hours,
            "Platform settings replaced"
        );
        *guard = settings;
    }

    pub fn snapshot(&self) -> PlatformSettings {
        self.inner
            .read()
            .expect("SharedSettings: settings lock poisoned")
            .clone()
    }
}

#[async_trait]
impl PlatformSettingsSource for SharedSettings {
    async fn current(&self) -> Result<PlatformSettings, DomainError> {
        Ok(self.snapshot())
    }
}
