//! Platform settings port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::settings::PlatformSettings;

/// Source of the current money settings.
///
/// Handlers read this at the start of every operation, so an operator
/// update is seen by the next operation without a restart.
#[async_trait]
pub trait PlatformSettingsSource: Send + Sync {
    async fn current(&self) -> Result<PlatformSettings, DomainError>;
}
