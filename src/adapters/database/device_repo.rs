use crate::adapters::database::DbPool;
use crate::domain::{Destination, DeviceCapability};
use crate::services::router::DeviceDirectory;
use async_trait::async_trait;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
struct CapabilityRow {
    gcm_token: Option<String>,
    pushy_token: Option<String>,
    fetches_messages: bool,
}

impl From<CapabilityRow> for DeviceCapability {
    fn from(row: CapabilityRow) -> Self {
        Self {
            gcm_token: row.gcm_token,
            pushy_token: row.pushy_token,
            fetches_messages: row.fetches_messages,
        }
    }
}

/// Device directory over the accounts database. This core only reads;
/// token registration and write-back live with the account services.
#[derive(Debug, Clone)]
pub struct DeviceRepository {
    pool: DbPool,
}

impl DeviceRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceDirectory for DeviceRepository {
    async fn capability(&self, destination: &Destination) -> anyhow::Result<Option<DeviceCapability>> {
        let row = sqlx::query_as::<_, CapabilityRow>(
            "SELECT gcm_token, pushy_token, fetches_messages \
             FROM devices WHERE account_id = $1 AND device_id = $2",
        )
        .bind(destination.account_id)
        .bind(i64::from(destination.device_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DeviceCapability::from))
    }
}
