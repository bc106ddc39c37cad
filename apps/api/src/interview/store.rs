use async_trait::async_trait;
use redis::Client as RedisClient;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::reducer::InterviewState;

/// Snapshot storage for per-candidate interview state.
#[async_trait]
pub trait InterviewStateStore: Send + Sync {
    async fn load(&self, candidate_id: Uuid) -> Result<Option<InterviewState>, AppError>;
    async fn save(&self, candidate_id: Uuid, state: &InterviewState) -> Result<(), AppError>;
    async fn delete(&self, candidate_id: Uuid) -> Result<(), AppError>;
}

fn state_key(candidate_id: Uuid) -> String {
    format!("interview:state:{candidate_id}")
}

/// JSON snapshots under `interview:state:{candidate_id}`, refreshed with a TTL on every write.
pub struct RedisStateStore {
    client: RedisClient,
    ttl_secs: u64,
}

impl RedisStateStore {
    pub fn new(client: RedisClient, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

#[async_trait]
impl InterviewStateStore for RedisStateStore {
    async fn load(&self, candidate_id: Uuid) -> Result<Option<InterviewState>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(state_key(candidate_id))
            .query_async(&mut conn)
            .await?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt interview state: {e}")))
    }

    async fn save(&self, candidate_id: Uuid, state: &InterviewState) -> Result<(), AppError> {
        let json = serde_json::to_string(state)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode interview state: {e}")))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SETEX")
            .arg(state_key(candidate_id))
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, candidate_id: Uuid) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("DEL")
            .arg(state_key(candidate_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
