//! Redis Manager - Centralized Redis connection and operations
//!
//! This module handles all Redis-related operations including:
//! - Job queue operations (BLPOP)
//! - Result delivery (RPUSH, read by the submitter with BLPOP)
//! - Progress publishing

use std::time::Duration;

use anyhow::{Context, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{info, warn};

use crate::jobs::run::{ProgressEvent, RunJobResult};
use crate::jobs::WorkerJob;

/// Redis key constants
pub mod keys {
    /// Run job queue key
    pub const RUN_QUEUE: &str = "runner:queue";

    /// Run result key prefix, followed by the submission id
    pub const RUN_RESULT_PREFIX: &str = "runner:result:";

    /// Progress channel (for pub/sub)
    pub const RUN_PROGRESS_CHANNEL: &str = "runner:progress";
}

/// Results left unread expire after 5 minutes
const RESULT_EXPIRY_SECS: i64 = 300;

/// Centralized Redis manager for all Redis operations
pub struct RedisManager {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisManager {
    /// Connect to Redis at `redis_url`, retrying until it is reachable
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = get_connection_with_retry(&client).await?;
        info!("Connected to Redis at {}", redis_url);

        Ok(Self { client, conn })
    }

    /// Block and wait for the next job from the queue.
    ///
    /// This uses BLPOP to efficiently wait for jobs without polling.
    /// Automatically reconnects on connection failure; malformed jobs are
    /// logged and skipped.
    pub async fn pop_job(&mut self) -> Result<WorkerJob> {
        loop {
            let result: Option<(String, String)> =
                match self.conn.blpop(keys::RUN_QUEUE, 0.0).await {
                    Ok(res) => res,
                    Err(e) => {
                        warn!("Redis BLPOP failed: {}. Reconnecting...", e);
                        self.reconnect().await?;
                        continue;
                    }
                };

            if let Some((_, job_data)) = result {
                match serde_json::from_str::<WorkerJob>(&job_data) {
                    Ok(job) => return Ok(job),
                    Err(e) => {
                        warn!("Failed to parse job data: {}. Data: {}", e, job_data);
                        continue;
                    }
                }
            }
        }
    }

    /// Push a run result for the submitter.
    ///
    /// The submitter waits on the key with BLPOP, so the result is pushed to
    /// a list that expires if nobody picks it up.
    pub async fn push_result(&mut self, result: &RunJobResult) -> Result<()> {
        let key = format!("{}{}", keys::RUN_RESULT_PREFIX, result.submission_id);
        let json = serde_json::to_string(result)?;

        if let Err(e) = self.conn.rpush::<_, _, ()>(&key, &json).await {
            warn!("Failed to push run result: {}. Reconnecting...", e);
            self.reconnect().await?;
            self.conn.rpush::<_, _, ()>(&key, &json).await?;
        }

        // Ignore errors - the list is consumed by BLPOP anyway
        let _ = self.conn.expire::<_, ()>(&key, RESULT_EXPIRY_SECS).await;

        Ok(())
    }

    /// Publish a progress event
    pub async fn publish_progress(&mut self, event: &ProgressEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;

        // Ignore errors - progress updates are non-critical
        let _ = self
            .conn
            .publish::<_, _, ()>(keys::RUN_PROGRESS_CHANNEL, &json)
            .await;

        Ok(())
    }

    /// Reconnect to Redis
    async fn reconnect(&mut self) -> Result<()> {
        self.conn = get_connection_with_retry(&self.client).await?;
        Ok(())
    }
}

/// Get a Redis connection with retry logic
async fn get_connection_with_retry(client: &redis::Client) -> Result<MultiplexedConnection> {
    loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                warn!(
                    "Failed to connect to Redis: {}. Retrying in 3 seconds...",
                    e
                );
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
    }
}
