//! Asynchronous AI enhancement jobs.
//!
//! Tailoring dispatches an `EnhancementJob` for an external worker and returns the
//! keyword fallback immediately. The worker reports back through the job webhook; callers
//! that want to block can use `wait_for_job`, which is bounded by a timeout and
//! distinguishes "timed out" from "failed".

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;

const QUEUE_KEY: &str = "coach:enhancement:queue";
const JOB_KEY_PREFIX: &str = "coach:enhancement:job:";
const USER_JOBS_KEY_PREFIX: &str = "coach:enhancement:user:";
/// Job records expire after a day.
const JOB_TTL_SECS: u64 = 24 * 60 * 60;

/// Payload pushed to the worker queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_description: String,
    /// The keyword-tailored fallback the worker starts from.
    pub resume: ResumeDocument,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed { resume: ResumeDocument },
    Failed { error: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

/// Port to the queue the external AI worker consumes.
#[async_trait]
pub trait EnhancementQueue: Send + Sync {
    /// Enqueues `job` and records it as pending.
    async fn dispatch(&self, job: &EnhancementJob) -> Result<(), AppError>;

    /// Stores `record` only if job `record.id` is still pending. Returns whether it was
    /// stored; the check and the write are atomic.
    async fn finish(&self, record: &JobRecord) -> Result<bool, AppError>;

    /// Fails every pending job of `user_id` with `reason`. Returns how many were failed.
    async fn cancel_pending(&self, user_id: Uuid, reason: &str) -> Result<usize, AppError>;

    async fn fetch(&self, id: Uuid) -> Result<Option<JobRecord>, AppError>;
}

fn failed_record(pending: &JobRecord, reason: &str) -> JobRecord {
    JobRecord {
        id: pending.id,
        user_id: pending.user_id,
        status: JobStatus::Failed {
            error: reason.to_string(),
        },
        updated_at: Utc::now(),
    }
}

fn pending_record(job: &EnhancementJob) -> JobRecord {
    JobRecord {
        id: job.id,
        user_id: job.user_id,
        status: JobStatus::Pending,
        updated_at: job.requested_at,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis backend
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisEnhancementQueue {
    client: redis::Client,
}

impl RedisEnhancementQueue {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn job_key(id: Uuid) -> String {
        format!("{JOB_KEY_PREFIX}{id}")
    }

    fn user_jobs_key(user_id: Uuid) -> String {
        format!("{USER_JOBS_KEY_PREFIX}{user_id}")
    }
}

/// Compare-and-set: overwrite KEYS[1] with ARGV[1] (TTL ARGV[2]) only while its status is
/// pending. Returns 1 when written.
const FINISH_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return 0 end
local ok, current = pcall(cjson.decode, raw)
if not ok or current['status'] ~= 'pending' then return 0 end
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
return 1
"#;

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize job: {e}")))
}

#[async_trait]
impl EnhancementQueue for RedisEnhancementQueue {
    async fn dispatch(&self, job: &EnhancementJob) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let record = to_json(&pending_record(job))?;
        let payload = to_json(job)?;

        conn.set_ex::<_, _, ()>(Self::job_key(job.id), record, JOB_TTL_SECS)
            .await?;
        conn.sadd::<_, _, ()>(Self::user_jobs_key(job.user_id), job.id.to_string())
            .await?;
        conn.expire::<_, ()>(Self::user_jobs_key(job.user_id), JOB_TTL_SECS as i64)
            .await?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, payload).await?;

        info!("Dispatched enhancement job {} for user {}", job.id, job.user_id);
        Ok(())
    }

    async fn finish(&self, record: &JobRecord) -> Result<bool, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let written: i64 = redis::Script::new(FINISH_SCRIPT)
            .key(Self::job_key(record.id))
            .arg(to_json(record)?)
            .arg(JOB_TTL_SECS)
            .invoke_async(&mut conn)
            .await?;
        Ok(written == 1)
    }

    async fn cancel_pending(&self, user_id: Uuid, reason: &str) -> Result<usize, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ids: Vec<String> = conn.smembers(Self::user_jobs_key(user_id)).await?;

        let mut cancelled = 0;
        for id in ids.iter().filter_map(|raw| Uuid::parse_str(raw).ok()) {
            let Some(record) = self.fetch(id).await? else {
                continue;
            };
            if !record.status.is_terminal() && self.finish(&failed_record(&record, reason)).await?
            {
                cancelled += 1;
            }
        }
        conn.del::<_, ()>(Self::user_jobs_key(user_id)).await?;
        if cancelled > 0 {
            info!("Cancelled {} pending enhancement jobs for user {}", cancelled, user_id);
        }
        Ok(cancelled)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<JobRecord>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(Self::job_key(id)).await?;
        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Corrupt job record {id}: {e}"))
            })
        })
        .transpose()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-process backend
// ────────────────────────────────────────────────────────────────────────────

/// Keeps records in memory. Dispatched jobs stay pending until a worker reports back
/// through the webhook.
#[derive(Default)]
pub struct MemoryEnhancementQueue {
    records: RwLock<HashMap<Uuid, JobRecord>>,
    dispatched: RwLock<Vec<EnhancementJob>>,
}

impl MemoryEnhancementQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs dispatched so far, oldest first.
    pub async fn dispatched(&self) -> Vec<EnhancementJob> {
        self.dispatched.read().await.clone()
    }
}

#[async_trait]
impl EnhancementQueue for MemoryEnhancementQueue {
    async fn dispatch(&self, job: &EnhancementJob) -> Result<(), AppError> {
        self.records
            .write()
            .await
            .insert(job.id, pending_record(job));
        self.dispatched.write().await.push(job.clone());
        debug!("Queued enhancement job {} in memory", job.id);
        Ok(())
    }

    async fn finish(&self, record: &JobRecord) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(current) if current.status == JobStatus::Pending => {
                *current = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_pending(&self, user_id: Uuid, reason: &str) -> Result<usize, AppError> {
        let mut records = self.records.write().await;
        let mut cancelled = 0;
        for record in records.values_mut() {
            if record.user_id == user_id && !record.status.is_terminal() {
                *record = failed_record(record, reason);
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<JobRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bounded wait
// ────────────────────────────────────────────────────────────────────────────

/// Polling schedule for `wait_for_job`: exponential backoff capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            multiplier: 2,
        }
    }
}

impl WaitPolicy {
    /// Same schedule with a different overall timeout.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        (current * self.multiplier.max(1)).min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Completed(ResumeDocument),
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Polls job `id` until it is terminal, `policy.timeout` elapses, or `cancel` resolves.
///
/// A missing record is `NotFound`; queue errors propagate.
pub async fn wait_for_job<F>(
    queue: &dyn EnhancementQueue,
    id: Uuid,
    policy: WaitPolicy,
    cancel: F,
) -> Result<WaitOutcome, AppError>
where
    F: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let deadline = Instant::now() + policy.timeout;
    let mut delay = policy.initial_delay;
    let mut polls = 0u32;

    loop {
        polls += 1;
        let record = queue
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

        match record.status {
            JobStatus::Completed { resume } => return Ok(WaitOutcome::Completed(resume)),
            JobStatus::Failed { error } => return Ok(WaitOutcome::Failed(error)),
            JobStatus::Pending => {}
        }

        let now = Instant::now();
        if now >= deadline {
            debug!("Job {id} still pending after {polls} polls, giving up");
            return Ok(WaitOutcome::TimedOut);
        }
        let sleep_for = delay.min(deadline - now);

        tokio::select! {
            _ = &mut cancel => return Ok(WaitOutcome::Cancelled),
            _ = tokio::time::sleep(sleep_for) => {}
        }
        delay = policy.next_delay(delay);
    }
}
