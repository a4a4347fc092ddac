//! Résumé persistence port. One JSON document per user id.
//!
//! `PgResumeStore` is used when `DATABASE_URL` is set; otherwise `MemoryResumeStore`.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::resume::ResumeDocument;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<ResumeDocument>>;

    /// Inserts or replaces the user's résumé.
    async fn save(&self, user_id: Uuid, resume: &ResumeDocument) -> Result<()>;

    /// Overwrites the user's résumé only if one is stored. Returns whether it was written.
    async fn replace(&self, user_id: Uuid, resume: &ResumeDocument) -> Result<bool>;

    /// Returns `true` if a résumé existed.
    async fn delete(&self, user_id: Uuid) -> Result<bool>;
}

pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    /// Wraps `pool`, creating the `resumes` table if it does not exist.
    pub async fn new(pool: PgPool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resumes (
                user_id UUID PRIMARY KEY,
                document JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&pool)
        .await?;
        info!("resumes table ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<ResumeDocument>> {
        let row: Option<(Json<ResumeDocument>,)> =
            sqlx::query_as("SELECT document FROM resumes WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(document),)| document))
    }

    async fn save(&self, user_id: Uuid, resume: &ResumeDocument) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resumes (user_id, document, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(Json(resume))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace(&self, user_id: Uuid, resume: &ResumeDocument) -> Result<bool> {
        let result =
            sqlx::query("UPDATE resumes SET document = $2, updated_at = NOW() WHERE user_id = $1")
                .bind(user_id)
                .bind(Json(resume))
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Default)]
pub struct MemoryResumeStore {
    resumes: RwLock<HashMap<Uuid, ResumeDocument>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<ResumeDocument>> {
        Ok(self.resumes.read().await.get(&user_id).cloned())
    }

    async fn save(&self, user_id: Uuid, resume: &ResumeDocument) -> Result<()> {
        self.resumes.write().await.insert(user_id, resume.clone());
        Ok(())
    }

    async fn replace(&self, user_id: Uuid, resume: &ResumeDocument) -> Result<bool> {
        match self.resumes.write().await.get_mut(&user_id) {
            Some(stored) => {
                *stored = resume.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.resumes.write().await.remove(&user_id).is_some())
    }
}
