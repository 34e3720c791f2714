use async_trait::async_trait;
use sqlx::PgPool;

use pipeline_core::domain::Artifact;
use pipeline_core::ports::ArtifactRepository;

use crate::models::ArtifactRow;

/// Write-once persistence adapter for [`Artifact`] against the
/// `artifacts` table.
pub struct PgArtifactRepository {
    pool: PgPool,
}

impl PgArtifactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtifactRepository for PgArtifactRepository {
    async fn create(&self, artifact: Artifact) -> anyhow::Result<Artifact> {
        let row = ArtifactRow::from(&artifact);
        sqlx::query(
            "INSERT INTO artifacts \
             (id, task_id, pipeline_run_id, step_run_id, artifact_type, status, \
              content, version, created_at, updated_at, approved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(row.id)
        .bind(row.task_id)
        .bind(row.pipeline_run_id)
        .bind(row.step_run_id)
        .bind(row.artifact_type)
        .bind(row.status)
        .bind(&row.content)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.approved_at)
        .execute(&self.pool)
        .await?;

        Ok(artifact)
    }
}
