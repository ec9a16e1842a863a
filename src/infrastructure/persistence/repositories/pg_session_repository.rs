use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, SessionRepository};
use crate::domain::{CandidateId, CatalogId, Session, SessionId, SessionStatus};
use crate::infrastructure::persistence::pg_error::map_sqlx_error;

const SESSION_COLUMNS: &str = "id, candidate_id, candidate_name, prior_field, target_role, \
     organization, resume_id, catalog_id, status, current_stage, created_at, started_at, \
     completed_at";

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &PgRow) -> Result<Session, RepositoryError> {
    let corrupt = |e: sqlx::Error| RepositoryError::Corrupt(e.to_string());

    let catalog_id = row
        .try_get::<String, _>("catalog_id")
        .map_err(corrupt)?
        .parse::<CatalogId>()
        .map_err(RepositoryError::Corrupt)?;
    let status = row
        .try_get::<String, _>("status")
        .map_err(corrupt)?
        .parse::<SessionStatus>()
        .map_err(RepositoryError::Corrupt)?;

    Ok(Session {
        id: SessionId::from_uuid(row.try_get("id").map_err(corrupt)?),
        candidate_id: CandidateId::from_uuid(row.try_get("candidate_id").map_err(corrupt)?),
        candidate_name: row.try_get("candidate_name").map_err(corrupt)?,
        prior_field: row.try_get("prior_field").map_err(corrupt)?,
        target_role: row.try_get("target_role").map_err(corrupt)?,
        organization: row.try_get("organization").map_err(corrupt)?,
        resume_id: row.try_get("resume_id").map_err(corrupt)?,
        catalog_id,
        status,
        current_stage: row.try_get("current_stage").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        started_at: row.try_get("started_at").map_err(corrupt)?,
        completed_at: row.try_get("completed_at").map_err(corrupt)?,
    })
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, candidate_id, candidate_name, prior_field, target_role,
                                  organization, resume_id, catalog_id, status, current_stage,
                                  created_at, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.candidate_id.as_uuid())
        .bind(&session.candidate_name)
        .bind(&session.prior_field)
        .bind(&session.target_role)
        .bind(&session.organization)
        .bind(session.resume_id)
        .bind(session.catalog_id.as_str())
        .bind(session.status.as_str())
        .bind(&session.current_stage)
        .bind(session.created_at)
        .bind(session.started_at)
        .bind(session.completed_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(session_from_row).transpose()
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn mark_live(&self, id: SessionId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET status = 'live', started_at = $2
            WHERE id = $1 AND status = 'scheduled'
            "#,
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn mark_completed(
        &self,
        id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET status = 'completed', completed_at = $2
            WHERE id = $1 AND status <> 'completed'
            "#,
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }
}
