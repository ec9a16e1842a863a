use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, TurnRepository};
use crate::domain::{
    NewTurn, ProducedQuestion, QuestionId, SessionId, Speaker, Turn, TurnId, TurnLogEntry,
};
use crate::infrastructure::persistence::pg_error::map_sqlx_error;

const TURN_COLUMNS: &str =
    "t.id, t.session_id, t.speaker, t.text, t.question_id, t.turn_order, t.insertion_id, t.created_at";

const QUESTION_COLUMNS: &str =
    "id, session_id, stage_name, content, evaluation_category, metadata, created_at";

pub struct PgTurnRepository {
    pool: PgPool,
}

impl PgTurnRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn corrupt(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Corrupt(e.to_string())
}

fn turn_from_row(row: &PgRow) -> Result<Turn, RepositoryError> {
    let speaker = row
        .try_get::<String, _>("speaker")
        .map_err(corrupt)?
        .parse::<Speaker>()
        .map_err(RepositoryError::Corrupt)?;

    Ok(Turn {
        id: TurnId::from_uuid(row.try_get("id").map_err(corrupt)?),
        session_id: SessionId::from_uuid(row.try_get("session_id").map_err(corrupt)?),
        speaker,
        text: row.try_get("text").map_err(corrupt)?,
        question_id: row
            .try_get::<Option<uuid::Uuid>, _>("question_id")
            .map_err(corrupt)?
            .map(QuestionId::from_uuid),
        order: row.try_get("turn_order").map_err(corrupt)?,
        insertion_id: row.try_get("insertion_id").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn question_from_row(row: &PgRow) -> Result<ProducedQuestion, RepositoryError> {
    Ok(ProducedQuestion {
        id: QuestionId::from_uuid(row.try_get("id").map_err(corrupt)?),
        session_id: SessionId::from_uuid(row.try_get("session_id").map_err(corrupt)?),
        stage: row.try_get("stage_name").map_err(corrupt)?,
        content: row.try_get("content").map_err(corrupt)?,
        evaluation_category: row.try_get("evaluation_category").map_err(corrupt)?,
        metadata: row.try_get("metadata").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

/// Takes the session row lock so concurrent appends get consecutive orders.
async fn lock_session(conn: &mut PgConnection, session_id: SessionId) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM sessions WHERE id = $1 FOR UPDATE")
        .bind(session_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| RepositoryError::NotFound(format!("session {}", session_id)))?;
    Ok(())
}

async fn insert_turn(conn: &mut PgConnection, turn: &NewTurn) -> Result<Turn, RepositoryError> {
    let row = sqlx::query(
        r#"
        INSERT INTO turns (id, session_id, speaker, text, question_id, turn_order, created_at)
        VALUES ($1, $2, $3, $4, $5,
                (SELECT COALESCE(MAX(turn_order), 0) + 1 FROM turns WHERE session_id = $2),
                $6)
        RETURNING turn_order, insertion_id
        "#,
    )
    .bind(turn.id.as_uuid())
    .bind(turn.session_id.as_uuid())
    .bind(turn.speaker.as_str())
    .bind(&turn.text)
    .bind(turn.question_id.map(|q| q.as_uuid()))
    .bind(turn.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let order: i64 = row.try_get("turn_order").map_err(corrupt)?;
    let insertion_id: i64 = row.try_get("insertion_id").map_err(corrupt)?;
    Ok(turn.clone().into_turn(order, insertion_id))
}

async fn insert_question(
    conn: &mut PgConnection,
    question: &ProducedQuestion,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO produced_questions (id, session_id, stage_name, content,
                                        evaluation_category, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(question.id.as_uuid())
    .bind(question.session_id.as_uuid())
    .bind(&question.stage)
    .bind(&question.content)
    .bind(&question.evaluation_category)
    .bind(&question.metadata)
    .bind(question.created_at)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

async fn set_current_stage(
    conn: &mut PgConnection,
    session_id: SessionId,
    stage: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE sessions SET current_stage = $2 WHERE id = $1")
        .bind(session_id.as_uuid())
        .bind(stage)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

#[async_trait]
impl TurnRepository for PgTurnRepository {
    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn load_log(&self, session_id: SessionId) -> Result<Vec<TurnLogEntry>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, q.stage_name
            FROM turns t
            LEFT JOIN produced_questions q ON q.id = t.question_id
            WHERE t.session_id = $1
            ORDER BY t.turn_order ASC, t.insertion_id ASC
            "#,
            TURN_COLUMNS
        ))
        .bind(session_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                Ok(TurnLogEntry {
                    turn: turn_from_row(row)?,
                    stage: row.try_get("stage_name").map_err(corrupt)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn latest_turn(&self, session_id: SessionId) -> Result<Option<Turn>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM turns t
            WHERE t.session_id = $1
            ORDER BY t.turn_order DESC, t.insertion_id DESC
            LIMIT 1
            "#,
            TURN_COLUMNS
        ))
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(turn_from_row).transpose()
    }

    async fn latest_ai_turn(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Turn>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM turns t
            WHERE t.session_id = $1 AND t.speaker = 'AI'
            ORDER BY t.turn_order DESC, t.insertion_id DESC
            LIMIT 1
            "#,
            TURN_COLUMNS
        ))
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(turn_from_row).transpose()
    }

    #[instrument(skip(self, turn), fields(session_id = %turn.session_id, speaker = %turn.speaker))]
    async fn append_turn(&self, turn: &NewTurn) -> Result<Turn, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        lock_session(&mut tx, turn.session_id).await?;
        let appended = insert_turn(&mut tx, turn).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(appended)
    }

    #[instrument(skip(self, question, turn), fields(session_id = %question.session_id, stage = %question.stage))]
    async fn append_question_turn(
        &self,
        question: &ProducedQuestion,
        turn: &NewTurn,
    ) -> Result<Turn, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        lock_session(&mut tx, question.session_id).await?;
        insert_question(&mut tx, question).await?;
        let appended = insert_turn(&mut tx, turn).await?;
        set_current_stage(&mut tx, question.session_id, &question.stage).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(appended)
    }

    #[instrument(skip(self, question, turn), fields(session_id = %question.session_id, stage = %question.stage))]
    async fn append_turn_for_question(
        &self,
        question: &ProducedQuestion,
        turn: &NewTurn,
    ) -> Result<Turn, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        lock_session(&mut tx, question.session_id).await?;
        let appended = insert_turn(&mut tx, turn).await?;
        set_current_stage(&mut tx, question.session_id, &question.stage).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(appended)
    }

    #[instrument(skip(self, question), fields(session_id = %question.session_id, stage = %question.stage))]
    async fn insert_question(&self, question: &ProducedQuestion) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        insert_question(&mut conn, question).await
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn find_question(
        &self,
        session_id: SessionId,
        stage: &str,
    ) -> Result<Option<ProducedQuestion>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM produced_questions WHERE session_id = $1 AND stage_name = $2",
            QUESTION_COLUMNS
        ))
        .bind(session_id.as_uuid())
        .bind(stage)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(question_from_row).transpose()
    }

    #[instrument(skip(self), fields(question_id = %id))]
    async fn get_question(
        &self,
        id: QuestionId,
    ) -> Result<Option<ProducedQuestion>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM produced_questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(question_from_row).transpose()
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn stage_has_turn(
        &self,
        session_id: SessionId,
        stage: &str,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM turns t
                JOIN produced_questions q ON q.id = t.question_id
                WHERE t.session_id = $1 AND t.speaker = 'AI' AND q.stage_name = $2
            ) AS asked
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(stage)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_get("asked").map_err(corrupt)
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn list_questions(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ProducedQuestion>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM produced_questions WHERE session_id = $1 ORDER BY created_at ASC",
            QUESTION_COLUMNS
        ))
        .bind(session_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(question_from_row).collect()
    }
}
