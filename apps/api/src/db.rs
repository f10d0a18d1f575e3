use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Collections and indexes the interview store relies on. Idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS interview_sessions (
        id               UUID PRIMARY KEY,
        job_description  TEXT NOT NULL,
        resume_text      TEXT NOT NULL,
        duration_seconds INTEGER NOT NULL,
        questions        JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS interview_answers (
        id               UUID PRIMARY KEY,
        session_id       UUID NOT NULL,
        question_id      TEXT NOT NULL,
        question_text    TEXT NOT NULL,
        transcript       TEXT NOT NULL,
        reference_answer TEXT NOT NULL,
        evaluation       JSONB NOT NULL,
        total_score      BIGINT NOT NULL,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_interview_answers_session_question
        ON interview_answers (session_id, question_id)
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the interview tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Interview schema ready");
    Ok(())
}

/// Waits for in-flight queries and closes every pooled connection.
pub async fn close_pool(pool: &PgPool) {
    pool.close().await;
    info!("PostgreSQL connection pool closed");
}
