//! Persistence for interview sessions and evaluated answers.
//!
//! Orchestration never writes here; handlers persist whatever the orchestrator returns.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::interview::models::{InterviewAnswerRow, InterviewSessionRow};

pub async fn insert_session(pool: &PgPool, session: &InterviewSessionRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO interview_sessions
            (id, job_description, resume_text, duration_seconds, questions, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(session.id)
    .bind(&session.job_description)
    .bind(&session.resume_text)
    .bind(session.duration_seconds)
    .bind(&session.questions)
    .bind(session.created_at)
    .execute(pool)
    .await?;

    info!("Inserted interview session {}", session.id);
    Ok(())
}

pub async fn get_session(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<InterviewSessionRow>> {
    sqlx::query_as::<_, InterviewSessionRow>("SELECT * FROM interview_sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_answer(pool: &PgPool, answer: &InterviewAnswerRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO interview_answers
            (id, session_id, question_id, question_text, transcript,
             reference_answer, evaluation, total_score, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(answer.id)
    .bind(answer.session_id)
    .bind(&answer.question_id)
    .bind(&answer.question_text)
    .bind(&answer.transcript)
    .bind(&answer.reference_answer)
    .bind(&answer.evaluation)
    .bind(answer.total_score)
    .bind(answer.created_at)
    .execute(pool)
    .await?;

    info!(
        "Inserted answer {} for session {} question {}",
        answer.id, answer.session_id, answer.question_id
    );
    Ok(())
}

/// All answers of a session, oldest first.
pub async fn list_answers(pool: &PgPool, session_id: Uuid) -> sqlx::Result<Vec<InterviewAnswerRow>> {
    sqlx::query_as::<_, InterviewAnswerRow>(
        "SELECT * FROM interview_answers WHERE session_id = $1 ORDER BY created_at, id",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
}

/// Answers to one question of a session. Served by the (session_id, question_id) index.
pub async fn answers_for_question(
    pool: &PgPool,
    session_id: Uuid,
    question_id: &str,
) -> sqlx::Result<Vec<InterviewAnswerRow>> {
    sqlx::query_as::<_, InterviewAnswerRow>(
        r#"
        SELECT * FROM interview_answers
        WHERE session_id = $1 AND question_id = $2
        ORDER BY created_at, id
        "#,
    )
    .bind(session_id)
    .bind(question_id)
    .fetch_all(pool)
    .await
}
