//! Axum route handlers for the Interview API.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{
    EvaluationResult, GeneratedQuestion, InterviewAnswerRow, InterviewSessionRow,
};
use crate::interview::resume::extract_resume_text;
use crate::interview::store;
use crate::state::AppState;

/// Request body limit for `POST /api/v1/sessions/upload`.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub job_description: String,
    pub resume_text: String,
    pub duration_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub session: InterviewSessionRow,
    pub answers: Vec<InterviewAnswerRow>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub answer_id: Uuid,
    pub question_id: String,
    pub reference_answer: String,
    pub evaluation: EvaluationResult,
}

#[derive(Debug, Deserialize)]
pub struct AnswersQuery {
    pub question_id: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Generates interview questions for a JD + resume and stores the new session.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let response = start_session(
        &state,
        request.job_description,
        request.resume_text,
        request.duration_seconds,
    )
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/sessions/upload
///
/// Multipart variant: `job_description`, `duration_seconds`, and a `resume` PDF file.
pub async fn handle_upload_session(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let mut job_description = None;
    let mut duration_seconds = None;
    let mut resume_pdf = None;

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("job_description") => {
                job_description = Some(field.text().await.map_err(invalid_multipart)?);
            }
            Some("duration_seconds") => {
                let raw = field.text().await.map_err(invalid_multipart)?;
                duration_seconds = Some(parse_duration(&raw)?);
            }
            Some("resume") => {
                resume_pdf = Some(field.bytes().await.map_err(invalid_multipart)?);
            }
            _ => {}
        }
    }

    let job_description = job_description
        .ok_or_else(|| AppError::Validation("job_description field is required".to_string()))?;
    let duration_seconds = duration_seconds
        .ok_or_else(|| AppError::Validation("duration_seconds field is required".to_string()))?;
    let resume_pdf =
        resume_pdf.ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;
    validate_interview_params(&job_description, duration_seconds)?;

    let resume_text = tokio::task::spawn_blocking(move || extract_resume_text(&resume_pdf))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    info!("Extracted {} chars of resume text", resume_text.chars().count());

    let response = start_session(&state, job_description, resume_text, duration_seconds).await?;
    Ok(Json(response))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    let session = load_session(&state, session_id).await?;
    let answers = store::list_answers(&state.db, session_id).await?;
    Ok(Json(SessionDetailResponse { session, answers }))
}

/// POST /api/v1/sessions/:id/answers
///
/// Generates a reference answer for the question, evaluates the transcript against it,
/// and stores the evaluated answer.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    if request.transcript.trim().is_empty() {
        return Err(AppError::Validation("transcript cannot be empty".to_string()));
    }

    let session = load_session(&state, session_id).await?;
    let question = session
        .find_question(&request.question_id)
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Question {} not found in session {session_id}",
                request.question_id
            ))
        })?;

    let reference_answer = state
        .interviewer
        .generate_reference_answer(&question.text, &session.job_description, &session.resume_text)
        .await?;
    let evaluation = state
        .interviewer
        .evaluate_answer(&question.text, &request.transcript, &reference_answer)
        .await?;

    let answer = InterviewAnswerRow {
        id: Uuid::new_v4(),
        session_id,
        question_id: question.id.clone(),
        question_text: question.text.clone(),
        transcript: request.transcript,
        reference_answer: reference_answer.clone(),
        evaluation: serde_json::to_value(&evaluation).map_err(|e| AppError::Internal(e.into()))?,
        total_score: evaluation.total_score,
        created_at: Utc::now(),
    };
    store::insert_answer(&state.db, &answer).await?;

    Ok(Json(SubmitAnswerResponse {
        answer_id: answer.id,
        question_id: answer.question_id,
        reference_answer,
        evaluation,
    }))
}

/// GET /api/v1/sessions/:id/answers?question_id=
pub async fn handle_list_answers(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<AnswersQuery>,
) -> Result<Json<Vec<InterviewAnswerRow>>, AppError> {
    load_session(&state, session_id).await?;
    let answers = match params.question_id.as_deref() {
        Some(question_id) => store::answers_for_question(&state.db, session_id, question_id).await?,
        None => store::list_answers(&state.db, session_id).await?,
    };
    Ok(Json(answers))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn start_session(
    state: &AppState,
    job_description: String,
    resume_text: String,
    duration_seconds: u32,
) -> Result<CreateSessionResponse, AppError> {
    validate_session_input(&job_description, &resume_text, duration_seconds)?;

    let questions = state
        .interviewer
        .generate_questions(&job_description, &resume_text, duration_seconds)
        .await?;

    let session = InterviewSessionRow {
        id: Uuid::new_v4(),
        job_description,
        resume_text,
        duration_seconds: i32::try_from(duration_seconds)
            .map_err(|_| AppError::Validation("duration_seconds is too large".to_string()))?,
        questions: serde_json::to_value(&questions).map_err(|e| AppError::Internal(e.into()))?,
        created_at: Utc::now(),
    };
    store::insert_session(&state.db, &session).await?;

    Ok(CreateSessionResponse {
        session_id: session.id,
        questions,
    })
}

async fn load_session(state: &AppState, session_id: Uuid) -> Result<InterviewSessionRow, AppError> {
    store::get_session(&state.db, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
}

fn validate_session_input(
    job_description: &str,
    resume_text: &str,
    duration_seconds: u32,
) -> Result<(), AppError> {
    validate_interview_params(job_description, duration_seconds)?;
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    Ok(())
}

/// Checks that need no resume text, so uploads fail before PDF extraction.
fn validate_interview_params(job_description: &str, duration_seconds: u32) -> Result<(), AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if duration_seconds == 0 {
        return Err(AppError::Validation(
            "duration_seconds must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn parse_duration(raw: &str) -> Result<u32, AppError> {
    raw.trim().parse::<u32>().map_err(|_| {
        AppError::Validation("duration_seconds must be a positive integer".to_string())
    })
}

fn invalid_multipart(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(format!(
            "Upload exceeds the {} MiB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ));
    }
    AppError::Validation(format!("Invalid multipart body: {e}"))
}
