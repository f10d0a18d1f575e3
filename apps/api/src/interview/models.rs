use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// One interview question as produced by the questions provider.
/// `id` is assigned by the model and is only expected to be unique within its batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub id: String,
    pub text: String,
    pub estimated_seconds: i64,
}

/// Per-dimension scores, nominally 1–10 each. Not range-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub relevance: i64,
    pub accuracy: i64,
    pub depth: i64,
    pub clarity: i64,
    pub fit: i64,
}

/// Evaluation of one transcribed answer, passed through from the evaluation provider as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scores: DimensionScores,
    pub total_score: i64,
    pub feedback: Vec<String>,
    pub comparison_summary: String,
    /// Any additional top-level fields the provider returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSessionRow {
    pub id: Uuid,
    pub job_description: String,
    pub resume_text: String,
    pub duration_seconds: i32,
    pub questions: Value,
    pub created_at: DateTime<Utc>,
}

impl InterviewSessionRow {
    pub fn questions(&self) -> Result<Vec<GeneratedQuestion>, serde_json::Error> {
        serde_json::from_value(self.questions.clone())
    }

    pub fn find_question(
        &self,
        question_id: &str,
    ) -> Result<Option<GeneratedQuestion>, serde_json::Error> {
        Ok(self.questions()?.into_iter().find(|q| q.id == question_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewAnswerRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: String,
    pub question_text: String,
    pub transcript: String,
    pub reference_answer: String,
    pub evaluation: Value,
    pub total_score: i64,
    pub created_at: DateTime<Utc>,
}
