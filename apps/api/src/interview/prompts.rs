// All LLM prompts for the interview use cases.
// The evaluation wording drives score calibration; keep it strict.

pub const QUESTION_GENERATION_SYSTEM: &str = r#"You are an expert interviewer. Produce ONLY valid JSON:
{"questions":[{"id":"q1", "text":"...", "estimated_seconds":90}]}
Questions must be tailored to the job description and resume."#;

pub const REFERENCE_ANSWER_SYSTEM: &str = "You are an interview expert. \
    Write a high-quality, ideal answer to the interview question below, \
    considering the candidate's resume and the job description. \
    Keep it concise and professional.";

pub const EVALUATION_SYSTEM: &str = r#"You are an expert technical interviewer evaluating candidate responses.
Evaluate the candidate's answer on these dimensions (1-10 each):

1. **Relevance** – Does it directly answer the question?
2. **Technical Accuracy** – Are the facts, methods, or concepts correct?
3. **Depth** – Does it show understanding and reasoning or just surface-level points?
4. **Communication Clarity** – Is it clear, structured, and confident?
5. **Overall Fit** – Based on the job role, does this reflect the expected competence?

Return ONLY strict JSON in this format:
{
  "scores": {
    "relevance": int,
    "accuracy": int,
    "depth": int,
    "clarity": int,
    "fit": int
  },
  "total_score": int,
  "feedback": ["specific, short feedback points"],
  "comparison_summary": "how this differs from the ideal answer"
}
"#;

/// Appended to every evaluation request.
pub const EVALUATION_STRICTNESS: &str =
    "Give objective scoring, not polite feedback. Penalize vague or incorrect answers heavily.";

/// A system instruction plus the user payload for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
}

pub fn build_question_generation_prompt(
    job_description: &str,
    resume_text: &str,
    duration_seconds: u32,
) -> Prompt {
    Prompt {
        system: QUESTION_GENERATION_SYSTEM,
        user: format!(
            "Job Description:\n{job_description}\n\n\
             Resume:\n{resume_text}\n\n\
             Interview Duration (seconds): {duration_seconds}"
        ),
    }
}

pub fn build_reference_answer_prompt(
    question: &str,
    job_description: &str,
    resume_summary: &str,
) -> Prompt {
    Prompt {
        system: REFERENCE_ANSWER_SYSTEM,
        user: format!(
            "Job Description: {job_description}\n\
             Resume Summary: {resume_summary}\n\
             Question: {question}"
        ),
    }
}

pub fn build_evaluation_prompt(question: &str, transcript: &str, reference_answer: &str) -> Prompt {
    Prompt {
        system: EVALUATION_SYSTEM,
        user: format!(
            "Question: {question}\n\
             Candidate's Answer: {transcript}\n\
             Ideal Reference Answer: {reference_answer}\n\
             {EVALUATION_STRICTNESS}\n"
        ),
    }
}
