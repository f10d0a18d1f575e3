//! Interview orchestration — the three use cases that delegate judgment to an LLM.
//!
//! Every operation: acquire a role client → build the prompt → make exactly one completion
//! call with fixed sampling parameters → normalize the reply into a typed result.
//! Nothing here retries, and nothing here persists.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::interview::models::{EvaluationResult, GeneratedQuestion};
use crate::interview::prompts::{
    build_evaluation_prompt, build_question_generation_prompt, build_reference_answer_prompt,
    Prompt,
};
use crate::llm_client::normalize::{normalize, MalformedResponseError};
use crate::llm_client::provider::{
    ConfigurationError, ProviderClient, ProviderFactory, ProviderRole,
};
use crate::llm_client::LlmError;

const QUESTIONS_TEMPERATURE: f64 = 0.7;
const QUESTIONS_MAX_TOKENS: u32 = 2000;
const REFERENCE_TEMPERATURE: f64 = 0.5;
const REFERENCE_MAX_TOKENS: u32 = 500;
const EVALUATION_TEMPERATURE: f64 = 0.3;
const EVALUATION_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Error calling the {role} provider: {source}. Please check your {setting} and try again.")]
    ProviderCall {
        role: ProviderRole,
        setting: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("The {role} provider returned malformed output: {source}")]
    MalformedResponse {
        role: ProviderRole,
        #[source]
        source: MalformedResponseError,
    },

    #[error("The {role} provider returned JSON of an unexpected shape: {source}")]
    UnexpectedShape {
        role: ProviderRole,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct QuestionsEnvelope {
    #[serde(default)]
    questions: Option<Vec<GeneratedQuestion>>,
}

#[derive(Clone)]
pub struct Interviewer {
    providers: ProviderFactory,
}

impl Interviewer {
    pub fn new(providers: ProviderFactory) -> Self {
        Self { providers }
    }

    /// Generates questions tailored to the job description and resume.
    /// A reply without a `questions` field yields an empty list.
    pub async fn generate_questions(
        &self,
        job_description: &str,
        resume_text: &str,
        duration_seconds: u32,
    ) -> Result<Vec<GeneratedQuestion>, InterviewError> {
        let client = self.providers.client(ProviderRole::QuestionsAndReference)?;
        let prompt = build_question_generation_prompt(job_description, resume_text, duration_seconds);

        let text = complete(&client, &prompt, QUESTIONS_TEMPERATURE, QUESTIONS_MAX_TOKENS).await?;
        let envelope: QuestionsEnvelope = parse_reply(client.role(), &text)?;
        let questions = envelope.questions.unwrap_or_default();

        info!(
            "Generated {} questions for a {}s interview",
            questions.len(),
            duration_seconds
        );
        Ok(questions)
    }

    /// Generates the ideal answer a candidate's response is compared against. Free text.
    pub async fn generate_reference_answer(
        &self,
        question: &str,
        job_description: &str,
        resume_summary: &str,
    ) -> Result<String, InterviewError> {
        let client = self.providers.client(ProviderRole::QuestionsAndReference)?;
        let prompt = build_reference_answer_prompt(question, job_description, resume_summary);

        complete(&client, &prompt, REFERENCE_TEMPERATURE, REFERENCE_MAX_TOKENS).await
    }

    /// Scores a transcribed answer against the reference answer.
    /// Scores are returned exactly as the provider produced them.
    pub async fn evaluate_answer(
        &self,
        question: &str,
        transcript: &str,
        reference_answer: &str,
    ) -> Result<EvaluationResult, InterviewError> {
        let client = self.providers.client(ProviderRole::Evaluation)?;
        let prompt = build_evaluation_prompt(question, transcript, reference_answer);

        let text = complete(&client, &prompt, EVALUATION_TEMPERATURE, EVALUATION_MAX_TOKENS).await?;
        let result: EvaluationResult = parse_reply(client.role(), &text)?;

        info!("Evaluated answer: total_score={}", result.total_score);
        Ok(result)
    }
}

/// Makes the single completion call for an operation and returns the trimmed reply text.
async fn complete(
    client: &ProviderClient,
    prompt: &Prompt,
    temperature: f64,
    max_tokens: u32,
) -> Result<String, InterviewError> {
    let role = client.role();
    info!("Calling {role} provider (model: {})", client.model());

    let completion = client
        .complete(prompt.system, &prompt.user, temperature, max_tokens)
        .await
        .map_err(|source| {
            warn!("{role} provider call failed: {source}");
            InterviewError::ProviderCall {
                role,
                setting: role.credential_setting(),
                source,
            }
        })?;

    if let Some(usage) = &completion.usage {
        debug!(
            "{role} provider call succeeded: prompt_tokens={}, completion_tokens={}",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    Ok(completion.text.trim().to_string())
}

fn parse_reply<T: DeserializeOwned>(role: ProviderRole, text: &str) -> Result<T, InterviewError> {
    let value = normalize(text).map_err(|source| {
        warn!("{role} provider returned malformed output: {source}");
        InterviewError::MalformedResponse { role, source }
    })?;

    serde_json::from_value(value).map_err(|source| InterviewError::UnexpectedShape { role, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::llm_client::provider::{ProviderCredentials, ProviderSettings};
    use crate::llm_client::{
        Completion, CompletionRequest, CompletionTransport, MessageRole, ProviderEndpoint,
    };

    const GROQ_URL: &str = "https://api.groq.com/openai/v1";
    const OPENAI_URL: &str = "https://api.openai.com/v1";

    /// Records every call and answers from a queue of canned replies.
    #[derive(Default)]
    struct StubTransport {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: Mutex<Vec<(ProviderEndpoint, CompletionRequest)>>,
    }

    impl StubTransport {
        fn replying(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::default(),
            })
        }

        fn reply(text: &str) -> Arc<Self> {
            Self::replying(vec![Ok(text.to_string())])
        }

        fn calls(&self) -> Vec<(ProviderEndpoint, CompletionRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionTransport for StubTransport {
        async fn complete(
            &self,
            endpoint: &ProviderEndpoint,
            request: &CompletionRequest,
        ) -> Result<Completion, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.clone(), request.clone()));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))?;
            Ok(Completion {
                text: reply,
                usage: None,
            })
        }
    }

    fn interviewer_with(
        stub: &Arc<StubTransport>,
        groq: Option<&str>,
        openai: Option<&str>,
    ) -> Interviewer {
        let credentials = ProviderCredentials {
            questions: ProviderSettings {
                api_key: groq.map(String::from),
                base_url: GROQ_URL.to_string(),
            },
            evaluation: ProviderSettings {
                api_key: openai.map(String::from),
                base_url: OPENAI_URL.to_string(),
            },
        };
        let transport: Arc<dyn CompletionTransport> = stub.clone();
        Interviewer::new(ProviderFactory::new(credentials, transport))
    }

    fn interviewer(stub: &Arc<StubTransport>) -> Interviewer {
        interviewer_with(stub, Some("gsk-test"), Some("sk-test"))
    }

    fn tcp_evaluation() -> serde_json::Value {
        json!({
            "scores": {"relevance": 3, "accuracy": 2, "depth": 1, "clarity": 5, "fit": 3},
            "total_score": 14,
            "feedback": ["too vague"],
            "comparison_summary": "lacks technical detail"
        })
    }

    // ── generate_questions ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_generate_questions_sends_pinned_parameters() {
        let stub = StubTransport::reply(r#"{"questions": []}"#);
        interviewer(&stub)
            .generate_questions("Rust backend engineer", "Built a message broker", 900)
            .await
            .unwrap();

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        let (endpoint, request) = &calls[0];
        assert_eq!(endpoint.base_url, GROQ_URL);
        assert_eq!(endpoint.api_key, "gsk-test");
        assert_eq!(request.model, "llama-3.3-70b-versatile");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, 2000);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!(request.messages[0].content.contains("Produce ONLY valid JSON"));
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert!(request.messages[1].content.contains("Rust backend engineer"));
        assert!(request.messages[1].content.contains("Built a message broker"));
        assert!(request.messages[1]
            .content
            .contains("Interview Duration (seconds): 900"));
    }

    #[tokio::test]
    async fn test_generate_questions_empty_list_is_not_an_error() {
        let stub = StubTransport::reply(r#"{"questions": []}"#);
        let questions = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_questions_missing_field_yields_empty_list() {
        let stub = StubTransport::reply(r#"{"note": "nothing to ask"}"#);
        let questions = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_questions_null_field_yields_empty_list() {
        let stub = StubTransport::reply(r#"{"questions": null}"#);
        let questions = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_questions_recovers_fenced_reply() {
        let stub = StubTransport::reply(
            "```json\n{\"questions\":[{\"id\":\"q1\",\"text\":\"Describe a REST API\",\"estimated_seconds\":120}]}\n```",
        );
        let questions = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap();
        assert_eq!(
            questions,
            vec![GeneratedQuestion {
                id: "q1".to_string(),
                text: "Describe a REST API".to_string(),
                estimated_seconds: 120,
            }]
        );
    }

    #[tokio::test]
    async fn test_generate_questions_keeps_provider_order() {
        let stub = StubTransport::reply(
            r#"{"questions":[
                {"id":"q2","text":"Second","estimated_seconds":60},
                {"id":"q1","text":"First","estimated_seconds":90}
            ]}"#,
        );
        let questions = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap();
        let ids: Vec<_> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["q2", "q1"]);
    }

    #[tokio::test]
    async fn test_generate_questions_without_credential_makes_no_call() {
        let stub = StubTransport::reply(r#"{"questions": []}"#);
        let err = interviewer_with(&stub, None, Some("sk-test"))
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap_err();

        match err {
            InterviewError::Configuration(e) => assert_eq!(e.setting, "GROQ_API_KEY"),
            other => panic!("expected Configuration error, got {other:?}"),
        }
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_questions_wraps_provider_failure_with_hint() {
        let stub = StubTransport::replying(vec![Err(LlmError::Api {
            status: 401,
            message: "Invalid API Key".to_string(),
        })]);
        let err = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Invalid API Key"));
        assert!(message.contains("Please check your GROQ_API_KEY"));
        match err {
            InterviewError::ProviderCall { role, source, .. } => {
                assert_eq!(role, ProviderRole::QuestionsAndReference);
                assert!(matches!(source, LlmError::Api { status: 401, .. }));
            }
            other => panic!("expected ProviderCall error, got {other:?}"),
        }
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_questions_unparseable_reply_is_malformed() {
        let stub = StubTransport::reply("I'm sorry, I can't produce questions for this role.");
        let err = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_generate_questions_bad_entry_is_unexpected_shape() {
        let stub = StubTransport::reply(r#"{"questions":[{"id":"q1","text":"No duration"}]}"#);
        let err = interviewer(&stub)
            .generate_questions("JD", "CV", 300)
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::UnexpectedShape { .. }));
    }

    // ── generate_reference_answer ──────────────────────────────────────────

    #[tokio::test]
    async fn test_reference_answer_is_trimmed_free_text() {
        let stub = StubTransport::reply("\n  A mutex serializes access to shared state.  \n");
        let answer = interviewer(&stub)
            .generate_reference_answer("What is a mutex?", "Systems role", "C++ dev")
            .await
            .unwrap();
        assert_eq!(answer, "A mutex serializes access to shared state.");

        let (endpoint, request) = &stub.calls()[0];
        assert_eq!(endpoint.base_url, GROQ_URL);
        assert_eq!(request.model, "llama-3.3-70b-versatile");
        assert_eq!(request.temperature, 0.5);
        assert_eq!(request.max_tokens, 500);
        assert!(request.messages[1].content.contains("Question: What is a mutex?"));
    }

    #[tokio::test]
    async fn test_reference_answer_is_not_json_parsed() {
        let stub = StubTransport::reply("```\nnot json at all\n```");
        let answer = interviewer(&stub)
            .generate_reference_answer("Q", "JD", "CV")
            .await
            .unwrap();
        assert_eq!(answer, "```\nnot json at all\n```");
    }

    #[tokio::test]
    async fn test_reference_answer_without_credential_makes_no_call() {
        let stub = StubTransport::reply("unused");
        let err = interviewer_with(&stub, Some("  "), Some("sk-test"))
            .generate_reference_answer("Q", "JD", "CV")
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::Configuration(_)));
        assert!(stub.calls().is_empty());
    }

    // ── evaluate_answer ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_evaluate_answer_passes_scores_through_unchanged() {
        let raw = tcp_evaluation();
        let stub = StubTransport::reply(&raw.to_string());
        let result = interviewer(&stub)
            .evaluate_answer(
                "Explain TCP handshake",
                "It's like a conversation",
                "SYN, SYN-ACK, ACK establishes sequence numbers on both sides.",
            )
            .await
            .unwrap();

        assert_eq!(result.scores.relevance, 3);
        assert_eq!(result.scores.accuracy, 2);
        assert_eq!(result.scores.depth, 1);
        assert_eq!(result.scores.clarity, 5);
        assert_eq!(result.scores.fit, 3);
        assert_eq!(result.total_score, 14);
        assert_eq!(result.feedback, vec!["too vague".to_string()]);
        assert_eq!(result.comparison_summary, "lacks technical detail");
        assert_eq!(serde_json::to_value(&result).unwrap(), raw);
    }

    #[tokio::test]
    async fn test_evaluate_answer_uses_evaluation_role() {
        let stub = StubTransport::reply(&tcp_evaluation().to_string());
        interviewer(&stub)
            .evaluate_answer("Explain TCP handshake", "It's like a conversation", "SYN...")
            .await
            .unwrap();

        let (endpoint, request) = &stub.calls()[0];
        assert_eq!(endpoint.base_url, OPENAI_URL);
        assert_eq!(endpoint.api_key, "sk-test");
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 1500);
        assert!(request.messages[1]
            .content
            .contains("Penalize vague or incorrect answers heavily."));
    }

    #[tokio::test]
    async fn test_evaluate_answer_does_not_recompute_total() {
        let mut raw = tcp_evaluation();
        raw["total_score"] = json!(49);
        let stub = StubTransport::reply(&raw.to_string());
        let result = interviewer(&stub)
            .evaluate_answer("Q", "A", "R")
            .await
            .unwrap();
        assert_eq!(result.total_score, 49);
    }

    #[tokio::test]
    async fn test_evaluate_answer_recovers_bare_fence() {
        let stub = StubTransport::reply(&format!("```\n{}\n```", tcp_evaluation()));
        let result = interviewer(&stub)
            .evaluate_answer("Q", "A", "R")
            .await
            .unwrap();
        assert_eq!(result.total_score, 14);
    }

    #[tokio::test]
    async fn test_evaluate_answer_missing_scores_is_unexpected_shape() {
        let stub = StubTransport::reply(
            r#"{"total_score": 14, "feedback": [], "comparison_summary": "n/a"}"#,
        );
        let err = interviewer(&stub)
            .evaluate_answer("Q", "A", "R")
            .await
            .unwrap_err();
        match err {
            InterviewError::UnexpectedShape { role, source } => {
                assert_eq!(role, ProviderRole::Evaluation);
                assert!(source.to_string().contains("scores"));
            }
            other => panic!("expected UnexpectedShape error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_evaluate_answer_without_credential_makes_no_call() {
        let stub = StubTransport::reply(&tcp_evaluation().to_string());
        let err = interviewer_with(&stub, Some("gsk-test"), None)
            .evaluate_answer("Q", "A", "R")
            .await
            .unwrap_err();
        match err {
            InterviewError::Configuration(e) => assert_eq!(e.setting, "OPENAI_API_KEY"),
            other => panic!("expected Configuration error, got {other:?}"),
        }
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_answer_provider_failure_names_openai_key() {
        let stub = StubTransport::replying(vec![Err(LlmError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        })]);
        let err = interviewer(&stub)
            .evaluate_answer("Q", "A", "R")
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::ProviderCall { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert_eq!(stub.calls().len(), 1);
    }
}
