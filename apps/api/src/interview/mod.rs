// Interview engine: question generation, reference answers, answer evaluation.
// All LLM calls go through llm_client — no direct provider HTTP calls here.

pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod resume;
pub mod store;
