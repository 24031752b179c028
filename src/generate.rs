//! Answer generation
//!
//! The [`Generator`] trait produces natural-language answers, with or
//! without retrieved context. Implementations absorb their own connectivity
//! failures and hand back a speakable apology instead of an error — a
//! generation fault must never break a conversation turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::retrieval::RetrievedContext;
use crate::{Error, Result};

/// Spoken when the generation backend is unreachable or misbehaves
pub const GENERATION_APOLOGY: &str =
    "I'm having trouble thinking right now. Please try again in a moment.";

/// Prompt template for knowledge-grounded answers
const GROUNDED_TEMPLATE: &str = "You are a helpful information assistant.

INSTRUCTIONS:
1. Answer the question ONLY using the provided context below.
2. If the answer is not in the context, respond: \"I couldn't find this information in my reference sources.\"
3. Be concise, accurate, and helpful. The answer will be read aloud, so use plain text.

CONTEXT FROM REFERENCE SOURCES:
---
{context}
---

QUESTION: {question}

ANSWER:";

/// Prompt template for general-knowledge answers
const GENERAL_TEMPLATE: &str = "You are a helpful voice assistant. \
Answer the question concisely in plain text suitable for reading aloud.

QUESTION: {question}

ANSWER:";

/// Produces natural-language answers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Answer from the model's own knowledge
    ///
    /// Always returns speakable text; backend failures become an apology.
    async fn generate(&self, question: &str) -> String;

    /// Answer grounded in the supplied context passages
    ///
    /// Always returns speakable text; backend failures become an apology.
    async fn generate_with_context(&self, question: &str, contexts: &[RetrievedContext]) -> String;
}

/// Request body for the Ollama generate API
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Sampling options for generation
#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    stop: Vec<&'static str>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.9,
            num_predict: 512,
            stop: vec!["\n\nQUESTION:", "\n\nCONTEXT:"],
        }
    }
}

/// Response body from the Ollama generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generator backed by a local Ollama server
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaGenerator {
    /// Create a generator from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Generation(e.to_string()))?;

        tracing::info!(url = %config.url, model = %config.model, "generator initialized");

        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
        })
    }

    /// Send one prompt to the backend and return the completion text
    async fn call(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions::default(),
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("backend error {status}: {body}")));
        }

        let result: GenerateResponse = response.json().await?;
        Ok(result.response.trim().to_string())
    }

    /// Run a prompt, converting any failure into the spoken apology
    async fn call_or_apologize(&self, prompt: &str) -> String {
        match self.call(prompt).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                tracing::warn!("generator returned empty completion");
                GENERATION_APOLOGY.to_string()
            }
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                GENERATION_APOLOGY.to_string()
            }
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, question: &str) -> String {
        let prompt = general_prompt(question);
        self.call_or_apologize(&prompt).await
    }

    async fn generate_with_context(&self, question: &str, contexts: &[RetrievedContext]) -> String {
        let prompt = grounded_prompt(question, contexts);
        tracing::info!(contexts = contexts.len(), "answering with retrieved context");
        self.call_or_apologize(&prompt).await
    }
}

/// Build the general-knowledge prompt
fn general_prompt(question: &str) -> String {
    GENERAL_TEMPLATE.replace("{question}", question)
}

/// Build the grounded prompt with source-tagged context blocks
fn grounded_prompt(question: &str, contexts: &[RetrievedContext]) -> String {
    let context_text = contexts
        .iter()
        .map(|c| format!("[Source: {}]\n{}", c.source, c.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    GROUNDED_TEMPLATE
        .replace("{context}", &context_text)
        .replace("{question}", question)
}
