//! Query routing
//!
//! Maps a question to exactly one [`RouteDecision`], applying cheap
//! deterministic checks (system commands, farewells) before any retrieval
//! call. Retrieval problems never fail a turn — they degrade the decision
//! to [`RouteDecision::General`].

use std::sync::Arc;

use crate::retrieval::{RetrievedContext, Retriever};

/// Phrases that ask for the current time
const TIME_PHRASES: &[&str] = &["what time", "current time", "tell me the time"];

/// Phrases that ask for today's date
const DATE_PHRASES: &[&str] = &["what date", "today's date", "what day"];

/// Phrases that end the session
const FAREWELL_PHRASES: &[&str] = &["stop listening", "go to sleep", "goodbye", "bye"];

/// A context passage is substantive once it exceeds this many words
///
/// Deliberately a word-count proxy rather than a similarity cutoff: it keeps
/// routing independent of retrieval scoring internals. Replace only as a
/// conscious policy change.
const RELEVANT_WORD_COUNT: usize = 20;

/// Locally resolved request kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommand {
    /// "what time is it"
    Time,
    /// "what's today's date"
    Date,
}

/// Where a question should be answered
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// Resolved locally without retrieval or generation
    SystemCommand(SystemCommand),
    /// Answered by the generator with the given contexts, best match first
    Grounded(Vec<RetrievedContext>),
    /// Answered from the generator's own knowledge
    General,
    /// The user signalled the end of the session
    Exit,
}

/// Routes questions to a decision
///
/// Holds the retriever when one is available; a missing or failing retriever
/// degrades every knowledge question to `General`.
pub struct QueryRouter {
    retriever: Option<Arc<dyn Retriever>>,
    top_k: usize,
}

impl QueryRouter {
    /// Create a router
    ///
    /// Pass `None` for the retriever when the knowledge base is unavailable.
    #[must_use]
    pub fn new(retriever: Option<Arc<dyn Retriever>>, top_k: usize) -> Self {
        if retriever.is_none() {
            tracing::warn!("no retriever available, all knowledge questions route to general");
        }
        Self { retriever, top_k }
    }

    /// Whether a retriever is wired in
    #[must_use]
    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }

    /// Decide how to answer a question
    ///
    /// The caller handles empty input before routing; `question` is expected
    /// to be non-empty. The decision is computed fresh per question.
    pub async fn route(&self, question: &str) -> RouteDecision {
        let q = question.trim().to_lowercase();

        if TIME_PHRASES.iter().any(|p| q.contains(p)) {
            return RouteDecision::SystemCommand(SystemCommand::Time);
        }
        if DATE_PHRASES.iter().any(|p| q.contains(p)) {
            return RouteDecision::SystemCommand(SystemCommand::Date);
        }
        // Farewells take precedence over retrieval: a question that contains
        // one always ends the session.
        if FAREWELL_PHRASES.iter().any(|p| q.contains(p)) {
            return RouteDecision::Exit;
        }

        let Some(retriever) = &self.retriever else {
            return RouteDecision::General;
        };

        match retriever.retrieve(question, self.top_k).await {
            Ok(contexts) if is_relevant(&contexts) => {
                tracing::info!(contexts = contexts.len(), "routing to grounded answer");
                RouteDecision::Grounded(contexts)
            }
            Ok(_) => {
                tracing::info!("no substantive context, routing to general answer");
                RouteDecision::General
            }
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed, routing to general answer");
                RouteDecision::General
            }
        }
    }
}

/// Relevance heuristic: at least one passage with more than 20 words
fn is_relevant(contexts: &[RetrievedContext]) -> bool {
    contexts
        .iter()
        .any(|c| c.text.split_whitespace().count() > RELEVANT_WORD_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::SourceType;

    fn context(words: usize) -> RetrievedContext {
        RetrievedContext {
            text: vec!["word"; words].join(" "),
            source: "test".to_string(),
            source_type: SourceType::Other,
        }
    }

    #[test]
    fn test_relevance_heuristic_boundary() {
        // Exactly 20 words is not enough; it must exceed the threshold
        assert!(!is_relevant(&[context(20)]));
        assert!(is_relevant(&[context(21)]));
        assert!(!is_relevant(&[]));
        assert!(is_relevant(&[context(3), context(25)]));
    }

    #[tokio::test]
    async fn test_system_commands_without_retriever() {
        let router = QueryRouter::new(None, 5);

        assert_eq!(
            router.route("what time is it").await,
            RouteDecision::SystemCommand(SystemCommand::Time)
        );
        assert_eq!(
            router.route("What day is it today?").await,
            RouteDecision::SystemCommand(SystemCommand::Date)
        );
        assert_eq!(router.route("goodbye").await, RouteDecision::Exit);
        assert_eq!(router.route("tell me about rust").await, RouteDecision::General);
    }

    #[tokio::test]
    async fn test_time_phrase_is_case_insensitive() {
        let router = QueryRouter::new(None, 5);
        assert_eq!(
            router.route("Tell Me The TIME please").await,
            RouteDecision::SystemCommand(SystemCommand::Time)
        );
    }
}
