//! Answer pipeline
//!
//! Turns one question into one speakable answer: empty-input clarification,
//! then routing, then local command formatting or generation. All capability
//! degradation happens below this layer, so `answer` is infallible.

use std::sync::Arc;

use chrono::Local;

use crate::generate::Generator;
use crate::router::{QueryRouter, RouteDecision, SystemCommand};

/// Spoken when the question was empty or whitespace
pub const CLARIFICATION: &str = "I didn't catch that. Could you repeat?";

/// Outcome of answering one question
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Text to speak back
    Reply(String),
    /// The user asked to end the session
    Exit,
}

/// Routes questions and produces answers
pub struct Pipeline {
    router: QueryRouter,
    generator: Arc<dyn Generator>,
}

impl Pipeline {
    /// Create a pipeline from a router and generator
    #[must_use]
    pub fn new(router: QueryRouter, generator: Arc<dyn Generator>) -> Self {
        Self { router, generator }
    }

    /// Access the router (introspection for front-ends)
    #[must_use]
    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    /// Answer one question
    ///
    /// Never fails: retrieval problems degrade to general answers and
    /// generation problems become spoken apologies inside the generator.
    pub async fn answer(&self, question: &str) -> Answer {
        let question = question.trim();
        if question.is_empty() {
            return Answer::Reply(CLARIFICATION.to_string());
        }

        match self.router.route(question).await {
            RouteDecision::SystemCommand(SystemCommand::Time) => {
                let now = Local::now().format("%I:%M %p");
                Answer::Reply(format!("The current time is {now}."))
            }
            RouteDecision::SystemCommand(SystemCommand::Date) => {
                let today = Local::now().format("%A, %B %d, %Y");
                Answer::Reply(format!("Today is {today}."))
            }
            RouteDecision::Exit => Answer::Exit,
            RouteDecision::Grounded(contexts) => {
                Answer::Reply(self.generator.generate_with_context(question, &contexts).await)
            }
            RouteDecision::General => Answer::Reply(self.generator.generate(question).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::retrieval::RetrievedContext;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, question: &str) -> String {
            format!("general: {question}")
        }

        async fn generate_with_context(
            &self,
            question: &str,
            contexts: &[RetrievedContext],
        ) -> String {
            format!("grounded({}): {question}", contexts.len())
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(QueryRouter::new(None, 5), Arc::new(EchoGenerator))
    }

    #[tokio::test]
    async fn test_empty_question_asks_for_clarification() {
        assert_eq!(
            pipeline().answer("   ").await,
            Answer::Reply(CLARIFICATION.to_string())
        );
    }

    #[tokio::test]
    async fn test_time_command_is_formatted_locally() {
        let Answer::Reply(text) = pipeline().answer("what time is it").await else {
            panic!("expected a reply");
        };
        assert!(text.starts_with("The current time is "));
        // Local command, not the generator
        assert!(!text.contains("general:"));
    }

    #[tokio::test]
    async fn test_farewell_becomes_exit() {
        assert_eq!(pipeline().answer("okay goodbye now").await, Answer::Exit);
    }

    #[tokio::test]
    async fn test_knowledge_question_reaches_generator() {
        assert_eq!(
            pipeline().answer("tell me about the hostel").await,
            Answer::Reply("general: tell me about the hostel".to_string())
        );
    }
}
