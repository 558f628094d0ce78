//! The question-answering service object.
//!
//! [`Assistant`] wires the sanitizer, retriever, and answer extractor
//! together. It is built once at startup with its models and shared
//! read-only across requests. [`Assistant::ask`] always returns a
//! [`Reply`]; component failures become reply variants instead of
//! escaping to the caller.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::answer::AnswerExtractor;
use crate::error::RetrieveError;
use crate::models::{Retrieval, RetrievedChunk};
use crate::retrieve::ContextRetriever;
use crate::sanitize::Sanitizer;
use crate::session::Session;

pub const DOCUMENT_EMPTY_MESSAGE: &str = "Document is empty or too short.";
pub const NO_CONTEXT_MESSAGE: &str = "Could not retrieve any relevant context.";
pub const NO_ANSWER_MESSAGE: &str = "I couldn't find an answer based on the document.";

/// Pipeline stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Embedding,
    Index,
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Embedding => write!(f, "embedding"),
            Stage::Index => write!(f, "index"),
            Stage::Extraction => write!(f, "answer extraction"),
        }
    }
}

/// Outcome of one question.
///
/// Each non-answer variant is a distinct condition the caller can render
/// as its own state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Answer {
        answer: String,
        score: f32,
        context: Vec<RetrievedChunk>,
    },
    DocumentEmpty,
    NoContext,
    NoAnswer,
    InvalidConfiguration {
        message: String,
    },
    Failed {
        stage: Stage,
        message: String,
    },
}

impl Reply {
    /// User-facing text for this reply.
    pub fn message(&self) -> String {
        match self {
            Reply::Answer { answer, .. } => answer.clone(),
            Reply::DocumentEmpty => DOCUMENT_EMPTY_MESSAGE.to_string(),
            Reply::NoContext => NO_CONTEXT_MESSAGE.to_string(),
            Reply::NoAnswer => NO_ANSWER_MESSAGE.to_string(),
            Reply::InvalidConfiguration { message } => {
                format!("Invalid configuration: {}", message)
            }
            Reply::Failed { stage, message } => format!("Error: {} failed: {}", stage, message),
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Reply::Answer { .. })
    }

    /// The same reply with the retrieved chunks dropped.
    pub fn without_context(&self) -> Reply {
        match self {
            Reply::Answer { answer, score, .. } => Reply::Answer {
                answer: answer.clone(),
                score: *score,
                context: Vec::new(),
            },
            other => other.clone(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Reply::Answer { .. } => "answer",
            Reply::DocumentEmpty => "document_empty",
            Reply::NoContext => "no_context",
            Reply::NoAnswer => "no_answer",
            Reply::InvalidConfiguration { .. } => "invalid_configuration",
            Reply::Failed { .. } => "failed",
        }
    }
}

impl From<RetrieveError> for Reply {
    fn from(err: RetrieveError) -> Self {
        match err {
            RetrieveError::Configuration(e) => Reply::InvalidConfiguration {
                message: e.to_string(),
            },
            RetrieveError::EmptyDocument => Reply::DocumentEmpty,
            RetrieveError::NoContext => Reply::NoContext,
            RetrieveError::Embedding(message) => Reply::Failed {
                stage: Stage::Embedding,
                message,
            },
            RetrieveError::Index(e) => Reply::Failed {
                stage: Stage::Index,
                message: e.to_string(),
            },
        }
    }
}

/// Sanitizer → retriever → extractor.
#[derive(Clone)]
pub struct Assistant {
    sanitizer: Sanitizer,
    retriever: ContextRetriever,
    extractor: Arc<dyn AnswerExtractor>,
}

impl Assistant {
    pub fn new(
        sanitizer: Sanitizer,
        retriever: ContextRetriever,
        extractor: Arc<dyn AnswerExtractor>,
    ) -> Self {
        Self {
            sanitizer,
            retriever,
            extractor,
        }
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    pub fn extractor(&self) -> &dyn AnswerExtractor {
        self.extractor.as_ref()
    }

    /// Answer `question` about `document`, building a fresh index.
    pub async fn ask(&self, document: &str, question: &str, top_k: Option<usize>) -> Reply {
        let question = self.sanitizer.sanitize(question);
        let retrieval = self.retriever.retrieve(&question, document, top_k).await;
        self.finish(retrieval).await
    }

    /// Answer `question` about the session's active document, reusing the
    /// session's cached index, and append the turn to its history.
    pub async fn ask_in_session(
        &self,
        session: &mut Session,
        question: &str,
        top_k: Option<usize>,
    ) -> Reply {
        let question = self.sanitizer.sanitize(question);
        let reply = match session.document().map(|d| d.text().to_string()) {
            None => Reply::DocumentEmpty,
            Some(text) => {
                let retrieval = self
                    .retriever
                    .retrieve_cached(&question, &text, top_k, session.cache())
                    .await;
                self.finish(retrieval).await
            }
        };
        session.record(&question, &reply);
        reply
    }

    async fn finish(&self, retrieval: Result<Retrieval, RetrieveError>) -> Reply {
        let reply = match retrieval {
            Err(e) => Reply::from(e),
            Ok(retrieval) => self.extract(retrieval).await,
        };
        match &reply {
            Reply::Failed { stage, message } => {
                warn!(%stage, error = %message, "question failed")
            }
            other => info!(reply = other.kind(), "question answered"),
        }
        reply
    }

    async fn extract(&self, retrieval: Retrieval) -> Reply {
        match self
            .extractor
            .extract(&retrieval.question, &retrieval.context)
            .await
        {
            Ok(answer) if answer.is_empty() => Reply::NoAnswer,
            Ok(answer) => Reply::Answer {
                answer: answer.text,
                score: answer.score,
                context: retrieval.chunks,
            },
            Err(e) => Reply::Failed {
                stage: Stage::Extraction,
                message: format!("{:#}", e),
            },
        }
    }
}
