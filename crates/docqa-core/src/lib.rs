//! # docqa core
//!
//! Pure question-answering logic for a single document: word-window
//! chunking, embedding trait, exact nearest-neighbour index, context
//! retrieval, input sanitizing, extractive answering, and the
//! frequency-based summary and keyword utilities.
//!
//! This crate contains no tokio runtime, filesystem, or network code.
//! Model-backed providers live in the `docqa` application crate and plug
//! in through [`embedding::EmbeddingProvider`] and
//! [`answer::AnswerExtractor`].
//!
//! ## Pipeline
//!
//! ```text
//! question ─▶ Sanitizer ─▶ ContextRetriever ─────────────────────▶ AnswerExtractor ─▶ Reply
//!                          (chunk ─▶ embed ─▶ index ─▶ search)
//! ```

pub mod analysis;
pub mod answer;
pub mod assistant;
pub mod cache;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod retrieve;
pub mod sanitize;
pub mod session;
mod text;
