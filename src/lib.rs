//! # docqa
//!
//! Ask questions about a single document and get answers quoted from it.
//!
//! The pipeline itself (chunking, vector index, retrieval, sanitizing,
//! extractive answering) lives in the `docqa-core` crate. This crate
//! adds the parts that touch the outside world: configuration, model-backed
//! embedding providers and QA extractors, PDF extraction, logging, the
//! `docqa` CLI, and the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────────────────────┐
//! │  PDF / txt  │──▶│  Assistant (docqa-core)              │
//! │  (extract)  │   │  sanitize ─▶ retrieve ─▶ extract     │
//! └─────────────┘   └──────────────┬───────────────────────┘
//!                                  │
//!                      ┌───────────┴───────┐
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │ (docqa)  │       │  (axum)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docqa ask "What is the refund policy?" --document terms.pdf
//! docqa chat --document terms.pdf
//! docqa summarize --document terms.pdf --sentences 3
//! docqa keywords --document terms.pdf --top 10
//! docqa extract terms.pdf --out terms.txt
//! docqa serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers (hash, fastembed, tract, Ollama, OpenAI) |
//! | [`qa`] | Answer extractors (lexical, ONNX QA model) |
//! | [`extract`] | PDF and text loading |
//! | [`service`] | Startup wiring of the assistant |
//! | [`ask`] | `ask` and `chat` commands |
//! | [`analyze`] | `summarize` and `keywords` commands |
//! | [`server`] | HTTP server |
//! | [`logging`] | Tracing subscriber setup |

pub mod analyze;
pub mod ask;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod logging;
#[cfg(any(feature = "local-embeddings-tract", feature = "qa-onnx"))]
pub mod model_cache;
pub mod qa;
pub mod server;
pub mod service;

pub use docqa_core as core;
