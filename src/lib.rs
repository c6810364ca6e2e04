//! Nexora routes assistant requests through ordered chains of external AI
//! providers and never leaves a caller without an answer.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the domain: capabilities and features, provider clients,
//!   the asynchronous job poller, fallback chains, local synthesis, response
//!   formatting, and the feature router that ties them together.
//! - [`server`] exposes the router as a JSON HTTP API.
//! - [`api`] defines the wire payloads exchanged with external providers.
//! - [`utils`] holds logging setup, URL helpers, and authentication headers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and dispatches to
//! one-shot requests, provider listings, or the HTTP server.

pub mod api;
pub mod cli;
pub mod core;
pub mod server;
pub mod utils;
