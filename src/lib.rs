//! # Venice API Client — transport core
//!
//! The transport core for a client library targeting Venice AI's HTTP
//! surface: chat completions (including SSE streaming), embeddings, image
//! generation/editing/upscaling, text-to-speech, asynchronous video
//! generation, character and model discovery, API key administration and
//! billing.
//!
//! ## Governing principle: thin client, explicit control
//!
//! This crate is a transparent window onto the Venice API, not a smart
//! assistant. Every service-level operation under [`endpoints`] is a thin
//! wrapper over [`facade::Client`]'s four primitives (`get`/`post`/`delete`/`stream`);
//! none of them validate request or response shapes beyond what
//! `serde_json::Value` gives for free. Reliability behaviors the client
//! *is* responsible for — pooled connections, bounded jittered retry,
//! rate-limit observability, async job polling — are implemented once in
//! the core and shared by every endpoint, with explicit configuration and
//! no hidden magic thresholds.
//!
//! ## State management
//!
//! Runtime-stateful, process-stateless: the connection pool ([`http::Engine`])
//! and the rate-limit recorder ([`metrics::Recorder`]) hold state that dies
//! with the process. The only persistent state this crate touches is the
//! credential dotenv files under [`credentials`], and only when a caller
//! explicitly asks to read or write one.

#![ doc( html_root_url = "https://docs.rs/api_venice/latest/api_venice/" ) ]
#![ cfg_attr( doc, doc = include_str!( concat!( env!( "CARGO_MANIFEST_DIR" ), "/", "readme.md" ) ) ) ]

/// Canonical error taxonomy shared by every fallible operation.
pub mod error;

/// Layered configuration resolution (explicit / env / local dotenv / global dotenv).
#[ cfg( feature = "enabled" ) ]
pub mod config;

/// Credential file I/O for the local and global dotenv locations.
#[ cfg( feature = "enabled" ) ]
pub mod credentials;

/// Thread-safe, bounded-retention rate-limit metrics recorder.
#[ cfg( feature = "enabled" ) ]
pub mod metrics;

/// Server-sent-event frame decoding, with raw and parsed iteration modes.
#[ cfg( feature = "enabled" ) ]
pub mod sse;

/// Pooled HTTP request execution and the bounded, jittered retry policy.
#[ cfg( feature = "enabled" ) ]
pub mod http;

/// Async job helper for long-running video generation (queue/poll/complete).
#[ cfg( feature = "enabled" ) ]
pub mod job;

/// The endpoint facade: `get`/`post`/`delete`/`stream`/`post_raw` primitives
/// plus the metrics accessor every service namespace in [`endpoints`] rides on.
#[ cfg( feature = "enabled" ) ]
pub mod facade;

/// Per-service endpoint wrappers (models, chat, embeddings, images, audio,
/// video, characters, keys, billing) — thin dispatchers with no schema
/// validation beyond what `serde_json::Value` gives for free.
#[ cfg( feature = "enabled" ) ]
pub mod endpoints;

// Re-export the most commonly used types at the crate root.
pub use error::{ Error, ErrorKind };

#[ cfg( feature = "enabled" ) ]
pub use config::{ Config, ExplicitSource, resolve_config };

#[ cfg( feature = "enabled" ) ]
pub use facade::Client;

#[ cfg( feature = "enabled" ) ]
pub use job::{ Job, JobState };

#[ cfg( feature = "enabled" ) ]
pub use metrics::{ RateLimitEvent, Recorder, Summary };
