//! Thin per-service endpoint wrappers (§4.7, §6).
//!
//! Each module builds a path and/or a JSON body and forwards to one of
//! [`crate::facade::Client`]'s primitives. None of them validate request or
//! response shapes beyond what `serde_json::Value` gives for free — typed
//! per-endpoint schemas are an explicit non-goal (§1).

pub mod audio;
pub mod billing;
pub mod characters;
pub mod chat;
pub mod embeddings;
pub mod images;
pub mod keys;
pub mod models;
pub mod video;
