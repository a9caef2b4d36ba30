//! Embeddings (`POST embeddings/generate`).

use crate::error::Error;
use crate::facade::Client;

/// `POST embeddings/generate`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn generate( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "embeddings/generate", Some( request ) ).await
}
