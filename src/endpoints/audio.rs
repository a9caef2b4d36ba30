//! Text-to-speech (`POST audio/speech`), binary response.

use crate::error::Error;
use crate::facade::Client;
use bytes::Bytes;

/// `POST audio/speech`, returning the raw audio bytes.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn speech( client : &Client, request : serde_json::Value ) -> Result< Bytes, Error >
{
  client.post_raw( "audio/speech", Some( request ) ).await
}
