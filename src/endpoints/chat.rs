//! Chat completions (`POST chat/completions`), non-streaming and SSE (§4.4).

use crate::error::Error;
use crate::facade::Client;
use crate::sse::delta_content;
use futures_util::{ Stream, StreamExt };

/// `POST chat/completions` with `stream` absent/false, decoded as JSON.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn completions( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "chat/completions", Some( request ) ).await
}

/// `POST chat/completions` with `stream:true`, yielding each parsed SSE chunk
/// as it arrives. The caller is responsible for setting `"stream": true` in
/// `request` (the wrapper does not mutate the caller's body).
///
/// # Errors
///
/// Whatever opening the stream raises (§4.3).
pub async fn completions_stream( client : &Client, request : serde_json::Value ) -> Result< impl Stream< Item = Result< serde_json::Value, Error > >, Error >
{
  client.stream( "chat/completions", Some( request ) ).await
}

/// `POST chat/completions` with `stream:true`, concatenating each chunk's
/// `choices[0].delta.content` into the full assistant message text.
///
/// # Errors
///
/// Whatever opening the stream raises, or the first malformed chunk
/// encountered (`DecodeError`, never retried — §7).
pub async fn completions_stream_text( client : &Client, request : serde_json::Value ) -> Result< String, Error >
{
  let mut stream = Box::pin( completions_stream( client, request ).await? );
  let mut text = String::new();
  while let Some( chunk ) = stream.next().await
  {
    text.push_str( delta_content( &chunk? ) );
  }
  Ok( text )
}
