//! Image generation, editing and upscaling (`POST image/{generate,edit,upscale}`,
//! `GET image/styles`). Response shape (JSON carrying base64/URL, or raw binary
//! bytes) is controlled by the caller's `response_format` field in `request`;
//! the `_raw` variants are for callers that requested binary bytes back.

use crate::error::Error;
use crate::facade::Client;
use bytes::Bytes;

/// `POST image/generate`, decoded as JSON.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn generate( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "image/generate", Some( request ) ).await
}

/// `POST image/generate`, returning the raw response bytes (binary `response_format`).
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn generate_raw( client : &Client, request : serde_json::Value ) -> Result< Bytes, Error >
{
  client.post_raw( "image/generate", Some( request ) ).await
}

/// `POST image/edit`, decoded as JSON.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn edit( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "image/edit", Some( request ) ).await
}

/// `POST image/edit`, returning the raw response bytes.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn edit_raw( client : &Client, request : serde_json::Value ) -> Result< Bytes, Error >
{
  client.post_raw( "image/edit", Some( request ) ).await
}

/// `POST image/upscale`, decoded as JSON.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn upscale( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "image/upscale", Some( request ) ).await
}

/// `POST image/upscale`, returning the raw response bytes.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn upscale_raw( client : &Client, request : serde_json::Value ) -> Result< Bytes, Error >
{
  client.post_raw( "image/upscale", Some( request ) ).await
}

/// `GET image/styles`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn styles( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "image/styles", None ).await
}
