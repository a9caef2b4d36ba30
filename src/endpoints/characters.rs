//! Character discovery (`GET characters`, `GET characters/{slug}`).

use crate::error::Error;
use crate::facade::Client;

/// `GET characters`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn list( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "characters", None ).await
}

/// `GET characters/{slug}`.
///
/// # Errors
///
/// [`crate::error::ErrorKind::CharacterNotFound`] if `slug` does not exist;
/// otherwise per §7 propagation policy.
pub async fn get( client : &Client, slug : &str ) -> Result< serde_json::Value, Error >
{
  client.get( &format!( "characters/{slug}" ), None ).await
}
