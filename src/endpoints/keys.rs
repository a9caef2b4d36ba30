//! API key administration (`GET/POST/DELETE api_keys`, `api_keys/generate_web3_key`,
//! `api_keys/rate_limits`, `api_keys/rate_limits/log`).

use crate::error::Error;
use crate::facade::Client;

/// `GET api_keys`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn list( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "api_keys", None ).await
}

/// `POST api_keys`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn create( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "api_keys", Some( request ) ).await
}

/// `DELETE api_keys/{id}`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn revoke( client : &Client, id : &str ) -> Result< serde_json::Value, Error >
{
  client.delete( &format!( "api_keys/{id}" ) ).await
}

/// `POST api_keys/generate_web3_key`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn generate_web3_key( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "api_keys/generate_web3_key", Some( request ) ).await
}

/// `GET api_keys/rate_limits`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn rate_limits( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "api_keys/rate_limits", None ).await
}

/// `GET api_keys/rate_limits/log`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn rate_limits_log( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "api_keys/rate_limits/log", None ).await
}
