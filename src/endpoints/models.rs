//! Model discovery (`GET models`, `GET models/traits`, `GET models/compatibility_mapping`).

use crate::error::Error;
use crate::facade::Client;

/// `GET models`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn list( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "models", None ).await
}

/// `GET models/traits`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn traits( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "models/traits", None ).await
}

/// `GET models/compatibility_mapping`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn compatibility_mapping( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "models/compatibility_mapping", None ).await
}
