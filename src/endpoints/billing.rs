//! Billing (`GET billing/usage`).

use crate::error::Error;
use crate::facade::Client;

/// `GET billing/usage`.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn usage( client : &Client ) -> Result< serde_json::Value, Error >
{
  client.get( "billing/usage", None ).await
}
