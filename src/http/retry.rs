//! Bounded, jittered retry policy (§4.3).
//!
//! Shape grounded on the `gemini` member's `internal/http/retry.rs::execute_with_retries`
//! (attempt counting, delay computation, elapsed bookkeeping), generalized
//! from Gemini-specific error variants to the taxonomy in [`crate::error`],
//! and extended with `Retry-After`-aware delay (`max(retry_after, computed_delay)`)
//! and per-429 metrics recording — neither of which the Gemini original performs.
//! Jitter uses `rand::rng().random_range(..)` (matching the `gemini`/`xai`
//! members), not the `claude` member's `DefaultHasher`-over-`SystemTime`
//! pseudo-random approach.

use super::{ classify_response_error, request_id, retry_after_seconds, Attempt, Body, Engine, RequestDescriptor, ResponseEnvelope };
use crate::error::{ bounded_preview, Error, ErrorKind };
use crate::metrics::RateLimitEvent;
use std::time::Duration;

#[ cfg( feature = "logging" ) ]
use tracing::{ debug, warn };

/// Compute the inter-attempt delay before attempt *k* (1-indexed), per §4.3:
/// `backoff_factor × 2^(k-1)` seconds with ±20% jitter, or `max(retry_after,
/// computed_delay)` when the prior attempt was a 429 that carried one.
#[ must_use ]
pub fn compute_delay( attempt : u32, backoff_factor : f64, retry_after : Option< u64 > ) -> Duration
{
  use rand::Rng;
  let exponential = backoff_factor * 2f64.powi( ( attempt.saturating_sub( 1 ) ) as i32 );
  let jitter_fraction = 1.0 + rand::rng().random_range( -0.2..=0.2 );
  let jittered = ( exponential * jitter_fraction ).max( 0.0 );
  let floor = retry_after.map( | s | s as f64 ).unwrap_or( 0.0 );
  Duration::from_secs_f64( jittered.max( floor ) )
}

fn is_success( status : u16 ) -> bool
{
  ( 200..300 ).contains( &status )
}

fn decode_success_body( status : u16, headers : &reqwest::header::HeaderMap, bytes : bytes::Bytes ) -> Result< ResponseEnvelope, Error >
{
  let is_json = headers
    .get( reqwest::header::CONTENT_TYPE )
    .and_then( | v | v.to_str().ok() )
    .is_none_or( | ct | ct.contains( "json" ) || ct.is_empty() );

  let body = if is_json && !bytes.is_empty()
  {
    match serde_json::from_slice::< serde_json::Value >( &bytes )
    {
      Ok( value ) => Body::Json( value ),
      Err( source ) =>
      {
        let preview = bounded_preview( &bytes, 200 );
        return Err( Error::new( ErrorKind::Decode, format!( "response body was not valid JSON: {preview}" ) ).with_status( status ).with_source( source ) );
      }
    }
  }
  else if is_json && bytes.is_empty()
  {
    Body::Json( serde_json::Value::Null )
  }
  else
  {
    Body::Raw( bytes )
  };

  Ok( ResponseEnvelope { status, headers : headers.clone(), body } )
}

/// Execute `req` through the engine's configured retry policy.
///
/// # Errors
///
/// See §7: the mapped [`ErrorKind`] for whichever failure ultimately
/// terminated the loop (non-retryable status, retry exhaustion, or a
/// transport error on the final attempt).
pub async fn execute_with_retries( engine : &Engine, req : &RequestDescriptor ) -> Result< ResponseEnvelope, Error >
{
  let config = engine.config();
  let max_attempts = config.max_retries() + 1;
  let backoff_factor = config.retry_backoff_factor();
  let retry_status_codes = config.retry_status_codes().clone();

  let mut attempt : u32 = 1;
  loop
  {
    #[ cfg( feature = "logging" ) ]
    if attempt > 1
    {
      debug!( attempt, path = %req.path, "retrying request" );
    }

    match engine.send_once( req ).await
    {
      Attempt::Response { status, headers, bytes } =>
      {
        let retry_after = if status == 429 { retry_after_seconds( &headers ) } else { None };

        if status == 429
        {
          let remaining = headers.get( "x-ratelimit-remaining-requests" ).and_then( | v | v.to_str().ok() ).and_then( | v | v.parse().ok() );
          engine.metrics().record( RateLimitEvent::now( req.path.clone(), req.method.as_str(), 429, retry_after, remaining ) );
        }

        if is_success( status )
        {
          return decode_success_body( status, &headers, bytes );
        }

        let should_retry = retry_status_codes.contains( &status );
        if !should_retry || attempt >= max_attempts
        {
          #[ cfg( feature = "logging" ) ]
          warn!( status, path = %req.path, attempt, "request failed, not retrying further" );
          let mut error = classify_response_error( status, &bytes, req, retry_after );
          if let Some( id ) = request_id( &headers )
          {
            error = error.with_context( "request_id", id );
          }
          return Err( error );
        }

        let delay = compute_delay( attempt, backoff_factor, retry_after );
        tokio::time::sleep( delay ).await;
        attempt += 1;
      }
      Attempt::Transport( error ) =>
      {
        if attempt >= max_attempts
        {
          return Err( error );
        }
        let delay = compute_delay( attempt, backoff_factor, None );
        tokio::time::sleep( delay ).await;
        attempt += 1;
      }
    }
  }
}

#[ cfg( test ) ]
mod tests
{
  use super::*;

  #[ test ]
  fn delay_grows_exponentially_in_expectation()
  {
    let d1 = compute_delay( 1, 1.0, None ).as_secs_f64();
    let d2 = compute_delay( 2, 1.0, None ).as_secs_f64();
    // Even with +/-20% jitter, attempt 2's range floor (0.8*2=1.6) exceeds
    // attempt 1's range ceiling (1.2*1=1.2).
    assert!( d2 > d1 );
  }

  #[ test ]
  fn retry_after_floors_the_delay()
  {
    let d = compute_delay( 1, 0.01, Some( 2 ) ).as_secs_f64();
    assert!( d >= 2.0 );
  }
}
