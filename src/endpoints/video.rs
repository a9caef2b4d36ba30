//! Asynchronous video generation (`POST video/{queue,retrieve,quote,complete}`,
//! queue/poll/complete lifecycle per §4.6).

use crate::error::Error;
use crate::facade::Client;
use crate::job::{ Job, JobState, DEFAULT_COMPLETE_MAX_WAIT, DEFAULT_POLL_INTERVAL };
use std::path::Path;
use std::time::Duration;

/// `POST video/queue`, parsing the response into a [`Job`] snapshot.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn queue( client : &Client, request : serde_json::Value ) -> Result< Job, Error >
{
  let body = client.post( "video/queue", Some( request ) ).await?;
  Ok( Job::from_json( &body ) )
}

/// `POST video/retrieve`, a single (non-polling) status check.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn retrieve( client : &Client, job_id : &str ) -> Result< Job, Error >
{
  client.video_retrieve( job_id ).await
}

/// `POST video/quote`, a cost estimate for a not-yet-queued generation request.
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn quote( client : &Client, request : serde_json::Value ) -> Result< serde_json::Value, Error >
{
  client.post( "video/quote", Some( request ) ).await
}

/// `POST video/complete`, signalling an externally-driven completion (used by
/// some provider flows in place of polling `retrieve`).
///
/// # Errors
///
/// Per §7 propagation policy.
pub async fn complete( client : &Client, request : serde_json::Value ) -> Result< Job, Error >
{
  let body = client.post( "video/complete", Some( request ) ).await?;
  Ok( Job::from_json( &body ) )
}

/// Queue a video generation and poll until it reaches a terminal state, per
/// §4.6's queue→poll→terminal lifecycle. Equivalent to calling [`queue`] then
/// [`crate::job::wait`] with the default poll interval and `max_wait`.
///
/// # Errors
///
/// Whatever [`queue`] or [`crate::job::wait`] raise.
pub async fn generate_and_wait< F >( client : &Client, request : serde_json::Value, on_update : F ) -> Result< Job, Error >
where
  F : FnMut( &Job ),
{
  let queued = queue( client, request ).await?;
  if queued.state.is_terminal()
  {
    return Ok( queued );
  }
  crate::job::wait( client, &queued.job_id, DEFAULT_POLL_INTERVAL, Some( DEFAULT_COMPLETE_MAX_WAIT ), on_update ).await
}

/// Poll an already-queued job until it reaches a terminal state.
///
/// # Errors
///
/// Whatever [`crate::job::wait`] raises.
pub async fn wait< F >( client : &Client, job_id : &str, poll_interval : Duration, max_wait : Option< Duration >, on_update : F ) -> Result< Job, Error >
where
  F : FnMut( &Job ),
{
  crate::job::wait( client, job_id, poll_interval, max_wait, on_update ).await
}

/// Download a completed job's artifact to `path`.
///
/// # Errors
///
/// [`crate::error::ErrorKind::InvalidRequest`] if `job` is not `Completed`;
/// transport/I/O errors otherwise.
pub async fn download( client : &Client, job : &Job, path : &Path ) -> Result< (), Error >
{
  job.download( client, path ).await
}

/// Whether `job` has reached a state this module's callers should stop polling for.
#[ must_use ]
pub fn is_terminal( job : &Job ) -> bool
{
  matches!( job.state, JobState::Completed | JobState::Failed )
}
