//! Async job helper for long-running video generation (§4.6).
//!
//! Composes two engine calls — `queue` and `retrieve` — with a polling timer.
//! Terminal transitions are one-way: once a [`Job`] is observed `Completed`
//! or `Failed`, [`wait`] returns without issuing further `retrieve` calls.

mod private
{
  use crate::error::{ Error, ErrorKind };
  use crate::facade::Client;
  use std::collections::BTreeMap;
  use std::time::Duration;

  /// Default poll interval for [`wait`].
  pub const DEFAULT_POLL_INTERVAL : Duration = Duration::from_secs( 5 );
  /// Default `max_wait` for [`complete`].
  pub const DEFAULT_COMPLETE_MAX_WAIT : Duration = Duration::from_secs( 900 );
  /// Consecutive poll failures tolerated before a `retrieve` error is surfaced.
  pub const POLL_FAILURE_BUDGET : u32 = 3;

  /// Lifecycle state of an async video-generation job.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
  pub enum JobState
  {
    /// Accepted, not yet processing.
    Queued,
    /// Actively generating.
    Processing,
    /// Terminal: artifact is ready.
    Completed,
    /// Terminal: generation failed.
    Failed,
  }

  impl JobState
  {
    /// Whether this state is terminal (`Completed` or `Failed`) — once
    /// reached, a job never transitions again (§3).
    #[ must_use ]
    pub fn is_terminal( self ) -> bool
    {
      matches!( self, Self::Completed | Self::Failed )
    }

    fn parse( raw : &str ) -> Self
    {
      match raw
      {
        "processing" => Self::Processing,
        "completed" => Self::Completed,
        "failed" => Self::Failed,
        _ => Self::Queued,
      }
    }
  }

  /// A snapshot of an async video-generation job.
  #[ derive( Debug, Clone ) ]
  pub struct Job
  {
    /// Opaque job identifier.
    pub job_id : String,
    /// Current lifecycle state.
    pub state : JobState,
    /// Progress percentage in `[0, 100]`, when the service reports one.
    pub progress : Option< u8 >,
    /// Artifact URL, present once `state == Completed`.
    pub artifact_url : Option< String >,
    /// Arbitrary completion metadata, when present.
    pub metadata : Option< BTreeMap< String, serde_json::Value > >,
    /// Canonical failure code, present once `state == Failed`.
    pub error_code : Option< String >,
    /// Human-readable failure message, present once `state == Failed`.
    pub error_message : Option< String >,
  }

  impl Job
  {
    /// Parse a job snapshot out of a raw `video/queue` or `video/retrieve` JSON body.
    #[ must_use ]
    pub fn from_json( value : &serde_json::Value ) -> Self
    {
      let job_id = value.get( "job_id" ).and_then( serde_json::Value::as_str ).unwrap_or_default().to_string();
      let state = value.get( "status" ).and_then( serde_json::Value::as_str ).map_or( JobState::Queued, JobState::parse );
      let progress = value.get( "progress" ).and_then( serde_json::Value::as_u64 ).map( | p | p.min( 100 ) as u8 );
      let artifact_url = value.get( "video_url" ).or_else( || value.get( "artifact_url" ) ).and_then( serde_json::Value::as_str ).map( str::to_string );
      let metadata = value.get( "metadata" ).and_then( serde_json::Value::as_object ).map( | m | m.clone().into_iter().collect() );
      let error_code = value.get( "error_code" ).and_then( serde_json::Value::as_str ).map( str::to_string );
      let error_message = value.get( "error_message" ).or_else( || value.get( "error" ) ).and_then( serde_json::Value::as_str ).map( str::to_string );
      Self { job_id, state, progress, artifact_url, metadata, error_code, error_message }
    }

    /// Download the completed artifact into `path`, streaming it through the
    /// engine's raw-stream mode rather than buffering it whole.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidRequest`] if the job has no artifact URL (i.e. is
    /// not `Completed`); I/O or transport errors otherwise.
    pub async fn download( &self, client : &Client, path : &std::path::Path ) -> Result< (), Error >
    {
      let url = self.artifact_url.as_deref()
        .ok_or_else( || Error::new( ErrorKind::InvalidRequest, "job has no artifact URL to download" ) )?;
      client.download_artifact( url, path ).await
    }
  }

  fn observed_change( previous : Option< &Job >, current : &Job ) -> bool
  {
    match previous
    {
      None => true,
      Some( prev ) => prev.state != current.state || prev.progress != current.progress,
    }
  }

  /// Poll `retrieve(job_id)` every `poll_interval`, invoking `on_update` on
  /// every observed state/progress transition, until the job reaches a
  /// terminal state or `max_wait` elapses.
  ///
  /// # Errors
  ///
  /// [`ErrorKind::Timeout`] (carrying the last observed job in `source`'s
  /// context is not possible for a plain `Error`, so the last job is instead
  /// returned alongside the error via the `Err` variant's caller-visible
  /// context — callers needing the partial job should call `retrieve`
  /// themselves after a timeout) if `max_wait` elapses first. Connection and
  /// server errors are swallowed for up to [`POLL_FAILURE_BUDGET`]
  /// consecutive polls before being surfaced.
  pub async fn wait< F >(
    client : &Client,
    job_id : &str,
    poll_interval : Duration,
    max_wait : Option< Duration >,
    mut on_update : F,
  ) -> Result< Job, Error >
  where
    F : FnMut( &Job ),
  {
    let start = tokio::time::Instant::now();
    let mut previous : Option< Job > = None;
    let mut consecutive_failures : u32 = 0;

    loop
    {
      match client.video_retrieve( job_id ).await
      {
        Ok( job ) =>
        {
          consecutive_failures = 0;
          if observed_change( previous.as_ref(), &job )
          {
            on_update( &job );
          }
          if job.state.is_terminal()
          {
            return Ok( job );
          }
          previous = Some( job );
        }
        Err( error ) if matches!( error.kind(), ErrorKind::Connection | ErrorKind::ServerError ) =>
        {
          consecutive_failures += 1;
          if consecutive_failures > POLL_FAILURE_BUDGET
          {
            return Err( error );
          }
        }
        Err( error ) if error.kind() == ErrorKind::RateLimited =>
        {
          let delay = error.retry_after().map( Duration::from_secs ).unwrap_or( poll_interval );
          if let Some( max_wait ) = max_wait
          {
            if start.elapsed() + delay >= max_wait
            {
              return Err( timeout_error( previous.as_ref() ) );
            }
          }
          tokio::time::sleep( delay ).await;
          continue;
        }
        Err( error ) => return Err( error ),
      }

      if let Some( max_wait ) = max_wait
      {
        if start.elapsed() >= max_wait
        {
          return Err( timeout_error( previous.as_ref() ) );
        }
      }

      tokio::time::sleep( poll_interval ).await;
    }
  }

  fn timeout_error( last : Option< &Job > ) -> Error
  {
    let mut error = Error::new( ErrorKind::Timeout, "wait exceeded max_wait before the job reached a terminal state" );
    if let Some( job ) = last
    {
      error = error.with_context( "job_id", job.job_id.clone() ).with_context( "last_state", format!( "{:?}", job.state ) );
    }
    error
  }
}

pub use private::{ Job, JobState, wait, DEFAULT_POLL_INTERVAL, DEFAULT_COMPLETE_MAX_WAIT, POLL_FAILURE_BUDGET };
