//! Endpoint facade (§4.7).
//!
//! A thin dispatcher exposing `get`/`post`/`stream`/`post_raw` plus the
//! per-service namespaces listed in §6; every endpoint wrapper is declarative
//! — it builds a path and/or body and forwards to one of these primitives.
//! No per-endpoint schema validation is performed beyond what
//! `serde_json::Value` gives for free (explicit non-goal, §1).

mod private
{
  use crate::config::Config;
  use crate::error::Error;
  use crate::http::{ Engine, RequestDescriptor };
  use crate::metrics::Recorder;
  use crate::sse::{ FrameDecoder, ParsedIter };
  use bytes::Bytes;
  use futures_util::StreamExt;
  use std::path::Path;

  /// The public entry point: owns the [`Engine`] (connection pool + retry
  /// policy) and the shared [`Recorder`], and exposes the primitives every
  /// endpoint wrapper rides on.
  #[ derive( Debug ) ]
  pub struct Client
  {
    engine : Engine,
  }

  impl Client
  {
    /// Build a client from an already-resolved [`Config`].
    ///
    /// # Errors
    ///
    /// Whatever [`Engine::new`] returns.
    pub fn new( config : Config ) -> Result< Self, Error >
    {
      Ok( Self { engine : Engine::new( config )? } )
    }

    /// Build a client by resolving configuration from the layered sources (§4.1).
    ///
    /// # Errors
    ///
    /// [`crate::error::ErrorKind::Config`] if resolution fails.
    pub fn from_env( explicit : &crate::config::ExplicitSource ) -> Result< Self, Error >
    {
      Self::new( crate::config::resolve_config( explicit )? )
    }

    /// The resolved configuration this client was built from.
    #[ must_use ]
    pub fn config( &self ) -> &Config
    {
      self.engine.config()
    }

    /// The shared rate-limit metrics recorder.
    #[ must_use ]
    pub fn metrics( &self ) -> &Recorder
    {
      self.engine.metrics()
    }

    /// `GET path` with optional query parameters, decoded as JSON.
    ///
    /// # Errors
    ///
    /// Per §7 propagation policy for the resulting status/transport outcome.
    pub async fn get( &self, path : &str, query : Option< Vec< ( String, String ) > > ) -> Result< serde_json::Value, Error >
    {
      let mut req = RequestDescriptor::get( path );
      if let Some( query ) = query
      {
        req = req.with_query( query );
      }
      self.engine.execute( req ).await?.into_json()
    }

    /// `POST path` with an optional JSON body, decoded as JSON.
    ///
    /// # Errors
    ///
    /// Per §7 propagation policy for the resulting status/transport outcome.
    pub async fn post( &self, path : &str, body : Option< serde_json::Value > ) -> Result< serde_json::Value, Error >
    {
      let req = RequestDescriptor::post( path, body );
      self.engine.execute( req ).await?.into_json()
    }

    /// `DELETE path`, decoded as JSON (the revoke-key endpoint's only consumer today).
    ///
    /// # Errors
    ///
    /// Per §7 propagation policy for the resulting status/transport outcome.
    pub async fn delete( &self, path : &str ) -> Result< serde_json::Value, Error >
    {
      let req = RequestDescriptor::delete( path );
      self.engine.execute( req ).await?.into_json()
    }

    /// `POST path` with an optional JSON body, returning the raw response
    /// bytes (audio, binary downloads) rather than decoding JSON.
    ///
    /// # Errors
    ///
    /// Per §7 propagation policy for the resulting status/transport outcome.
    pub async fn post_raw( &self, path : &str, body : Option< serde_json::Value > ) -> Result< Bytes, Error >
    {
      let req = RequestDescriptor::post( path, body );
      Ok( self.engine.execute( req ).await?.into_bytes() )
    }

    /// `POST path` with a streaming (SSE) response, yielding parsed JSON
    /// chunks (§4.4's "parsed" mode). See [`Client::stream_raw`] for the
    /// "raw" string-payload mode over the same byte stream.
    ///
    /// # Errors
    ///
    /// Whatever opening the stream raises (§4.3). Once opened, a malformed
    /// frame surfaces as a single `Err` item from the returned stream —
    /// `DecodeError` is never retried (§7) — but iteration continues past it;
    /// the underlying byte stream keeps being consumed for subsequent frames.
    pub async fn stream( &self, path : &str, body : Option< serde_json::Value > ) -> Result< impl futures_util::Stream< Item = Result< serde_json::Value, Error > >, Error >
    {
      let req = RequestDescriptor::post( path, body ).with_stream( true );
      let byte_stream = self.engine.execute_stream( req ).await?;
      Ok( decode_parsed( byte_stream ) )
    }

    /// `POST path` with a streaming (SSE) response, yielding the raw joined
    /// `data:` payload string per event.
    ///
    /// # Errors
    ///
    /// Whatever opening the stream raises (§4.3).
    pub async fn stream_raw( &self, path : &str, body : Option< serde_json::Value > ) -> Result< impl futures_util::Stream< Item = String >, Error >
    {
      let req = RequestDescriptor::post( path, body ).with_stream( true );
      let byte_stream = self.engine.execute_stream( req ).await?;
      Ok( decode_raw( byte_stream ) )
    }

    /// Stream the bytes at `url` (an artifact URL returned by a completed
    /// video job) into a file at `path`, without buffering the whole body in
    /// memory.
    ///
    /// # Errors
    ///
    /// Transport errors from fetching `url`, or I/O errors writing `path`.
    pub async fn download_artifact( &self, url : &str, path : &Path ) -> Result< (), Error >
    {
      use crate::error::ErrorKind;
      use tokio::io::AsyncWriteExt;

      let response = reqwest::get( url ).await
        .map_err( | e | Error::new( ErrorKind::Connection, format!( "failed to fetch artifact: {e}" ) ).with_source( e ) )?;
      let status = response.status();
      if !status.is_success()
      {
        return Err( Error::new( ErrorKind::ServerError, format!( "artifact download failed with HTTP {status}" ) ).with_status( status.as_u16() ) );
      }

      let mut file = tokio::fs::File::create( path ).await
        .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to create {}: {e}", path.display() ) ) )?;

      let mut stream = response.bytes_stream();
      while let Some( chunk ) = stream.next().await
      {
        let chunk = chunk.map_err( | e | Error::new( ErrorKind::Connection, format!( "artifact download interrupted: {e}" ) ).with_source( e ) )?;
        file.write_all( &chunk ).await
          .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to write {}: {e}", path.display() ) ) )?;
      }
      Ok( () )
    }

    pub( crate ) async fn video_retrieve( &self, job_id : &str ) -> Result< crate::job::Job, Error >
    {
      let body = self.post( "video/retrieve", Some( serde_json::json!( { "job_id" : job_id } ) ) ).await?;
      Ok( crate::job::Job::from_json( &body ) )
    }
  }

  fn decode_raw( byte_stream : impl futures_util::Stream< Item = Result< Bytes, Error > > ) -> impl futures_util::Stream< Item = String >
  {
    async_stream_raw( byte_stream )
  }

  fn decode_parsed( byte_stream : impl futures_util::Stream< Item = Result< Bytes, Error > > ) -> impl futures_util::Stream< Item = Result< serde_json::Value, Error > >
  {
    async_stream_parsed( byte_stream )
  }

  fn async_stream_raw( byte_stream : impl futures_util::Stream< Item = Result< Bytes, Error > > ) -> impl futures_util::Stream< Item = String >
  {
    futures_util::stream::unfold(
      ( Box::pin( byte_stream ), FrameDecoder::new() ),
      | ( mut stream, mut decoder ) | async move
      {
        loop
        {
          if let Some( event ) = decoder.next_event()
          {
            return Some( ( event.data, ( stream, decoder ) ) );
          }
          if decoder.is_done()
          {
            return None;
          }
          match stream.next().await
          {
            Some( Ok( bytes ) ) => decoder.push( &bytes ),
            Some( Err( _ ) ) | None => return None,
          }
        }
      }
    )
  }

  fn async_stream_parsed( byte_stream : impl futures_util::Stream< Item = Result< Bytes, Error > > ) -> impl futures_util::Stream< Item = Result< serde_json::Value, Error > >
  {
    futures_util::stream::unfold(
      ( Box::pin( byte_stream ), ParsedIter::new( FrameDecoder::new() ) ),
      | ( mut stream, mut iter ) | async move
      {
        loop
        {
          if let Some( item ) = iter.next()
          {
            return Some( ( item, ( stream, iter ) ) );
          }
          if iter.is_done()
          {
            return None;
          }
          match stream.next().await
          {
            Some( Ok( bytes ) ) => iter.push( &bytes ),
            Some( Err( e ) ) => return Some( ( Err( e ), ( stream, iter ) ) ),
            None => return None,
          }
        }
      }
    )
  }
}

pub use private::Client;
