//! Pooled HTTP request execution (§4.3).
//!
//! [`Engine`] owns the connection pool, attaches auth/content-type/user-agent
//! headers, resolves relative paths against the configured base URL, and
//! dispatches responses by status code into a decoded JSON value, a raw byte
//! stream, or (when [`RequestDescriptor::stream`] is set) an SSE frame
//! stream. [`retry::execute_with_retries`] wraps the single-attempt
//! [`Engine::send_once`] with the bounded, jittered retry policy from §4.3.

pub mod retry;

mod private
{
  use crate::config::Config;
  use crate::error::{ bounded_preview, classify_status, Error, ErrorKind };
  use crate::metrics::Recorder;
  use bytes::Bytes;
  use reqwest::header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT };
  use std::sync::Arc;
  use std::time::Duration;

  /// Stable `User-Agent` sent with every request.
  pub const USER_AGENT_VALUE : &str = concat!( "api_venice/", env!( "CARGO_PKG_VERSION" ) );

  /// HTTP method of a [`RequestDescriptor`]; the core only ever issues
  /// GET/POST/DELETE (the key-revocation endpoint is the sole DELETE).
  #[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
  pub enum Method
  {
    /// GET.
    Get,
    /// POST.
    Post,
    /// DELETE.
    Delete,
  }

  impl Method
  {
    fn as_reqwest( self ) -> reqwest::Method
    {
      match self
      {
        Self::Get => reqwest::Method::GET,
        Self::Post => reqwest::Method::POST,
        Self::Delete => reqwest::Method::DELETE,
      }
    }

    /// The method name as sent on the wire / recorded into metrics and context.
    #[ must_use ]
    pub fn as_str( self ) -> &'static str
    {
      match self
      {
        Self::Get => "GET",
        Self::Post => "POST",
        Self::Delete => "DELETE",
      }
    }
  }

  /// A single request the facade wants the engine to execute.
  #[ derive( Debug, Clone ) ]
  pub struct RequestDescriptor
  {
    /// HTTP method.
    pub method : Method,
    /// Path relative to `base_url` (no leading slash expected, but tolerated).
    pub path : String,
    /// Optional query parameters.
    pub query : Option< Vec< ( String, String ) > >,
    /// Optional JSON request body.
    pub body : Option< serde_json::Value >,
    /// Per-call timeout override; falls back to `Config::timeout`.
    pub timeout_override : Option< Duration >,
    /// Whether this is a streaming (SSE) request.
    pub stream : bool,
  }

  impl RequestDescriptor
  {
    /// A GET request with no body and no streaming.
    #[ must_use ]
    pub fn get( path : impl Into< String > ) -> Self
    {
      Self { method : Method::Get, path : path.into(), query : None, body : None, timeout_override : None, stream : false }
    }

    /// A POST request carrying a JSON body.
    #[ must_use ]
    pub fn post( path : impl Into< String >, body : Option< serde_json::Value > ) -> Self
    {
      Self { method : Method::Post, path : path.into(), query : None, body, timeout_override : None, stream : false }
    }

    /// A DELETE request with no body.
    #[ must_use ]
    pub fn delete( path : impl Into< String > ) -> Self
    {
      Self { method : Method::Delete, path : path.into(), query : None, body : None, timeout_override : None, stream : false }
    }

    /// Attach query parameters.
    #[ must_use ]
    pub fn with_query( mut self, query : Vec< ( String, String ) > ) -> Self
    {
      self.query = Some( query );
      self
    }

    /// Mark this descriptor as a streaming (SSE) request.
    #[ must_use ]
    pub fn with_stream( mut self, stream : bool ) -> Self
    {
      self.stream = stream;
      self
    }

    /// Override the per-call timeout.
    #[ must_use ]
    pub fn with_timeout( mut self, timeout : Duration ) -> Self
    {
      self.timeout_override = Some( timeout );
      self
    }
  }

  /// Decoded body of a completed, non-streaming response.
  #[ derive( Debug, Clone ) ]
  pub enum Body
  {
    /// Body decoded as JSON.
    Json( serde_json::Value ),
    /// Raw bytes, for non-JSON payloads (audio, binary downloads).
    Raw( Bytes ),
  }

  /// A completed response, consumed once by the caller.
  #[ derive( Debug, Clone ) ]
  pub struct ResponseEnvelope
  {
    /// HTTP status code.
    pub status : u16,
    /// Response headers (case-insensitive lookup via `reqwest::header::HeaderMap`).
    pub headers : HeaderMap,
    /// The decoded (or raw) body.
    pub body : Body,
  }

  impl ResponseEnvelope
  {
    /// Take the body as JSON, raising [`ErrorKind::Decode`] if it was raw bytes.
    pub fn into_json( self ) -> Result< serde_json::Value, Error >
    {
      match self.body
      {
        Body::Json( value ) => Ok( value ),
        Body::Raw( bytes ) => Err( Error::new( ErrorKind::Decode, format!( "expected JSON body, got raw bytes: {}", bounded_preview( &bytes, 200 ) ) ) ),
      }
    }

    /// Take the body as raw bytes, re-serializing JSON back to bytes if that's what was decoded.
    #[ must_use ]
    pub fn into_bytes( self ) -> Bytes
    {
      match self.body
      {
        Body::Json( value ) => Bytes::from( value.to_string() ),
        Body::Raw( bytes ) => bytes,
      }
    }
  }

  /// Outcome of a single (non-retried) HTTP attempt, as seen by the retry loop.
  pub( crate ) enum Attempt
  {
    /// A response was received (any status).
    Response { status : u16, headers : HeaderMap, bytes : Bytes },
    /// No response was received — DNS/TLS/connect/timeout failure.
    Transport( Error ),
  }

  /// Owns the connection pool and issues requests against `Config::base_url`.
  #[ derive( Debug ) ]
  pub struct Engine
  {
    client : reqwest::Client,
    config : Config,
    metrics : Arc< Recorder >,
  }

  impl Engine
  {
    /// Build a new engine from a resolved [`Config`].
    ///
    /// # Errors
    ///
    /// [`ErrorKind::Config`] if the underlying HTTP client cannot be built
    /// (invalid TLS configuration, unsupported platform, …).
    pub fn new( config : Config ) -> Result< Self, Error >
    {
      let client = reqwest::Client::builder()
        .pool_max_idle_per_host( config.pool_maxsize() )
        .pool_idle_timeout( Duration::from_secs( 90 ) )
        .timeout( config.timeout() )
        .build()
        .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to build HTTP client: {e}" ) ) )?;

      // pool_connections is a sizing *hint* (min warm connections); reqwest
      // only exposes a max-idle knob, so it folds into the same setting when
      // it is the larger of the two (never shrinks below what was configured).
      let _ = config.pool_connections();

      Ok( Self { client, config, metrics : Arc::new( Recorder::default() ) } )
    }

    /// The resolved configuration this engine was built from.
    #[ must_use ]
    pub fn config( &self ) -> &Config
    {
      &self.config
    }

    /// The shared rate-limit metrics recorder.
    #[ must_use ]
    pub fn metrics( &self ) -> &Recorder
    {
      &self.metrics
    }

    fn resolve_url( &self, path : &str, query : Option< &[ ( String, String ) ] > ) -> Result< url::Url, Error >
    {
      let base = url::Url::parse( self.config.base_url() )
        .map_err( | e | Error::new( ErrorKind::Config, format!( "invalid base_url: {e}" ) ) )?;
      let joined = base.join( &format!( "{}/{}", base.path().trim_end_matches( '/' ), path.trim_start_matches( '/' ) ) )
        .map_err( | e | Error::new( ErrorKind::Config, format!( "invalid path {path:?}: {e}" ) ) )?;
      let mut url = joined;
      if let Some( query ) = query
      {
        let mut pairs = url.query_pairs_mut();
        for ( k, v ) in query
        {
          pairs.append_pair( k, v );
        }
      }
      Ok( url )
    }

    fn headers_for( &self, has_body : bool, stream : bool ) -> Result< HeaderMap, Error >
    {
      let mut headers = HeaderMap::new();
      let auth = format!( "Bearer {}", self.config.api_key() );
      let auth_value = HeaderValue::from_str( &auth )
        .map_err( | e | Error::new( ErrorKind::Config, format!( "api_key is not a valid header value: {e}" ) ) )?;
      headers.insert( AUTHORIZATION, auth_value );
      if has_body
      {
        headers.insert( CONTENT_TYPE, HeaderValue::from_static( "application/json" ) );
      }
      if stream
      {
        headers.insert( reqwest::header::ACCEPT, HeaderValue::from_static( "text/event-stream" ) );
      }
      headers.insert( USER_AGENT, HeaderValue::from_static( USER_AGENT_VALUE ) );
      Ok( headers )
    }

    /// Issue exactly one HTTP attempt; never retries, never decodes the body
    /// into JSON (the retry loop / streaming caller decide that).
    pub( crate ) async fn send_once( &self, req : &RequestDescriptor ) -> Attempt
    {
      let url = match self.resolve_url( &req.path, req.query.as_deref() )
      {
        Ok( url ) => url,
        Err( e ) => return Attempt::Transport( e ),
      };
      let headers = match self.headers_for( req.body.is_some(), req.stream )
      {
        Ok( h ) => h,
        Err( e ) => return Attempt::Transport( e ),
      };

      let mut builder = self.client.request( req.method.as_reqwest(), url.clone() ).headers( headers );
      if let Some( timeout ) = req.timeout_override
      {
        builder = builder.timeout( timeout );
      }
      if let Some( body ) = &req.body
      {
        builder = builder.json( body );
      }

      match builder.send().await
      {
        Ok( response ) =>
        {
          let status = response.status().as_u16();
          let headers = response.headers().clone();
          match response.bytes().await
          {
            Ok( bytes ) => Attempt::Response { status, headers, bytes },
            Err( source ) => Attempt::Transport(
              Error::new( ErrorKind::Connection, format!( "failed to read response body: {source}" ) )
                .with_context( "method", req.method.as_str() )
                .with_context( "path", req.path.clone() )
                .with_source( source )
            ),
          }
        }
        Err( source ) =>
        {
          let reason = if source.is_timeout() { "deadline" } else { "connect" };
          Attempt::Transport(
            Error::new( ErrorKind::Connection, format!( "request failed: {source}" ) )
              .with_context( "method", req.method.as_str() )
              .with_context( "path", req.path.clone() )
              .with_context( "reason", reason )
              .with_source( source )
          )
        }
      }
    }

    /// Execute a non-streaming request through the full retry policy (§4.3).
    ///
    /// # Errors
    ///
    /// See §7 propagation policy: the mapped [`ErrorKind`] for the exhausted
    /// or non-retryable failure.
    pub async fn execute( &self, req : RequestDescriptor ) -> Result< ResponseEnvelope, Error >
    {
      retry::execute_with_retries( self, &req ).await
    }

    /// Open a streaming request and return the raw byte stream for the SSE
    /// decoder to consume. Opening a stream is a single attempt: unlike
    /// [`Engine::execute`], this does not go through
    /// [`retry::execute_with_retries`], so a non-2xx status or transport
    /// failure while opening is surfaced immediately with no retry, and a
    /// stream-open 429 is classified into an `Error` but is not recorded into
    /// the rate-limit metrics the way a non-streaming 429 is (`retry.rs`'s
    /// `execute_with_retries` records one; this method does not). Once the
    /// stream is open, the engine never retries it (§4.3).
    ///
    /// # Errors
    ///
    /// Propagates connection/4xx/5xx failures encountered while opening the
    /// stream, mapped per §4.2.
    pub async fn execute_stream( &self, req : RequestDescriptor ) -> Result< impl futures_util::Stream< Item = Result< Bytes, Error > >, Error >
    {
      let mut req = req;
      req.stream = true;

      let url = self.resolve_url( &req.path, req.query.as_deref() )?;
      let headers = self.headers_for( req.body.is_some(), true )?;
      let mut builder = self.client.request( req.method.as_reqwest(), url ).headers( headers );
      if let Some( timeout ) = req.timeout_override
      {
        builder = builder.timeout( timeout );
      }
      if let Some( body ) = &req.body
      {
        builder = builder.json( body );
      }

      let response = builder.send().await.map_err( | source |
      {
        Error::new( ErrorKind::Connection, format!( "failed to open stream: {source}" ) )
          .with_context( "method", req.method.as_str() )
          .with_context( "path", req.path.clone() )
          .with_source( source )
      } )?;

      let status = response.status().as_u16();
      if !( 200..300 ).contains( &status )
      {
        let bytes = response.bytes().await.unwrap_or_default();
        return Err( classify_response_error( status, &bytes, &req, None ) );
      }

      use futures_util::StreamExt;
      let stream = response.bytes_stream().map( | chunk | chunk.map_err( | source | Error::new( ErrorKind::Connection, format!( "stream read failed: {source}" ) ).with_source( source ) ) );
      Ok( stream )
    }
  }

  /// Classify a non-2xx response body into the appropriate [`Error`], per §4.2.
  pub( crate ) fn classify_response_error( status : u16, bytes : &[ u8 ], req : &RequestDescriptor, retry_after : Option< u64 > ) -> Error
  {
    let parsed : Option< serde_json::Value > = serde_json::from_slice( bytes ).ok();
    let code = parsed.as_ref().and_then( | v | v.get( "error" )?.get( "code" )?.as_str() ).map( str::to_string );
    let message = parsed.as_ref()
      .and_then( | v | v.get( "error" )?.get( "message" )?.as_str() )
      .map( str::to_string )
      .unwrap_or_else( || format!( "request failed with HTTP {status}" ) );

    let kind = classify_status( status, code.as_deref() );
    let mut error = Error::new( kind, message )
      .with_status( status )
      .with_context( "method", req.method.as_str() )
      .with_context( "path", req.path.clone() );
    if let Some( code ) = code
    {
      error = error.with_code( code );
    }
    if let Some( retry_after ) = retry_after
    {
      error = error.with_context( "retry_after", retry_after.to_string() );
    }
    error
  }

  /// Extract `Retry-After` as whole delta-seconds; absolute HTTP-date forms
  /// are treated as absent per §9's resolved open question.
  pub( crate ) fn retry_after_seconds( headers : &HeaderMap ) -> Option< u64 >
  {
    headers.get( reqwest::header::RETRY_AFTER )?.to_str().ok()?.trim().parse().ok()
  }

  /// Extract the request id header (`x-request-id`, case-insensitively) if present.
  pub( crate ) fn request_id( headers : &HeaderMap ) -> Option< String >
  {
    headers.get( "x-request-id" ).and_then( | v | v.to_str().ok() ).map( str::to_string )
  }
}

pub use private::{
  Engine, RequestDescriptor, ResponseEnvelope, Body, Method, USER_AGENT_VALUE,
};
pub( crate ) use private::{ Attempt, classify_response_error, retry_after_seconds, request_id };
