//! Canonical error taxonomy for the Venice transport core.
//!
//! Every fallible operation in this crate returns [`Error`], which carries a
//! classification ([`ErrorKind`]), the originating HTTP status when one exists,
//! the service's canonical error code when the body carried one, a small
//! context map (method, path, request id, retry-after, …) and, where
//! available, the underlying cause for diagnostics.

mod private
{
  use std::collections::BTreeMap;
  use std::fmt;

  /// Classification of a transport-core failure.
  ///
  /// `ModelNotFound` and `CharacterNotFound` are the two canonical sub-kinds
  /// of a 404; `Timeout` is the sub-kind the async job helper raises when
  /// [`crate::job::wait`] exceeds `max_wait` and is treated as a `ServerError`
  /// for retry-policy purposes.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
  pub enum ErrorKind
  {
    /// Config construction failed (missing or invalid field).
    Config,
    /// Transport-level failure before any HTTP response was received.
    Connection,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 429.
    RateLimited,
    /// HTTP 404 with canonical code `MODEL_NOT_FOUND`.
    ModelNotFound,
    /// HTTP 404 with canonical code `CHARACTER_NOT_FOUND`.
    CharacterNotFound,
    /// Any other 4xx.
    InvalidRequest,
    /// 5xx that exhausted the retry policy.
    ServerError,
    /// The async job helper's `wait` loop exceeded `max_wait`.
    Timeout,
    /// Body was not valid JSON when JSON was required, or an SSE frame was malformed.
    Decode,
  }

  impl ErrorKind
  {
    /// Short machine-readable label, used when no canonical service code is known.
    #[ must_use ]
    pub fn label( self ) -> &'static str
    {
      match self
      {
        Self::Config => "CONFIG_ERROR",
        Self::Connection => "CONNECTION_ERROR",
        Self::Unauthorized => "UNAUTHORIZED",
        Self::RateLimited => "RATE_LIMITED",
        Self::ModelNotFound => "MODEL_NOT_FOUND",
        Self::CharacterNotFound => "CHARACTER_NOT_FOUND",
        Self::InvalidRequest => "INVALID_REQUEST",
        Self::ServerError => "SERVER_ERROR",
        Self::Timeout => "TIMEOUT",
        Self::Decode => "DECODE_ERROR",
      }
    }

    /// Whether the HTTP engine's retry policy should retry a failure of this kind.
    ///
    /// `Unauthorized`, `InvalidRequest`, `ModelNotFound`, `CharacterNotFound` and
    /// `Decode` are never retried (§7 propagation policy); the engine decides
    /// `Connection`/`RateLimited`/`ServerError` retries against the configured
    /// `retry_status_codes`, this flag only documents the taxonomy-level intent.
    #[ must_use ]
    pub fn is_retryable_kind( self ) -> bool
    {
      matches!( self, Self::Connection | Self::RateLimited | Self::ServerError )
    }
  }

  impl fmt::Display for ErrorKind
  {
    fn fmt( &self, f : &mut fmt::Formatter< '_ > ) -> fmt::Result
    {
      f.write_str( self.label() )
    }
  }

  /// A single transport-core error.
  ///
  /// Constructed with [`Error::new`] and refined with the `with_*` builder
  /// methods; every field beyond `kind` and `message` is optional.
  #[ derive( Debug ) ]
  pub struct Error
  {
    kind : ErrorKind,
    status : Option< u16 >,
    code : Option< String >,
    message : String,
    context : BTreeMap< String, String >,
    source : Option< Box< dyn std::error::Error + Send + Sync + 'static > >,
  }

  impl Error
  {
    /// Start building an error of the given kind.
    #[ must_use ]
    pub fn new( kind : ErrorKind, message : impl Into< String > ) -> Self
    {
      Self
      {
        kind,
        status : None,
        code : None,
        message : message.into(),
        context : BTreeMap::new(),
        source : None,
      }
    }

    /// Attach the originating HTTP status code.
    #[ must_use ]
    pub fn with_status( mut self, status : u16 ) -> Self
    {
      self.status = Some( status );
      self
    }

    /// Attach the service's canonical error code (from body `error.code`).
    #[ must_use ]
    pub fn with_code( mut self, code : impl Into< String > ) -> Self
    {
      self.code = Some( code.into() );
      self
    }

    /// Insert a context entry (method, path, request id, `retry_after`, …).
    #[ must_use ]
    pub fn with_context( mut self, key : impl Into< String >, value : impl Into< String > ) -> Self
    {
      self.context.insert( key.into(), value.into() );
      self
    }

    /// Attach the underlying cause, preserved for `std::error::Error::source`.
    #[ must_use ]
    pub fn with_source( mut self, source : impl std::error::Error + Send + Sync + 'static ) -> Self
    {
      self.source = Some( Box::new( source ) );
      self
    }

    /// The error's classification.
    #[ must_use ]
    pub fn kind( &self ) -> ErrorKind
    {
      self.kind
    }

    /// The originating HTTP status, if any.
    #[ must_use ]
    pub fn status( &self ) -> Option< u16 >
    {
      self.status
    }

    /// The canonical service error code, if known.
    #[ must_use ]
    pub fn code( &self ) -> Option< &str >
    {
      self.code.as_deref()
    }

    /// Human-readable message (without the surrounding context/status decoration).
    #[ must_use ]
    pub fn message( &self ) -> &str
    {
      &self.message
    }

    /// The full context map.
    #[ must_use ]
    pub fn context( &self ) -> &BTreeMap< String, String >
    {
      &self.context
    }

    /// The `retry_after` context entry, parsed as whole seconds, when present.
    #[ must_use ]
    pub fn retry_after( &self ) -> Option< u64 >
    {
      self.context.get( "retry_after" ).and_then( | v | v.parse().ok() )
    }
  }

  impl fmt::Display for Error
  {
    /// Renders `"[CODE] message (HTTP S; Context: k=v, …)"` per §4.2.
    ///
    /// `CODE` falls back to the kind's label when no canonical service code
    /// is known; the `(HTTP …; Context: …)` suffix is omitted piecewise when
    /// there is no status and/or no context entries.
    fn fmt( &self, f : &mut fmt::Formatter< '_ > ) -> fmt::Result
    {
      let code = self.code.as_deref().unwrap_or_else( || self.kind.label() );
      write!( f, "[{code}] {}", self.message )?;

      let has_status = self.status.is_some();
      let has_context = !self.context.is_empty();
      if !has_status && !has_context
      {
        return Ok( () );
      }

      f.write_str( " (" )?;
      if let Some( status ) = self.status
      {
        write!( f, "HTTP {status}" )?;
        if has_context
        {
          f.write_str( "; " )?;
        }
      }
      if has_context
      {
        f.write_str( "Context: " )?;
        let mut first = true;
        for ( k, v ) in &self.context
        {
          if !first
          {
            f.write_str( ", " )?;
          }
          write!( f, "{k}={v}" )?;
          first = false;
        }
      }
      f.write_str( ")" )
    }
  }

  impl std::error::Error for Error
  {
    fn source( &self ) -> Option< &( dyn std::error::Error + 'static ) >
    {
      self.source.as_ref().map( | b | b.as_ref() as &( dyn std::error::Error + 'static ) )
    }
  }

  #[ cfg( feature = "enabled" ) ]
  impl From< reqwest::Error > for Error
  {
    fn from( err : reqwest::Error ) -> Self
    {
      // Only transport-level failures (connect/timeout/builder, no response
      // received) reach this conversion; status-bearing responses are
      // classified by the engine via `classify_status` instead.
      let message = err.to_string();
      Self::new( ErrorKind::Connection, message ).with_source( err )
    }
  }

  #[ cfg( feature = "enabled" ) ]
  impl From< serde_json::Error > for Error
  {
    fn from( err : serde_json::Error ) -> Self
    {
      let message = err.to_string();
      Self::new( ErrorKind::Decode, message ).with_source( err )
    }
  }

  /// Classify an HTTP status (and, for 404, the body's canonical `error.code`)
  /// into an [`ErrorKind`] per the §4.2 / §8-invariant-4 mapping table.
  #[ must_use ]
  pub fn classify_status( status : u16, canonical_code : Option< &str > ) -> ErrorKind
  {
    match status
    {
      401 => ErrorKind::Unauthorized,
      429 => ErrorKind::RateLimited,
      404 => match canonical_code
      {
        Some( "MODEL_NOT_FOUND" ) => ErrorKind::ModelNotFound,
        Some( "CHARACTER_NOT_FOUND" ) => ErrorKind::CharacterNotFound,
        _ => ErrorKind::InvalidRequest,
      },
      400..=499 => ErrorKind::InvalidRequest,
      500..=599 => ErrorKind::ServerError,
      _ => ErrorKind::InvalidRequest,
    }
  }

  /// Truncate an offending byte preview for `DecodeError` context, per §7.
  #[ must_use ]
  pub fn bounded_preview( bytes : &[ u8 ], max : usize ) -> String
  {
    let text = String::from_utf8_lossy( bytes );
    if text.len() <= max
    {
      text.into_owned()
    }
    else
    {
      let mut truncated : String = text.chars().take( max ).collect();
      truncated.push_str( "…" );
      truncated
    }
  }

  #[ cfg( test ) ]
  mod tests
  {
    use super::*;

    #[ test ]
    fn classify_status_matches_the_mapping_table()
    {
      // §8 invariant 4.
      assert_eq!( classify_status( 401, None ), ErrorKind::Unauthorized );
      assert_eq!( classify_status( 429, None ), ErrorKind::RateLimited );
      assert_eq!( classify_status( 404, Some( "MODEL_NOT_FOUND" ) ), ErrorKind::ModelNotFound );
      assert_eq!( classify_status( 404, Some( "CHARACTER_NOT_FOUND" ) ), ErrorKind::CharacterNotFound );
      assert_eq!( classify_status( 404, None ), ErrorKind::InvalidRequest );
      assert_eq!( classify_status( 422, None ), ErrorKind::InvalidRequest );
      assert_eq!( classify_status( 503, None ), ErrorKind::ServerError );
    }

    #[ test ]
    fn display_renders_code_status_and_context()
    {
      let error = Error::new( ErrorKind::RateLimited, "too many requests" )
        .with_status( 429 )
        .with_context( "retry_after", "2" )
        .with_context( "path", "models" );
      assert_eq!(
        error.to_string(),
        "[RATE_LIMITED] too many requests (HTTP 429; Context: path=models, retry_after=2)"
      );
    }

    #[ test ]
    fn display_omits_the_parenthetical_when_bare()
    {
      let error = Error::new( ErrorKind::Config, "api_key is required" );
      assert_eq!( error.to_string(), "[CONFIG_ERROR] api_key is required" );
    }

    #[ test ]
    fn bounded_preview_truncates_long_bodies()
    {
      let preview = bounded_preview( b"abcdefghij", 4 );
      assert_eq!( preview, "abcd\u{2026}" );
      assert_eq!( bounded_preview( b"ab", 4 ), "ab" );
    }
  }
}

pub use private::{ Error, ErrorKind, classify_status, bounded_preview };
