//! Layered configuration resolution (§4.1).
//!
//! [`resolve_config`] merges four layers in precedence order — explicit
//! arguments, process environment, a local dotenv file, and (gated on
//! `VENICE_USE_GLOBAL_CONFIG`) a global dotenv under the platform config
//! directory — into an immutable [`Config`]. Each layer is a [`Source`]
//! returning an `Option<String>` per recognized key; coercion to the field's
//! real type happens once, centrally, after the highest-precedence string
//! value has been chosen (never per-layer), per the SPEC_FULL implementation
//! note.

mod private
{
  use crate::error::{ Error, ErrorKind };
  use std::collections::{ BTreeMap, HashSet };
  use std::time::Duration;

  /// Default Venice API base URL.
  pub const DEFAULT_BASE_URL : &str = "https://api.venice.ai/api/v1";
  /// Default request timeout.
  pub const DEFAULT_TIMEOUT : Duration = Duration::from_secs( 30 );
  /// Default maximum retry attempts beyond the first.
  pub const DEFAULT_MAX_RETRIES : u32 = 3;
  /// Default exponential backoff coefficient, in seconds.
  pub const DEFAULT_RETRY_BACKOFF_FACTOR : f64 = 0.5;
  /// Default pooled-connections-per-host hint.
  pub const DEFAULT_POOL_CONNECTIONS : usize = 10;
  /// Default maximum pool size.
  pub const DEFAULT_POOL_MAXSIZE : usize = 20;

  /// Recognized truthy literals for `VENICE_USE_GLOBAL_CONFIG`.
  const TRUTHY : &[ &str ] = &[ "1", "true", "TRUE", "yes", "YES" ];

  fn default_retry_status_codes() -> HashSet< u16 >
  {
    [ 408, 429, 500, 502, 503, 504 ].into_iter().collect()
  }

  /// Immutable, fully-resolved client configuration.
  ///
  /// Construct via [`resolve_config`] (preferred) or [`Config::from_explicit`]
  /// when every field is already known and no environment/dotenv layering is
  /// wanted (primarily useful in tests).
  #[ derive( Debug, Clone ) ]
  pub struct Config
  {
    api_key : String,
    base_url : String,
    timeout : Duration,
    max_retries : u32,
    retry_backoff_factor : f64,
    retry_status_codes : HashSet< u16 >,
    pool_connections : usize,
    pool_maxsize : usize,
    use_global_config : bool,
  }

  impl Config
  {
    /// The resolved API key.
    #[ must_use ]
    pub fn api_key( &self ) -> &str
    {
      &self.api_key
    }

    /// The resolved base URL, e.g. `https://api.venice.ai/api/v1`.
    #[ must_use ]
    pub fn base_url( &self ) -> &str
    {
      &self.base_url
    }

    /// Per-request timeout, absent a per-call override.
    #[ must_use ]
    pub fn timeout( &self ) -> Duration
    {
      self.timeout
    }

    /// Maximum number of retries (attempts beyond the first).
    #[ must_use ]
    pub fn max_retries( &self ) -> u32
    {
      self.max_retries
    }

    /// Exponential backoff coefficient, in seconds.
    #[ must_use ]
    pub fn retry_backoff_factor( &self ) -> f64
    {
      self.retry_backoff_factor
    }

    /// HTTP status codes that trigger a retry.
    #[ must_use ]
    pub fn retry_status_codes( &self ) -> &HashSet< u16 >
    {
      &self.retry_status_codes
    }

    /// Hint for how many connections the pool keeps warm per host.
    #[ must_use ]
    pub fn pool_connections( &self ) -> usize
    {
      self.pool_connections
    }

    /// Maximum idle connections the pool retains.
    #[ must_use ]
    pub fn pool_maxsize( &self ) -> usize
    {
      self.pool_maxsize
    }

    /// Whether the global dotenv layer was consulted while resolving this config.
    #[ must_use ]
    pub fn use_global_config( &self ) -> bool
    {
      self.use_global_config
    }

    /// Build a config directly from already-resolved values, bypassing the
    /// environment/dotenv layers entirely. Useful for tests and for callers
    /// that manage credentials themselves.
    pub fn from_explicit( api_key : impl Into< String > ) -> Result< Self, Error >
    {
      let fields = ResolvedFields
      {
        api_key : Some( api_key.into() ),
        base_url : None,
        timeout : None,
        max_retries : None,
        retry_backoff_factor : None,
        retry_status_codes : None,
        pool_connections : None,
        pool_maxsize : None,
        use_global_config : None,
      };
      build( fields )
    }
  }

  /// A layered source of configuration strings.
  ///
  /// Each layer answers `get(key)` independently; [`resolve_config`] queries
  /// every known key across every layer in precedence order and keeps the
  /// first `Some`.
  pub trait Source
  {
    /// Look up a single recognized environment-style key (e.g. `VENICE_API_KEY`).
    fn get( &self, key : &str ) -> Option< String >;
  }

  /// Explicit-argument layer (highest precedence).
  #[ derive( Debug, Clone, Default ) ]
  pub struct ExplicitSource
  {
    /// Explicit `api_key` override.
    pub api_key : Option< String >,
    /// Explicit `base_url` override.
    pub base_url : Option< String >,
    /// Explicit `timeout` override, in seconds.
    pub timeout_secs : Option< f64 >,
    /// Explicit `max_retries` override.
    pub max_retries : Option< u32 >,
    /// Explicit `retry_backoff_factor` override.
    pub retry_backoff_factor : Option< f64 >,
    /// Explicit `retry_status_codes` override.
    pub retry_status_codes : Option< HashSet< u16 > >,
    /// Explicit `pool_connections` override.
    pub pool_connections : Option< usize >,
    /// Explicit `pool_maxsize` override.
    pub pool_maxsize : Option< usize >,
    /// Explicit `use_global_config` override.
    pub use_global_config : Option< bool >,
  }

  impl Source for ExplicitSource
  {
    fn get( &self, key : &str ) -> Option< String >
    {
      match key
      {
        "VENICE_API_KEY" => self.api_key.clone(),
        "VENICE_BASE_URL" => self.base_url.clone(),
        "VENICE_TIMEOUT" => self.timeout_secs.map( | v | v.to_string() ),
        "VENICE_MAX_RETRIES" => self.max_retries.map( | v | v.to_string() ),
        "VENICE_RETRY_BACKOFF_FACTOR" => self.retry_backoff_factor.map( | v | v.to_string() ),
        "VENICE_RETRY_STATUS_CODES" => self.retry_status_codes.as_ref().map( | set | join_codes( set ) ),
        "VENICE_POOL_CONNECTIONS" => self.pool_connections.map( | v | v.to_string() ),
        "VENICE_POOL_MAXSIZE" => self.pool_maxsize.map( | v | v.to_string() ),
        "VENICE_USE_GLOBAL_CONFIG" => self.use_global_config.map( | v | if v { "1".to_string() } else { "0".to_string() } ),
        _ => None,
      }
    }
  }

  fn join_codes( set : &HashSet< u16 > ) -> String
  {
    let mut codes : Vec< u16 > = set.iter().copied().collect();
    codes.sort_unstable();
    codes.iter().map( u16::to_string ).collect::< Vec< _ > >().join( "," )
  }

  /// Process-environment layer.
  #[ derive( Debug, Clone, Default ) ]
  pub struct EnvSource;

  const KEYS : &[ &str ] = &[
    "VENICE_API_KEY",
    "VENICE_BASE_URL",
    "VENICE_TIMEOUT",
    "VENICE_MAX_RETRIES",
    "VENICE_RETRY_BACKOFF_FACTOR",
    "VENICE_RETRY_STATUS_CODES",
    "VENICE_POOL_CONNECTIONS",
    "VENICE_POOL_MAXSIZE",
    "VENICE_USE_GLOBAL_CONFIG",
  ];

  impl Source for EnvSource
  {
    fn get( &self, key : &str ) -> Option< String >
    {
      std::env::var( key ).ok().filter( | v | !v.is_empty() )
    }
  }

  /// A dotenv-file layer: plain `KEY=VALUE` lines, `#`-comments and blank
  /// lines ignored, later keys in the same file override earlier ones.
  #[ derive( Debug, Clone, Default ) ]
  pub struct DotenvSource
  {
    values : BTreeMap< String, String >,
  }

  impl DotenvSource
  {
    /// Parse a dotenv file at `path`. Returns an empty (inert) source if the
    /// file does not exist; propagates genuine I/O errors.
    pub fn load( path : &std::path::Path ) -> std::io::Result< Self >
    {
      if !path.exists()
      {
        return Ok( Self::default() );
      }
      let contents = std::fs::read_to_string( path )?;
      Ok( Self::parse( &contents ) )
    }

    /// Parse dotenv-format text directly (exposed for testing without touching the filesystem).
    ///
    /// Delegates the actual `KEY=VALUE` / quoting / comment grammar to
    /// [`dotenvy::from_read_iter`], which never mutates the process
    /// environment — unlike `dotenvy::dotenv()` / `from_filename()`, which
    /// would merge local and global files into one indistinguishable
    /// `std::env` layer and defeat the precedence this source exists to keep
    /// separate (§4.1).
    #[ must_use ]
    pub fn parse( contents : &str ) -> Self
    {
      let mut values = BTreeMap::new();
      for item in dotenvy::from_read_iter( std::io::Cursor::new( contents.as_bytes() ) )
      {
        if let Ok( ( key, value ) ) = item
        {
          values.insert( key, value );
        }
      }
      Self { values }
    }
  }

  impl Source for DotenvSource
  {
    fn get( &self, key : &str ) -> Option< String >
    {
      self.values.get( key ).cloned()
    }
  }

  /// Resolve the platform global config directory's dotenv path:
  /// `$XDG_CONFIG_HOME/venice/.env` (or `~/.config/venice/.env` as fallback
  /// on unix-likes) / `%APPDATA%\venice\.env` on Windows.
  #[ must_use ]
  pub fn global_dotenv_path() -> std::path::PathBuf
  {
    #[ cfg( windows ) ]
    {
      let base = std::env::var( "APPDATA" ).unwrap_or_default();
      std::path::PathBuf::from( base ).join( "venice" ).join( ".env" )
    }
    #[ cfg( not( windows ) ) ]
    {
      let base = std::env::var( "XDG_CONFIG_HOME" ).ok().map( std::path::PathBuf::from ).unwrap_or_else( || {
        let home = std::env::var( "HOME" ).unwrap_or_default();
        std::path::PathBuf::from( home ).join( ".config" )
      } );
      base.join( "venice" ).join( ".env" )
    }
  }

  /// Local dotenv path: `.env` in the current working directory.
  #[ must_use ]
  pub fn local_dotenv_path() -> std::path::PathBuf
  {
    std::path::PathBuf::from( ".env" )
  }

  #[ derive( Debug, Clone, Default ) ]
  struct ResolvedFields
  {
    api_key : Option< String >,
    base_url : Option< String >,
    timeout : Option< String >,
    max_retries : Option< String >,
    retry_backoff_factor : Option< String >,
    retry_status_codes : Option< String >,
    pool_connections : Option< String >,
    pool_maxsize : Option< String >,
    use_global_config : Option< String >,
  }

  fn first_of( layers : &[ &dyn Source ], key : &str ) -> Option< String >
  {
    layers.iter().find_map( | layer | layer.get( key ) )
  }

  /// Resolve a [`Config`] by merging, in precedence order (highest first):
  /// explicit arguments, process environment, local `.env`, and — only when
  /// `VENICE_USE_GLOBAL_CONFIG` resolves truthy from the higher layers — the
  /// platform global `.env` (§4.1, invariant 1 / scenario S4).
  ///
  /// # Errors
  ///
  /// Returns [`ErrorKind::Config`] when `api_key` is missing after all layers,
  /// or when a numeric/URL/status-code field fails to parse.
  pub fn resolve_config( explicit : &ExplicitSource ) -> Result< Config, Error >
  {
    let env = EnvSource;
    let local = DotenvSource::load( &local_dotenv_path() )
      .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to read local .env: {e}" ) ) )?;

    // The global-config gate itself is resolved from the non-global layers
    // only — its own value is never read from the global file (§9, last
    // open question: the gate applies uniformly regardless of caller).
    let gate_layers : [ &dyn Source; 3 ] = [ explicit, &env, &local ];
    let gate_value = first_of( &gate_layers, "VENICE_USE_GLOBAL_CONFIG" );
    let use_global = gate_value.as_deref().is_some_and( | v | TRUTHY.contains( &v ) );

    let global = if use_global
    {
      DotenvSource::load( &global_dotenv_path() )
        .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to read global .env: {e}" ) ) )?
    }
    else
    {
      DotenvSource::default()
    };

    let layers : Vec< &dyn Source > = if use_global
    {
      vec![ explicit, &env, &local, &global ]
    }
    else
    {
      vec![ explicit, &env, &local ]
    };

    let fields = ResolvedFields
    {
      api_key : first_of( &layers, "VENICE_API_KEY" ),
      base_url : first_of( &layers, "VENICE_BASE_URL" ),
      timeout : first_of( &layers, "VENICE_TIMEOUT" ),
      max_retries : first_of( &layers, "VENICE_MAX_RETRIES" ),
      retry_backoff_factor : first_of( &layers, "VENICE_RETRY_BACKOFF_FACTOR" ),
      retry_status_codes : first_of( &layers, "VENICE_RETRY_STATUS_CODES" ),
      pool_connections : first_of( &layers, "VENICE_POOL_CONNECTIONS" ),
      pool_maxsize : first_of( &layers, "VENICE_POOL_MAXSIZE" ),
      use_global_config : gate_value,
    };

    let mut config = build( fields )?;
    config.use_global_config = use_global;
    Ok( config )
  }

  fn build( fields : ResolvedFields ) -> Result< Config, Error >
  {
    let api_key = fields.api_key.filter( | v | !v.is_empty() )
      .ok_or_else( || Error::new( ErrorKind::Config, "api_key is required but was not found in any configuration layer" ) )?;

    let base_url = fields.base_url.unwrap_or_else( || DEFAULT_BASE_URL.to_string() );
    validate_base_url( &base_url )?;

    let timeout = match fields.timeout
    {
      Some( raw ) =>
      {
        let secs : f64 = raw.parse().map_err( | _ | config_err( "VENICE_TIMEOUT", &raw ) )?;
        if secs <= 0.0
        {
          return Err( config_err( "VENICE_TIMEOUT", &raw ) );
        }
        Duration::from_secs_f64( secs )
      }
      None => DEFAULT_TIMEOUT,
    };

    let max_retries = match fields.max_retries
    {
      Some( raw ) => raw.parse().map_err( | _ | config_err( "VENICE_MAX_RETRIES", &raw ) )?,
      None => DEFAULT_MAX_RETRIES,
    };

    let retry_backoff_factor = match fields.retry_backoff_factor
    {
      Some( raw ) =>
      {
        let v : f64 = raw.parse().map_err( | _ | config_err( "VENICE_RETRY_BACKOFF_FACTOR", &raw ) )?;
        if v < 0.0
        {
          return Err( config_err( "VENICE_RETRY_BACKOFF_FACTOR", &raw ) );
        }
        v
      }
      None => DEFAULT_RETRY_BACKOFF_FACTOR,
    };

    let retry_status_codes = match fields.retry_status_codes
    {
      Some( raw ) => parse_status_codes( &raw )?,
      None => default_retry_status_codes(),
    };

    let pool_connections = match fields.pool_connections
    {
      Some( raw ) => raw.parse().map_err( | _ | config_err( "VENICE_POOL_CONNECTIONS", &raw ) )?,
      None => DEFAULT_POOL_CONNECTIONS,
    };

    let pool_maxsize = match fields.pool_maxsize
    {
      Some( raw ) => raw.parse().map_err( | _ | config_err( "VENICE_POOL_MAXSIZE", &raw ) )?,
      None => DEFAULT_POOL_MAXSIZE,
    };

    let use_global_config = fields.use_global_config.as_deref().is_some_and( | v | TRUTHY.contains( &v ) );

    Ok( Config
    {
      api_key,
      base_url,
      timeout,
      max_retries,
      retry_backoff_factor,
      retry_status_codes,
      pool_connections,
      pool_maxsize,
      use_global_config,
    } )
  }

  fn config_err( field : &str, raw : &str ) -> Error
  {
    Error::new( ErrorKind::Config, format!( "invalid value for {field}: {raw:?}" ) )
  }

  fn validate_base_url( url : &str ) -> Result< (), Error >
  {
    let parsed = url::Url::parse( url ).map_err( | e | Error::new( ErrorKind::Config, format!( "invalid base_url {url:?}: {e}" ) ) )?;
    if ( parsed.scheme() == "http" || parsed.scheme() == "https" ) && parsed.host_str().is_some()
    {
      Ok( () )
    }
    else
    {
      Err( Error::new( ErrorKind::Config, format!( "base_url must have an http/https scheme and authority, got {url:?}" ) ) )
    }
  }

  fn parse_status_codes( raw : &str ) -> Result< HashSet< u16 >, Error >
  {
    raw
      .split( ',' )
      .map( str::trim )
      .filter( | s | !s.is_empty() )
      .map( | s | s.parse::< u16 >().map_err( | _ | config_err( "VENICE_RETRY_STATUS_CODES", raw ) ) )
      .collect()
  }
}

pub use private::{
  Config, Source, ExplicitSource, EnvSource, DotenvSource,
  resolve_config, global_dotenv_path, local_dotenv_path,
  DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_MAX_RETRIES,
  DEFAULT_RETRY_BACKOFF_FACTOR, DEFAULT_POOL_CONNECTIONS, DEFAULT_POOL_MAXSIZE,
};
