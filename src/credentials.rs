//! Credential file I/O (§6 "CLI surface").
//!
//! This module is the core's external-facing credential surface: reading and
//! writing the local and global dotenv locations that [`crate::config`]
//! resolves against. Binding these operations to subcommands, argument
//! parsing and help text is an explicit non-goal (§1); a minimal binary at
//! `src/bin/venice_credentials.rs` exercises this surface directly.

mod private
{
  use crate::config::{ global_dotenv_path, local_dotenv_path, DotenvSource, Source };
  use crate::error::{ Error, ErrorKind };
  use std::path::{ Path, PathBuf };

  /// Which dotenv location a credential operation targets.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
  pub enum Scope
  {
    /// `.env` in the current working directory.
    Local,
    /// The platform global config directory's `.env`.
    Global,
  }

  impl Scope
  {
    /// Resolve this scope to a concrete filesystem path.
    #[ must_use ]
    pub fn path( self ) -> PathBuf
    {
      match self
      {
        Self::Local => local_dotenv_path(),
        Self::Global => global_dotenv_path(),
      }
    }
  }

  /// Read `VENICE_API_KEY` directly out of the dotenv file at `scope`,
  /// without consulting the environment or the other scope.
  ///
  /// # Errors
  ///
  /// [`ErrorKind::Config`] if the file cannot be read, or if it exists but
  /// carries no `VENICE_API_KEY` entry.
  pub fn read_api_key( scope : Scope ) -> Result< String, Error >
  {
    let path = scope.path();
    let source = DotenvSource::load( &path )
      .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to read {}: {e}", path.display() ) ) )?;
    source.get( "VENICE_API_KEY" )
      .filter( | v | !v.is_empty() )
      .ok_or_else( || Error::new( ErrorKind::Config, format!( "no VENICE_API_KEY found in {}", path.display() ) ) )
  }

  /// Write (or update) `VENICE_API_KEY` in the dotenv file at `scope`,
  /// preserving any other keys already present and their relative order.
  ///
  /// Parent directories are created as needed (tolerating "already exists"),
  /// per §6's "`parents=true, exist_ok=true`" requirement for the global path.
  ///
  /// # Errors
  ///
  /// [`ErrorKind::Config`] if the parent directory cannot be created or the
  /// file cannot be written.
  pub fn write_api_key( scope : Scope, api_key : &str ) -> Result< PathBuf, Error >
  {
    let path = scope.path();
    if let Some( parent ) = path.parent()
    {
      std::fs::create_dir_all( parent )
        .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to create {}: {e}", parent.display() ) ) )?;
    }

    let existing = if path.exists()
    {
      std::fs::read_to_string( &path )
        .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to read {}: {e}", path.display() ) ) )?
    }
    else
    {
      String::new()
    };

    let updated = upsert_key( &existing, "VENICE_API_KEY", api_key );
    std::fs::write( &path, updated )
      .map_err( | e | Error::new( ErrorKind::Config, format!( "failed to write {}: {e}", path.display() ) ) )?;
    Ok( path )
  }

  /// Whether a dotenv file exists at `scope`.
  #[ must_use ]
  pub fn exists( scope : Scope ) -> bool
  {
    scope.path().exists()
  }

  fn upsert_key( contents : &str, key : &str, value : &str ) -> String
  {
    let mut found = false;
    let mut lines : Vec< String > = contents
      .lines()
      .map( | line |
      {
        let trimmed = line.trim_start();
        if !found && !trimmed.starts_with( '#' ) && trimmed.split_once( '=' ).is_some_and( | ( k, _ ) | k.trim() == key )
        {
          found = true;
          format!( "{key}={value}" )
        }
        else
        {
          line.to_string()
        }
      } )
      .collect();

    if !found
    {
      lines.push( format!( "{key}={value}" ) );
    }
    let mut out = lines.join( "\n" );
    out.push( '\n' );
    out
  }

  /// Report the filesystem path a scope resolves to, without touching it.
  #[ must_use ]
  pub fn path_for( scope : Scope ) -> PathBuf
  {
    scope.path()
  }

  /// Validate that a directory component of `path` is reachable (exists or
  /// can be created), used by the CLI surface to distinguish exit code 3
  /// ("unreachable config path") from exit code 2 ("missing credential").
  #[ must_use ]
  pub fn is_path_reachable( path : &Path ) -> bool
  {
    path.parent().is_none_or( | parent | parent.exists() || std::fs::create_dir_all( parent ).is_ok() )
  }
}

pub use private::{ Scope, read_api_key, write_api_key, exists, path_for, is_path_reachable };
