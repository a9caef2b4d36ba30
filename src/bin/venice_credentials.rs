//! Minimal binary exercising the credential surface (§6): read, write and
//! path-report against the local or global dotenv location. Deliberately
//! free of subcommand parsing, flag validation and help text — binding this
//! surface to a real CLI is an explicit non-goal; building one is left to a
//! collaborator.
//!
//! Usage: `venice-credentials <local|global> <read|write|path> [api-key]`

use api_venice::credentials::{ exists, is_path_reachable, path_for, read_api_key, write_api_key, Scope };
use std::process::ExitCode;

fn parse_scope( raw : &str ) -> Option< Scope >
{
  match raw
  {
    "local" => Some( Scope::Local ),
    "global" => Some( Scope::Global ),
    _ => None,
  }
}

fn main() -> ExitCode
{
  let args : Vec< String > = std::env::args().skip( 1 ).collect();
  let ( Some( scope_arg ), Some( command ) ) = ( args.first(), args.get( 1 ) ) else
  {
    eprintln!( "usage: venice-credentials <local|global> <read|write|path> [api-key]" );
    return ExitCode::from( 1 );
  };

  let Some( scope ) = parse_scope( scope_arg ) else
  {
    eprintln!( "unrecognized scope {scope_arg:?}, expected \"local\" or \"global\"" );
    return ExitCode::from( 1 );
  };

  match command.as_str()
  {
    "read" => match read_api_key( scope )
    {
      Ok( key ) =>
      {
        println!( "{key}" );
        ExitCode::SUCCESS
      }
      Err( error ) =>
      {
        eprintln!( "{error}" );
        ExitCode::from( 2 )
      }
    },
    "write" =>
    {
      let Some( api_key ) = args.get( 2 ) else
      {
        eprintln!( "usage: venice-credentials <local|global> write <api-key>" );
        return ExitCode::from( 1 );
      };
      let path = path_for( scope );
      if !is_path_reachable( &path )
      {
        eprintln!( "config path {} is not reachable", path.display() );
        return ExitCode::from( 3 );
      }
      match write_api_key( scope, api_key )
      {
        Ok( path ) =>
        {
          println!( "wrote {}", path.display() );
          ExitCode::SUCCESS
        }
        Err( error ) =>
        {
          eprintln!( "{error}" );
          ExitCode::from( 3 )
        }
      }
    }
    "path" =>
    {
      let path = path_for( scope );
      println!( "{} (exists: {})", path.display(), exists( scope ) );
      ExitCode::SUCCESS
    }
    other =>
    {
      eprintln!( "unrecognized command {other:?}, expected \"read\", \"write\" or \"path\"" );
      ExitCode::from( 1 )
    }
  }
}
