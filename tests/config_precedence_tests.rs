//! Config resolver precedence tests (§4.1, §8 scenario S4).

use api_venice::config::{ resolve_config, DotenvSource, ExplicitSource, Source };
use api_venice::ErrorKind;

#[ test ]
fn explicit_overrides_everything_else()
{
  let explicit = ExplicitSource { api_key : Some( "explicit-key".to_string() ), ..ExplicitSource::default() };
  let config = resolve_config( &explicit ).expect( "api_key came from explicit layer" );
  assert_eq!( config.api_key(), "explicit-key" );
  assert_eq!( config.base_url(), api_venice::config::DEFAULT_BASE_URL );
}

#[ test ]
fn dotenv_source_parses_quoted_values_and_ignores_comments()
{
  let source = DotenvSource::parse(
    "# a comment\n\nVENICE_API_KEY=\"quoted-key\"\nVENICE_BASE_URL='https://example.test/v1'\n"
  );
  assert_eq!( source.get( "VENICE_API_KEY" ), Some( "quoted-key".to_string() ) );
  assert_eq!( source.get( "VENICE_BASE_URL" ), Some( "https://example.test/v1".to_string() ) );
}

#[ test ]
fn missing_api_key_is_a_config_error()
{
  let explicit = ExplicitSource::default();
  // SAFETY(test): scoped purely to this process's env for the duration of
  // this call; no other test in this binary reads VENICE_API_KEY.
  std::env::remove_var( "VENICE_API_KEY" );
  let error = resolve_config( &explicit ).unwrap_err();
  assert_eq!( error.kind(), ErrorKind::Config );
}

#[ test ]
fn invalid_base_url_scheme_is_rejected()
{
  let explicit = ExplicitSource
  {
    api_key : Some( "k".to_string() ),
    base_url : Some( "ftp://example.test".to_string() ),
    ..ExplicitSource::default()
  };
  let error = resolve_config( &explicit ).unwrap_err();
  assert_eq!( error.kind(), ErrorKind::Config );
}

#[ test ]
fn retry_status_codes_parse_from_comma_separated_string()
{
  let explicit = ExplicitSource
  {
    api_key : Some( "k".to_string() ),
    retry_status_codes : Some( std::collections::HashSet::from( [ 500, 503 ] ) ),
    ..ExplicitSource::default()
  };
  let config = resolve_config( &explicit ).unwrap();
  assert!( config.retry_status_codes().contains( &500 ) );
  assert!( config.retry_status_codes().contains( &503 ) );
}
