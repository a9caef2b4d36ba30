//! Integration tests for the HTTP engine's retry policy and error taxonomy
//! (§4.2, §4.3, §8 scenarios S1/S2), against a local `wiremock` server for
//! deterministic, dependency-free runs.

use api_venice::config::ExplicitSource;
use api_venice::{ Client, ErrorKind };
use std::collections::HashSet;
use std::sync::atomic::{ AtomicUsize, Ordering };
use wiremock::matchers::{ method, path };
use wiremock::{ Mock, MockServer, Request, Respond, ResponseTemplate };

/// Responds with the Nth entry of a fixed sequence (clamped to the last
/// entry once exhausted), letting a single mounted `Mock` drive a
/// multi-attempt scenario deterministically instead of relying on
/// cross-mock priority ordering.
struct Sequence
{
  responses : Vec< ResponseTemplate >,
  calls : AtomicUsize,
}

impl Sequence
{
  fn new( responses : Vec< ResponseTemplate > ) -> Self
  {
    Self { responses, calls : AtomicUsize::new( 0 ) }
  }
}

impl Respond for Sequence
{
  fn respond( &self, _request : &Request ) -> ResponseTemplate
  {
    let index = self.calls.fetch_add( 1, Ordering::SeqCst );
    self.responses[ index.min( self.responses.len() - 1 ) ].clone()
  }
}

fn explicit_for( server : &MockServer ) -> ExplicitSource
{
  ExplicitSource
  {
    api_key : Some( "test-key".to_string() ),
    base_url : Some( format!( "{}/api/v1", server.uri() ) ),
    timeout_secs : Some( 5.0 ),
    max_retries : Some( 2 ),
    retry_backoff_factor : Some( 0.01 ),
    retry_status_codes : Some( HashSet::from( [ 500 ] ) ),
    ..ExplicitSource::default()
  }
}

#[ tokio::test ]
async fn retry_exhaustion_raises_server_error_with_zero_metrics_events()
{
  // S1: three successive 500s exhaust `max_retries=2` (3 attempts total).
  let server = MockServer::start().await;
  Mock::given( method( "GET" ) ).and( path( "/api/v1/models" ) )
    .respond_with( ResponseTemplate::new( 500 ) )
    .expect( 3 )
    .mount( &server )
    .await;

  let client = Client::new( api_venice::resolve_config( &explicit_for( &server ) ).unwrap() ).unwrap();
  let result = client.get( "models", None ).await;

  let error = result.unwrap_err();
  assert_eq!( error.kind(), ErrorKind::ServerError );
  assert_eq!( error.status(), Some( 500 ) );
  assert_eq!( client.metrics().summary().total_events, 0 );
}

#[ tokio::test ]
async fn non_retryable_status_surfaces_immediately()
{
  // S2: a 401 is never in `retry_status_codes`, so it is classified and
  // returned on the very first attempt.
  let server = MockServer::start().await;
  Mock::given( method( "GET" ) ).and( path( "/api/v1/models" ) )
    .respond_with( ResponseTemplate::new( 401 ).set_body_json( serde_json::json!( {
      "error" : { "code" : "UNAUTHORIZED", "message" : "invalid api key" }
    } ) ) )
    .expect( 1 )
    .mount( &server )
    .await;

  let client = Client::new( api_venice::resolve_config( &explicit_for( &server ) ).unwrap() ).unwrap();
  let error = client.get( "models", None ).await.unwrap_err();

  assert_eq!( error.kind(), ErrorKind::Unauthorized );
  assert_eq!( error.status(), Some( 401 ) );
}

#[ tokio::test ]
async fn retry_after_floors_the_429_delay_and_records_one_metrics_event_per_attempt()
{
  let server = MockServer::start().await;
  let sequence = Sequence::new( vec!
  [
    ResponseTemplate::new( 429 ).insert_header( "retry-after", "1" ),
    ResponseTemplate::new( 429 ).insert_header( "retry-after", "1" ),
    ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( { "data" : [] } ) ),
  ] );
  Mock::given( method( "GET" ) ).and( path( "/api/v1/models" ) )
    .respond_with( sequence )
    .expect( 3 )
    .mount( &server )
    .await;

  let mut explicit = explicit_for( &server );
  explicit.max_retries = Some( 3 );
  explicit.retry_status_codes = Some( HashSet::from( [ 429 ] ) );
  let client = Client::new( api_venice::resolve_config( &explicit ).unwrap() ).unwrap();

  let value = client.get( "models", None ).await.unwrap();
  assert_eq!( value, serde_json::json!( { "data" : [] } ) );
  assert_eq!( client.metrics().summary().total_events, 2 );
}

#[ tokio::test ]
async fn model_not_found_uses_canonical_code()
{
  let server = MockServer::start().await;
  Mock::given( method( "GET" ) ).and( path( "/api/v1/models/ghost" ) )
    .respond_with( ResponseTemplate::new( 404 ).set_body_json( serde_json::json!( {
      "error" : { "code" : "MODEL_NOT_FOUND", "message" : "no such model" }
    } ) ) )
    .mount( &server )
    .await;

  let client = Client::new( api_venice::resolve_config( &explicit_for( &server ) ).unwrap() ).unwrap();
  let error = client.get( "models/ghost", None ).await.unwrap_err();

  assert_eq!( error.kind(), ErrorKind::ModelNotFound );
  assert_eq!( error.code(), Some( "MODEL_NOT_FOUND" ) );
  assert!( error.to_string().starts_with( "[MODEL_NOT_FOUND] no such model (HTTP 404" ) );
}
