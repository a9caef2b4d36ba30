//! Async job helper integration tests (§4.6).

use api_venice::config::ExplicitSource;
use api_venice::job::JobState;
use api_venice::Client;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::time::Duration;
use wiremock::matchers::{ method, path };
use wiremock::{ Mock, MockServer, Request, Respond, ResponseTemplate };

/// Responds with the Nth entry of a fixed sequence (clamped to the last
/// entry once exhausted), letting a single mounted `Mock` drive a
/// multi-poll scenario deterministically instead of relying on cross-mock
/// priority ordering.
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

fn client_for( server : &MockServer ) -> Client
{
  let explicit = ExplicitSource
  {
    api_key : Some( "test-key".to_string() ),
    base_url : Some( format!( "{}/api/v1", server.uri() ) ),
    ..ExplicitSource::default()
  };
  Client::new( api_venice::resolve_config( &explicit ).unwrap() ).unwrap()
}

#[ tokio::test ]
async fn wait_polls_through_processing_to_completed_and_calls_on_update_per_change()
{
  let server = MockServer::start().await;

  let sequence = Sequence::new( vec!
  [
    ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
      "job_id" : "job-1", "status" : "processing", "progress" : 10
    } ) ),
    ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
      "job_id" : "job-1", "status" : "processing", "progress" : 90
    } ) ),
    ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
      "job_id" : "job-1", "status" : "completed", "video_url" : "https://example.test/out.mp4"
    } ) ),
  ] );
  Mock::given( method( "POST" ) ).and( path( "/api/v1/video/retrieve" ) )
    .respond_with( sequence )
    .mount( &server )
    .await;

  let client = client_for( &server );
  let updates = AtomicUsize::new( 0 );

  let job = api_venice::job::wait(
    &client,
    "job-1",
    Duration::from_millis( 1 ),
    Some( Duration::from_secs( 5 ) ),
    | _job | { updates.fetch_add( 1, Ordering::SeqCst ); },
  ).await.unwrap();

  assert_eq!( job.state, JobState::Completed );
  assert_eq!( job.artifact_url.as_deref(), Some( "https://example.test/out.mp4" ) );
  assert_eq!( updates.load( Ordering::SeqCst ), 3 );
}

#[ tokio::test ]
async fn wait_tolerates_connection_failures_up_to_the_budget()
{
  let server = MockServer::start().await;

  let sequence = Sequence::new( vec!
  [
    ResponseTemplate::new( 503 ),
    ResponseTemplate::new( 503 ),
    ResponseTemplate::new( 503 ),
    ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
      "job_id" : "job-2", "status" : "completed"
    } ) ),
  ] );
  Mock::given( method( "POST" ) ).and( path( "/api/v1/video/retrieve" ) )
    .respond_with( sequence )
    .mount( &server )
    .await;

  let mut explicit = ExplicitSource
  {
    api_key : Some( "test-key".to_string() ),
    base_url : Some( format!( "{}/api/v1", server.uri() ) ),
    ..ExplicitSource::default()
  };
  explicit.max_retries = Some( 0 );
  explicit.retry_status_codes = Some( std::collections::HashSet::new() );
  let client = Client::new( api_venice::resolve_config( &explicit ).unwrap() ).unwrap();

  let job = api_venice::job::wait(
    &client,
    "job-2",
    Duration::from_millis( 1 ),
    Some( Duration::from_secs( 5 ) ),
    | _ | {},
  ).await.unwrap();

  assert_eq!( job.state, JobState::Completed );
}
