//! SSE decoder and chat streaming integration tests (§4.4, §8 scenario S3).

use api_venice::config::ExplicitSource;
use api_venice::endpoints::chat;
use api_venice::sse::{ FrameDecoder, ParsedIter, RawIter, DONE };
use api_venice::Client;
use futures_util::StreamExt;
use wiremock::matchers::{ method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

const FRAMES : &str = "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n\
data: [DONE]\n\n";

#[ test ]
fn frame_decoder_yields_two_events_then_marks_done()
{
  let mut decoder = FrameDecoder::new();
  decoder.push( FRAMES.as_bytes() );

  let first = decoder.next_event().unwrap();
  assert_eq!( first.data, r#"{"choices":[{"delta":{"content":"He"}}]}"# );
  let second = decoder.next_event().unwrap();
  assert_eq!( second.data, r#"{"choices":[{"delta":{"content":"llo"}}]}"# );
  assert!( decoder.next_event().is_none() );
  assert!( decoder.is_done() );
}

#[ test ]
fn raw_iter_yields_two_strings()
{
  let mut raw = RawIter::new( FrameDecoder::new() );
  raw.push( FRAMES.as_bytes() );
  let events : Vec< String > = std::iter::from_fn( || raw.next() ).collect();
  assert_eq!( events.len(), 2 );
  assert_ne!( events[ 0 ], DONE );
}

#[ test ]
fn parsed_iter_yields_two_json_objects()
{
  let mut parsed = ParsedIter::new( FrameDecoder::new() );
  parsed.push( FRAMES.as_bytes() );
  let first = parsed.next().unwrap().unwrap();
  assert_eq!( first[ "choices" ][ 0 ][ "delta" ][ "content" ], "He" );
  let second = parsed.next().unwrap().unwrap();
  assert_eq!( second[ "choices" ][ 0 ][ "delta" ][ "content" ], "llo" );
  assert!( parsed.next().is_none() );
}

#[ tokio::test ]
async fn streaming_chat_client_concatenates_to_hello()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) ).and( path( "/api/v1/chat/completions" ) )
    .respond_with(
      ResponseTemplate::new( 200 )
        .insert_header( "content-type", "text/event-stream" )
        .set_body_raw( FRAMES, "text/event-stream" )
    )
    .mount( &server )
    .await;

  let explicit = ExplicitSource
  {
    api_key : Some( "test-key".to_string() ),
    base_url : Some( format!( "{}/api/v1", server.uri() ) ),
    ..ExplicitSource::default()
  };
  let client = Client::new( api_venice::resolve_config( &explicit ).unwrap() ).unwrap();

  let text = chat::completions_stream_text( &client, serde_json::json!( { "stream" : true } ) ).await.unwrap();
  assert_eq!( text, "Hello" );
}

#[ tokio::test ]
async fn streaming_chat_parsed_mode_yields_two_chunks()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) ).and( path( "/api/v1/chat/completions" ) )
    .respond_with(
      ResponseTemplate::new( 200 )
        .insert_header( "content-type", "text/event-stream" )
        .set_body_raw( FRAMES, "text/event-stream" )
    )
    .mount( &server )
    .await;

  let explicit = ExplicitSource
  {
    api_key : Some( "test-key".to_string() ),
    base_url : Some( format!( "{}/api/v1", server.uri() ) ),
    ..ExplicitSource::default()
  };
  let client = Client::new( api_venice::resolve_config( &explicit ).unwrap() ).unwrap();

  let chunks : Vec< _ > = chat::completions_stream( &client, serde_json::json!( { "stream" : true } ) ).await.unwrap()
    .collect().await;
  assert_eq!( chunks.len(), 2 );
  assert!( chunks.iter().all( Result::is_ok ) );
}
