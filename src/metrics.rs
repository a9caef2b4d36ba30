//! Thread-safe rate-limit metrics recorder (§4.5).
//!
//! One [`Recorder`] is owned by each [`crate::http::Engine`] / [`crate::facade::Client`]
//! instance. It is a bounded ring buffer behind a single [`std::sync::Mutex`],
//! matching the `Arc<Mutex<_>>` concurrency style this workspace already uses
//! for stateful recorders (the `claude` member's `rate_limiting.rs`), rather
//! than a lock-free queue or a `prometheus`-backed collector — neither fits a
//! bounded-retention event log with endpoint/time-window queries and
//! CSV/JSON export (see DESIGN.md).

mod private
{
  use std::collections::{ BTreeMap, VecDeque };
  use std::sync::Mutex;
  use std::time::{ SystemTime, UNIX_EPOCH };

  /// Default retention bound (event count, not time), per §3.
  pub const DEFAULT_RETENTION : usize = 10_000;

  /// A single observed HTTP 429 response.
  #[ derive( Debug, Clone ) ]
  pub struct RateLimitEvent
  {
    /// Wall-clock time of the observation, as seconds since the Unix epoch.
    pub timestamp : f64,
    /// The request path that was rate limited.
    pub endpoint : String,
    /// HTTP status observed (always 429 in current usage, kept generic for export symmetry).
    pub status : u16,
    /// `Retry-After` (integer seconds) if the response carried one.
    pub retry_after : Option< u64 >,
    /// Request-count delta this event represents (always 1 per recorded attempt).
    pub request_count : u64,
    /// Remaining-requests estimate, from a provider `x-ratelimit-remaining-*` header if present.
    pub remaining : Option< u64 >,
    /// HTTP method of the request that was rate limited.
    pub method : String,
  }

  impl RateLimitEvent
  {
    /// Construct an event stamped with the current wall-clock time.
    #[ must_use ]
    pub fn now( endpoint : impl Into< String >, method : impl Into< String >, status : u16, retry_after : Option< u64 >, remaining : Option< u64 > ) -> Self
    {
      let timestamp = SystemTime::now().duration_since( UNIX_EPOCH ).unwrap_or_default().as_secs_f64();
      Self { timestamp, endpoint : endpoint.into(), status, retry_after, request_count : 1, remaining, method : method.into() }
    }
  }

  /// Aggregate view over the currently retained events.
  #[ derive( Debug, Clone, Default ) ]
  pub struct Summary
  {
    /// Total number of currently-retained events.
    pub total_events : usize,
    /// Event count grouped by endpoint.
    pub events_by_endpoint : BTreeMap< String, usize >,
    /// Event count grouped by HTTP status.
    pub events_by_status : BTreeMap< u16, usize >,
    /// Mean `retry_after` across events that carried one (`None` if none did).
    pub avg_retry_after : Option< f64 >,
    /// Timestamp of the oldest retained event.
    pub first_event_at : Option< f64 >,
    /// Timestamp of the newest retained event.
    pub last_event_at : Option< f64 >,
    /// Number of distinct endpoints represented.
    pub unique_endpoints : usize,
  }

  #[ derive( Debug ) ]
  struct State
  {
    events : VecDeque< RateLimitEvent >,
    retention : usize,
  }

  /// A concurrent-safe, bounded-retention recorder of rate-limit events.
  #[ derive( Debug ) ]
  pub struct Recorder
  {
    state : Mutex< State >,
  }

  impl Recorder
  {
    /// Create a recorder retaining at most `retention` most-recent events.
    #[ must_use ]
    pub fn new( retention : usize ) -> Self
    {
      Self { state : Mutex::new( State { events : VecDeque::new(), retention } ) }
    }

    /// Append an event, evicting the oldest if the retention bound is exceeded.
    pub fn record( &self, event : RateLimitEvent )
    {
      let mut state = self.state.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      state.events.push_back( event );
      let retention = state.retention;
      while state.events.len() > retention
      {
        state.events.pop_front();
      }
    }

    /// Compute a snapshot summary over the currently retained events.
    #[ must_use ]
    pub fn summary( &self ) -> Summary
    {
      let state = self.state.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      let mut summary = Summary { total_events : state.events.len(), ..Summary::default() };
      let mut retry_after_sum = 0.0;
      let mut retry_after_count = 0u64;
      let mut endpoints = std::collections::BTreeSet::new();

      for event in &state.events
      {
        *summary.events_by_endpoint.entry( event.endpoint.clone() ).or_insert( 0 ) += 1;
        *summary.events_by_status.entry( event.status ).or_insert( 0 ) += 1;
        endpoints.insert( event.endpoint.clone() );
        if let Some( ra ) = event.retry_after
        {
          retry_after_sum += ra as f64;
          retry_after_count += 1;
        }
        summary.first_event_at.get_or_insert( event.timestamp );
        summary.last_event_at = Some( event.timestamp );
      }

      summary.unique_endpoints = endpoints.len();
      summary.avg_retry_after = if retry_after_count > 0 { Some( retry_after_sum / retry_after_count as f64 ) } else { None };
      summary
    }

    /// Return retained events, optionally filtered by `endpoint` and/or an
    /// inclusive `[since, until]` timestamp window, preserving insertion order.
    #[ must_use ]
    pub fn events_for( &self, endpoint : Option< &str >, since : Option< f64 >, until : Option< f64 > ) -> Vec< RateLimitEvent >
    {
      let state = self.state.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      state.events.iter()
        .filter( | e | endpoint.is_none_or( | ep | e.endpoint == ep ) )
        .filter( | e | since.is_none_or( | s | e.timestamp >= s ) )
        .filter( | e | until.is_none_or( | u | e.timestamp <= u ) )
        .cloned()
        .collect()
    }

    /// Serialize all retained events as a JSON array, in insertion order.
    #[ must_use ]
    pub fn export_json( &self ) -> String
    {
      let events = self.events_for( None, None, None );
      let values : Vec< serde_json::Value > = events.iter().map( | e | serde_json::json!( {
        "timestamp" : e.timestamp,
        "endpoint" : e.endpoint,
        "status" : e.status,
        "retry_after" : e.retry_after,
        "request_count" : e.request_count,
        "remaining" : e.remaining,
        "method" : e.method,
      } ) ).collect();
      serde_json::Value::Array( values ).to_string()
    }

    /// Serialize all retained events as CSV (header row + one row per event),
    /// in insertion order (§8 scenario S6: `N+1` lines for `N` events).
    #[ must_use ]
    pub fn export_csv( &self ) -> String
    {
      let events = self.events_for( None, None, None );
      let mut out = String::from( "timestamp,endpoint,status,retry_after,request_count,remaining,method\n" );
      for e in &events
      {
        out.push_str( &format!(
          "{},{},{},{},{},{},{}\n",
          e.timestamp,
          e.endpoint,
          e.status,
          e.retry_after.map_or_else( String::new, | v | v.to_string() ),
          e.request_count,
          e.remaining.map_or_else( String::new, | v | v.to_string() ),
          e.method,
        ) );
      }
      out
    }

    /// Empty the buffer.
    pub fn reset( &self )
    {
      let mut state = self.state.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      state.events.clear();
    }
  }

  impl Default for Recorder
  {
    fn default() -> Self
    {
      Self::new( DEFAULT_RETENTION )
    }
  }

  #[ cfg( test ) ]
  mod tests
  {
    use super::*;

    fn event( endpoint : &str, status : u16, retry_after : Option< u64 > ) -> RateLimitEvent
    {
      RateLimitEvent::now( endpoint, "GET", status, retry_after, None )
    }

    #[ test ]
    fn retention_evicts_oldest_first()
    {
      // §8 invariant 6: after recording K > N events, total == N and the
      // oldest retained event is the (K-N+1)-th recorded.
      let recorder = Recorder::new( 2 );
      recorder.record( event( "a", 429, None ) );
      recorder.record( event( "b", 429, None ) );
      recorder.record( event( "c", 429, None ) );

      let retained = recorder.events_for( None, None, None );
      assert_eq!( retained.len(), 2 );
      assert_eq!( retained[ 0 ].endpoint, "b" );
      assert_eq!( retained[ 1 ].endpoint, "c" );
    }

    #[ test ]
    fn events_for_preserves_insertion_order()
    {
      let recorder = Recorder::default();
      recorder.record( event( "a", 429, None ) );
      recorder.record( event( "b", 429, None ) );
      recorder.record( event( "a", 429, None ) );

      let all = recorder.events_for( None, None, None );
      let endpoints : Vec< &str > = all.iter().map( | e | e.endpoint.as_str() ).collect();
      assert_eq!( endpoints, vec![ "a", "b", "a" ] );

      let only_a = recorder.events_for( Some( "a" ), None, None );
      assert_eq!( only_a.len(), 2 );
    }

    #[ test ]
    fn summary_matches_scenario_s6()
    {
      let recorder = Recorder::default();
      recorder.record( event( "A", 429, Some( 1 ) ) );
      recorder.record( event( "A", 429, Some( 3 ) ) );
      recorder.record( event( "B", 429, Some( 5 ) ) );

      let summary = recorder.summary();
      assert_eq!( summary.total_events, 3 );
      assert_eq!( summary.events_by_endpoint.get( "A" ), Some( &2 ) );
      assert_eq!( summary.events_by_endpoint.get( "B" ), Some( &1 ) );
      assert_eq!( summary.events_by_status.get( &429 ), Some( &3 ) );
      assert_eq!( summary.avg_retry_after, Some( 3.0 ) );
      assert_eq!( summary.unique_endpoints, 2 );

      let csv = recorder.export_csv();
      assert_eq!( csv.lines().count(), 4 );
    }

    #[ test ]
    fn reset_empties_the_buffer()
    {
      let recorder = Recorder::default();
      recorder.record( event( "a", 429, None ) );
      recorder.reset();
      assert_eq!( recorder.summary().total_events, 0 );
    }
  }
}

pub use private::{ RateLimitEvent, Summary, Recorder, DEFAULT_RETENTION };
