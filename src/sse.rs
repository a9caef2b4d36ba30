//! Server-sent-event decoding (§4.4).
//!
//! Fixes the "duck-typed chunk vs. string streams" re-architecture from
//! §9: one shared frame decoder ([`FrameDecoder`]) produces [`SseEvent`]
//! values, and the raw/parsed iteration modes (§4.4) are two thin adapters
//! over that single decoder rather than two independently-written parsers —
//! so they stay consistent on the same byte stream by construction.

mod private
{
  use crate::error::{ Error, ErrorKind, bounded_preview };

  /// One fully-assembled SSE event.
  #[ derive( Debug, Clone, PartialEq, Eq ) ]
  pub struct SseEvent
  {
    /// Event name; `"message"` when the frame carried no `event:` field.
    pub event : String,
    /// The joined `data:` payload (multi-line fields joined with `\n`).
    pub data : String,
    /// The `id:` field, if present.
    pub id : Option< String >,
  }

  /// The sentinel payload that terminates a stream without a further chunk.
  pub const DONE : &str = "[DONE]";

  #[ derive( Debug, Default ) ]
  struct PendingEvent
  {
    event : Option< String >,
    data : Vec< String >,
    id : Option< String >,
    saw_any_field : bool,
  }

  impl PendingEvent
  {
    fn finish( self ) -> SseEvent
    {
      SseEvent
      {
        event : self.event.unwrap_or_else( || "message".to_string() ),
        data : self.data.join( "\n" ),
        id : self.id,
      }
    }
  }

  /// Frames a line-oriented byte stream into [`SseEvent`]s.
  ///
  /// Feed raw bytes via [`FrameDecoder::push`] as they arrive (buffering only
  /// a partial trailing line across chunk boundaries, rather than reading the
  /// whole body up front — see DESIGN.md for why the whole-body approach was
  /// not carried forward) and drain completed events with [`FrameDecoder::next_event`].
  /// Once the `[DONE]` sentinel has been observed, [`FrameDecoder::is_done`]
  /// returns `true` and no further events are produced.
  #[ derive( Debug, Default ) ]
  pub struct FrameDecoder
  {
    buffer : String,
    pending : PendingEvent,
    done : bool,
  }

  impl FrameDecoder
  {
    /// Create an empty decoder.
    #[ must_use ]
    pub fn new() -> Self
    {
      Self::default()
    }

    /// Whether the `[DONE]` sentinel has already been observed.
    #[ must_use ]
    pub fn is_done( &self ) -> bool
    {
      self.done
    }

    /// Append newly-received bytes (assumed UTF-8; invalid sequences are replaced).
    pub fn push( &mut self, bytes : &[ u8 ] )
    {
      self.buffer.push_str( &String::from_utf8_lossy( bytes ) );
    }

    /// Drain the next fully-framed event, if one is buffered.
    ///
    /// Returns `None` when no complete event is buffered yet — either more
    /// bytes are needed, or the `[DONE]` sentinel has already been observed
    /// (see [`FrameDecoder::is_done`]) and the stream is over. A blank line
    /// that closes out an event with no fields at all is not dispatched; it
    /// is silently dropped and framing continues. Returns `Some(event)` for
    /// each fully-assembled event.
    pub fn next_event( &mut self ) -> Option< SseEvent >
    {
      loop
      {
        if self.done
        {
          return None;
        }

        let Some( newline_pos ) = self.buffer.find( '\n' ) else { return None };
        let mut line : String = self.buffer.drain( ..=newline_pos ).collect();
        if line.ends_with( '\n' )
        {
          line.pop();
        }
        if line.ends_with( '\r' )
        {
          line.pop();
        }

        if line.is_empty()
        {
          if !self.pending.saw_any_field
          {
            continue;
          }
          let pending = std::mem::take( &mut self.pending );
          let event = pending.finish();
          if event.data == DONE
          {
            self.done = true;
            return None;
          }
          return Some( event );
        }

        if line.starts_with( ':' )
        {
          continue;
        }

        let ( field, value ) = match line.split_once( ':' )
        {
          Some( ( f, v ) ) => ( f, v.strip_prefix( ' ' ).unwrap_or( v ) ),
          None => ( line.as_str(), "" ),
        };

        self.pending.saw_any_field = true;
        match field
        {
          "event" => self.pending.event = Some( value.to_string() ),
          "data" => self.pending.data.push( value.to_string() ),
          "id" => self.pending.id = Some( value.to_string() ),
          "retry" => { /* reconnection hint; not meaningful for a one-shot client read */ }
          _ => {}
        }
      }
    }
  }

  /// Iterates the raw (joined-string) data payload of each event.
  #[ derive( Debug ) ]
  pub struct RawIter
  {
    decoder : FrameDecoder,
  }

  impl RawIter
  {
    /// Wrap a decoder for raw-string iteration.
    #[ must_use ]
    pub fn new( decoder : FrameDecoder ) -> Self
    {
      Self { decoder }
    }

    /// Feed additional bytes.
    pub fn push( &mut self, bytes : &[ u8 ] )
    {
      self.decoder.push( bytes );
    }

    /// Whether the stream has reached its terminal sentinel.
    #[ must_use ]
    pub fn is_done( &self ) -> bool
    {
      self.decoder.is_done()
    }

    /// Drain the next buffered raw payload, if any.
    pub fn next( &mut self ) -> Option< String >
    {
      self.decoder.next_event().map( | e | e.data )
    }
  }

  /// Iterates each event's data payload decoded as JSON.
  #[ derive( Debug ) ]
  pub struct ParsedIter
  {
    decoder : FrameDecoder,
  }

  impl ParsedIter
  {
    /// Wrap a decoder for parsed-JSON iteration.
    #[ must_use ]
    pub fn new( decoder : FrameDecoder ) -> Self
    {
      Self { decoder }
    }

    /// Feed additional bytes.
    pub fn push( &mut self, bytes : &[ u8 ] )
    {
      self.decoder.push( bytes );
    }

    /// Whether the stream has reached its terminal sentinel.
    #[ must_use ]
    pub fn is_done( &self ) -> bool
    {
      self.decoder.is_done()
    }

    /// Drain and decode the next buffered payload.
    ///
    /// `None` means "no complete event buffered yet" (keep pushing bytes);
    /// `Some(Err(_))` is a malformed payload, carrying a bounded preview of
    /// the offending bytes (§7: `DecodeError` is never retried).
    pub fn next( &mut self ) -> Option< Result< serde_json::Value, Error > >
    {
      let event = self.decoder.next_event()?;
      match serde_json::from_str::< serde_json::Value >( &event.data )
      {
        Ok( value ) => Some( Ok( value ) ),
        Err( source ) =>
        {
          let preview = bounded_preview( event.data.as_bytes(), 200 );
          Some( Err(
            Error::new( ErrorKind::Decode, format!( "malformed SSE data payload: {preview}" ) ).with_source( source )
          ) )
        }
      }
    }
  }

  /// Extract the assistant's textual delta from a parsed chat-completion
  /// chunk (`choices[0].delta.content`), returning `""` when absent — the
  /// shape the streaming chat wrapper concatenates across chunks.
  #[ must_use ]
  pub fn delta_content( chunk : &serde_json::Value ) -> &str
  {
    chunk
      .get( "choices" )
      .and_then( | c | c.get( 0 ) )
      .and_then( | c | c.get( "delta" ) )
      .and_then( | d | d.get( "content" ) )
      .and_then( serde_json::Value::as_str )
      .unwrap_or( "" )
  }
}

pub use private::{ SseEvent, FrameDecoder, RawIter, ParsedIter, delta_content, DONE };
