//! Failure transport across the dispatch boundary.
//!
//! A failing operation returns an owning [`RawToken`]; the caller replays it
//! into a [`Failure`] with [`RawToken::consume`]. Same-build pairs pass the
//! native value through untouched; foreign pairs reconstruct it from the wire
//! code with ancestor degradation. Provider bodies run behind [`guard`], so a
//! panic is captured like any other failure instead of unwinding across the
//! boundary.

use std::cell::RefCell ;
use std::panic::{ catch_unwind, AssertUnwindSafe };

use crate::abi::BUILD_FINGERPRINT ;
use crate::error::{ ErrorCode, Failure };



/// Capacity of the inline message buffer carried by [`RawFailure`].
pub const MESSAGE_CAPACITY: usize = 256 ;

/// Wire form of one failure.
///
/// Heap-allocated by the failing side and freed through its own `dispose`
/// entry, so the two sides never mix allocators. The `native` payload is a
/// boxed [`Failure`] the receiver may read when `fingerprint` matches its
/// own build.
#[repr(C)]
pub struct RawFailure {
	pub(crate) code: u64,
	pub(crate) fingerprint: u64,
	pub(crate) message_len: usize,
	pub(crate) message: [u8; MESSAGE_CAPACITY],
	pub(crate) native: *mut (),
	pub(crate) drop_native: Option<unsafe extern "C" fn( native: *mut () )>,
	pub(crate) dispose: unsafe extern "C" fn( raw: *mut RawFailure ),
}

/// Nullable owning pointer to a [`RawFailure`]. Null is the success token.
///
/// Whoever receives a token owns it: either replay it with
/// [`consume`]( Self::consume ) or let it drop, which disposes the carried
/// failure unseen.
#[repr(transparent)]
#[derive( Debug )]
#[must_use = "a discarded token silently drops the failure it carries"]
pub struct RawToken( *mut RawFailure );

impl RawToken {

	/// The success token.
	pub fn success() -> Self { Self( std::ptr::null_mut() )}

	/// Returns `true` when no failure is carried.
	#[inline] pub fn is_success( &self ) -> bool { self.0.is_null() }

	/// Captures a failure on the failing side.
	///
	/// Refreshes the thread's last-message slot and boxes the native value
	/// for the same-build fast path.
	pub fn capture( failure: Failure ) -> Self {
		set_last_message( failure.message() );
		let ( message, message_len ) = bounded_message( failure.message() );
		Self( Box::into_raw( Box::new( RawFailure {
			code: failure.code().raw(),
			fingerprint: BUILD_FINGERPRINT,
			message_len,
			message,
			native: Box::into_raw( Box::new( failure )).cast::<()>(),
			drop_native: Some( drop_native_entry ),
			dispose: dispose_entry,
		})))
	}

	/// Builds a token the way a foreign build would: wire code and message
	/// only, no native payload.
	pub fn from_parts( code: ErrorCode, message: &str ) -> Self {
		let ( message, message_len ) = bounded_message( message );
		Self( Box::into_raw( Box::new( RawFailure {
			code: code.raw(),
			fingerprint: 0,
			message_len,
			message,
			native: std::ptr::null_mut(),
			drop_native: None,
			dispose: dispose_entry,
		})))
	}

	/// Captures a panic payload as a [`Failure::Foreign`].
	pub fn capture_panic( payload: Box<dyn std::any::Any + Send> ) -> Self {
		let message = match payload.downcast_ref::<&str>() {
			Some( text ) => (*text).to_string(),
			None => match payload.downcast_ref::<String>() {
				Some( text ) => text.clone(),
				None => "unidentified panic payload".to_string(),
			},
		};
		log::error!( "panic crossed the dispatch boundary: {}", message );
		Self::capture( Failure::Foreign( message ))
	}

	/// Replays the carried failure, consuming the token.
	///
	/// Refreshes the thread's last-message slot on failure.
	///
	/// # Errors
	/// The replayed [`Failure`] whenever this is not the success token.
	pub fn consume( self ) -> Result<(), Failure> {
		let raw = self.0 ;
		std::mem::forget( self );
		if raw.is_null() { return Ok(()) }
		let failure = unsafe { replay( raw )};
		set_last_message( failure.message() );
		Err( failure )
	}

}

impl Drop for RawToken {
	fn drop( &mut self ) {
		if !self.0.is_null() {
			unsafe { (( *self.0 ).dispose )( self.0 )};
		}
	}
}

/// Runs a provider body behind the panic shield, capturing failures and
/// panics alike into a token.
pub fn guard<F>( body: F ) -> RawToken
where F: FnOnce() -> Result<(), Failure> {
	match catch_unwind( AssertUnwindSafe( body )) {
		Ok( Ok(()) ) => RawToken::success(),
		Ok( Err( failure )) => RawToken::capture( failure ),
		Err( payload ) => RawToken::capture_panic( payload ),
	}
}

/// Returns the message of the most recent failure captured or replayed on
/// this thread. Stays put until the next failure overwrites it.
pub fn last_message() -> Option<String> {
	LAST_MESSAGE.with(| slot | slot.borrow().clone())
}

thread_local! {
	static LAST_MESSAGE: RefCell<Option<String>> = const { RefCell::new( None )};
}

fn set_last_message( message: &str ) {
	LAST_MESSAGE.with(| slot | *slot.borrow_mut() = Some( message.to_string() ));
}

unsafe fn replay( raw: *mut RawFailure ) -> Failure {
	let same_build = ( *raw ).fingerprint == BUILD_FINGERPRINT && !( *raw ).native.is_null();
	let failure = match same_build {
		true => ( *( *raw ).native.cast::<Failure>() ).clone(),
		false => Failure::decode(
			ErrorCode::from_raw(( *raw ).code ),
			bounded_str( &( *raw ).message, ( *raw ).message_len ).to_string(),
		),
	};
	(( *raw ).dispose )( raw );
	failure
}

unsafe extern "C" fn dispose_entry( raw: *mut RawFailure ) {
	let boxed = Box::from_raw( raw );
	if let Some( drop_native ) = boxed.drop_native {
		if !boxed.native.is_null() {
			drop_native( boxed.native );
		}
	}
}

unsafe extern "C" fn drop_native_entry( native: *mut () ) {
	drop( Box::from_raw( native.cast::<Failure>() ));
}

fn bounded_message( text: &str ) -> ( [u8; MESSAGE_CAPACITY], usize ) {
	let mut buffer = [0_u8; MESSAGE_CAPACITY];
	let mut len = text.len().min( MESSAGE_CAPACITY );
	while !text.is_char_boundary( len ) { len -= 1 }
	buffer[..len].copy_from_slice( &text.as_bytes()[..len] );
	( buffer, len )
}

fn bounded_str( buffer: &[u8; MESSAGE_CAPACITY], len: usize ) -> &str {
	let bytes = &buffer[..len.min( MESSAGE_CAPACITY )];
	match std::str::from_utf8( bytes ) {
		Ok( text ) => text,
		// Salvage the valid prefix of a mangled foreign message.
		Err( error ) => {
			let ( valid, _ ) = bytes.split_at( error.valid_up_to() );
			unsafe { std::str::from_utf8_unchecked( valid )}
		}
	}
}
