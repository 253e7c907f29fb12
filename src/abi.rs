//! Raw dispatch surface shared across the module boundary.
//!
//! Everything here is `#[repr(C)]` and scalar-only: these are the shapes both
//! sides of the boundary must lay out identically. [`verify_layout`] checks
//! the contract once per process before any module is touched.

use std::sync::OnceLock ;

use thiserror::Error ;

use crate::exception::RawFailure ;
use crate::interface::Uuid ;
use crate::object::ObjectHeader ;



/// Version of the dispatch protocol itself. Rides in exported symbol names,
/// so an incompatible module fails symbol lookup instead of dispatching into
/// undefined behaviour.
pub const ABI_VERSION: u32 = 1 ;

/// Fingerprint distinguishing builds for the failure fast path.
///
/// Two sides reporting the same fingerprint agree on the in-memory shape of
/// [`Failure`]( crate::Failure ) and may pass the native value through
/// instead of reconstructing it from the wire code.
pub const BUILD_FINGERPRINT: u64 = fingerprint( env!( "CARGO_PKG_VERSION" ));

#[allow( clippy::cast_lossless )] // `u64::from` is not const.
const fn fingerprint( version: &str ) -> u64 {
	let mut hash = 0xcbf2_9ce4_8422_2325_u64 ;
	let bytes = version.as_bytes();
	let mut index = 0 ;
	while index < bytes.len() {
		hash ^= bytes[index] as u64 ;
		hash = hash.wrapping_mul( 0x0000_0100_0000_01b3 );
		index += 1 ;
	}
	( hash ^ ABI_VERSION as u64 ).wrapping_mul( 0x0000_0100_0000_01b3 )
}

/// Borrowed UTF-8 text with explicit length, the boundary's string type.
#[repr(C)]
#[derive( Copy, Clone, Debug )]
pub struct StrView {
	pub ptr: *const u8,
	pub len: usize,
}

impl StrView {

	/// The empty view.
	pub const EMPTY: Self = Self { ptr: "".as_ptr(), len: 0 };

	/// Borrows `text` for the boundary. The view is valid as long as `text`
	/// is.
	pub fn new( text: &str ) -> Self { Self { ptr: text.as_ptr(), len: text.len() }}

	/// Reads the view back as checked UTF-8.
	///
	/// # Errors
	/// Fails when the far side handed over bytes that are not valid UTF-8.
	///
	/// # Safety
	/// `ptr` must point at `len` readable bytes that outlive the returned
	/// borrow.
	pub unsafe fn to_str( &self ) -> Result<&str, std::str::Utf8Error> {
		std::str::from_utf8( std::slice::from_raw_parts( self.ptr, self.len ))
	}

	/// Reads the view back, trusting the producer.
	///
	/// # Safety
	/// Same as [`to_str`]( Self::to_str ), plus the bytes must be valid
	/// UTF-8.
	pub unsafe fn as_str( &self ) -> &str {
		std::str::from_utf8_unchecked( std::slice::from_raw_parts( self.ptr, self.len ))
	}

}

/// A key/value pair of text views, the cursor element type.
#[repr(C)]
#[derive( Copy, Clone, Debug )]
pub struct TextPair {
	pub key: StrView,
	pub value: StrView,
}

impl TextPair {
	/// The empty pair, for initialising out-parameter slots.
	pub const EMPTY: Self = Self { key: StrView::EMPTY, value: StrView::EMPTY };
}

/// The three fixed lifecycle entries every dispatch table starts with.
///
/// Entry zero is the destructor-style [`release`]( Self::release );
/// [`acquire`]( Self::acquire ) and [`cast`]( Self::cast ) follow. Declared
/// operations of richer interfaces run after the header in declaration order.
#[repr(C)]
#[derive( Copy, Clone, Debug )]
pub struct VTableHeader {
	/// Drops one reference, destroying the object exactly when the count
	/// reaches zero.
	pub release: unsafe extern "C" fn( object: *mut ObjectHeader ),
	/// Adds one reference.
	pub acquire: unsafe extern "C" fn( object: *mut ObjectHeader ),
	/// Resolves the facet for `target`, acquiring on success. Returns
	/// [`Facet::NULL`] when the object does not implement the interface.
	pub cast: unsafe extern "C" fn( object: *mut ObjectHeader, target: *const Uuid ) -> Facet,
}

/// Dispatch tables that begin with the fixed [`VTableHeader`].
///
/// # Safety
/// Implementers must be `#[repr(C)]` with a [`VTableHeader`] as their first
/// field, so a pointer to the table can travel as a pointer to its header and
/// be recovered intact on the other side.
pub unsafe trait DispatchTable: 'static {}

unsafe impl DispatchTable for VTableHeader {}

/// Type-erased pointer to a `'static` dispatch table.
///
/// [`ObjectLayout`]( crate::ObjectLayout ) stores one per facet slot.
#[derive( Copy, Clone, Debug )]
pub struct VTableRef( *const VTableHeader );

impl VTableRef {

	/// Erases a full dispatch table down to its header pointer.
	pub const fn new<V: DispatchTable>( table: &'static V ) -> Self {
		Self( std::ptr::from_ref( table ).cast() )
	}

	#[inline] pub(crate) const fn as_ptr( self ) -> *const VTableHeader { self.0 }

}

// Tables live in immutable statics for the whole process.
unsafe impl Send for VTableRef {}
unsafe impl Sync for VTableRef {}

/// One dispatchable view of a component: a dispatch table plus the object it
/// operates on.
///
/// Facets are plain values; ownership of the reference they stand for is
/// tracked by [`Handle`]( crate::Handle ) on the consumer side.
#[repr(C)]
#[derive( Copy, Clone, Debug, PartialEq, Eq )]
pub struct Facet {
	pub vtable: *const VTableHeader,
	pub object: *mut ObjectHeader,
}

impl Facet {

	/// The absent facet: written by failed casts, never dispatched through.
	pub const NULL: Self = Self { vtable: std::ptr::null(), object: std::ptr::null_mut() };

	/// Returns `true` if this is the absent facet.
	#[inline] pub fn is_null( &self ) -> bool { self.object.is_null() }

}

/// Violations of the host layout contract detected at startup.
#[derive( Error, Debug, Clone, Copy, PartialEq, Eq )]
pub enum LayoutError {
	/// A scalar does not have the width the boundary assumes.
	#[error( "Scalar Shape Rejected: {0}" )] ScalarShape( &'static str ),
	/// Floats are not IEEE-754 bit-compatible.
	#[error( "Float Encoding Rejected: {0}" )] FloatEncoding( &'static str ),
	/// A boundary record deviates from its published offsets.
	#[error( "Record Shape Rejected: {0}" )] RecordShape( &'static str ),
}

static VERIFIED: OnceLock<Result<(), LayoutError>> = OnceLock::new();

/// Checks the fixed-width scalar and record layout contract, once per
/// process. Later calls return the memoised verdict.
///
/// [`Context::initialize`]( crate::Context::initialize ) runs this before
/// anything else; embedders bypassing the context should do the same.
///
/// # Errors
/// A [`LayoutError`] naming the first broken assumption. A host failing this
/// check must not exchange facets with any module.
pub fn verify_layout() -> Result<(), LayoutError> {
	*VERIFIED.get_or_init( check_layout )
}

fn check_layout() -> Result<(), LayoutError> {
	let word = size_of::<usize>();

	if size_of::<*const ()>() != word {
		return Err( LayoutError::ScalarShape( "data pointer width" ))
	}
	if size_of::<unsafe extern "C" fn( *mut ObjectHeader )>() != word {
		return Err( LayoutError::ScalarShape( "function pointer width" ))
	}
	if size_of::<bool>() != 1 {
		return Err( LayoutError::ScalarShape( "bool width" ))
	}
	if f32::to_bits( 1.0 ) != 0x3f80_0000 || f64::to_bits( 1.0 ) != 0x3ff0_0000_0000_0000 {
		return Err( LayoutError::FloatEncoding( "unit value" ))
	}
	if f64::to_bits( -1.0 ) >> 63 != 1 {
		return Err( LayoutError::FloatEncoding( "sign bit" ))
	}

	if size_of::<Uuid>() != 16 || align_of::<Uuid>() != 1 {
		return Err( LayoutError::RecordShape( "interface identifier" ))
	}
	if size_of::<StrView>() != 2 * word || size_of::<Facet>() != 2 * word {
		return Err( LayoutError::RecordShape( "view pair" ))
	}
	if std::mem::offset_of!( Facet, vtable ) != 0 || std::mem::offset_of!( Facet, object ) != word {
		return Err( LayoutError::RecordShape( "facet fields" ))
	}
	if size_of::<VTableHeader>() != 3 * word {
		return Err( LayoutError::RecordShape( "lifecycle header" ))
	}
	if std::mem::offset_of!( RawFailure, code ) != 0 || std::mem::offset_of!( RawFailure, fingerprint ) != 8 {
		return Err( LayoutError::RecordShape( "failure record" ))
	}

	Ok(())
}
