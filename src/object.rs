//! Object layout and the shared lifecycle entries.
//!
//! Every component lives in one heap allocation: a reference-counted
//! [`ObjectHeader`], the facet array, then the payload value. All facets of
//! an object share the header's count, and the last release destroys the
//! whole allocation through the `destroy` entry recorded at spawn time.

use std::sync::atomic::{ fence, AtomicUsize, Ordering };

use crate::abi::{ Facet, VTableHeader, VTableRef };
use crate::handle::Handle ;
use crate::interface::{ Component, Interface, Uuid };



/// Leading field of every object allocation.
#[repr(C)]
pub struct ObjectHeader {
	strong: AtomicUsize,
	facets: *const Facet,
	facet_count: usize,
	uuids: *const Uuid,
	destroy: unsafe fn( object: *mut ObjectHeader ),
}

impl ObjectHeader {

	/// Current strong count. A snapshot only, stale the moment it returns.
	pub fn strong_count( &self ) -> usize { self.strong.load( Ordering::Acquire )}

}

pub(crate) unsafe extern "C" fn release_entry( object: *mut ObjectHeader ) {
	let previous = ( *object ).strong.fetch_sub( 1, Ordering::Release );
	debug_assert!( previous != 0, "release on a dead object" );
	if previous == 1 {
		fence( Ordering::Acquire );
		let destroy = ( *object ).destroy ;
		destroy( object );
	}
}

pub(crate) unsafe extern "C" fn acquire_entry( object: *mut ObjectHeader ) {
	( *object ).strong.fetch_add( 1, Ordering::Relaxed );
}

pub(crate) unsafe extern "C" fn cast_entry( object: *mut ObjectHeader, uuid: *const Uuid ) -> Facet {
	let uuids = std::slice::from_raw_parts(( *object ).uuids, ( *object ).facet_count );
	match uuids.iter().position(| candidate | candidate == &*uuid ) {
		Some( index ) => {
			( *object ).strong.fetch_add( 1, Ordering::Relaxed );
			*( *object ).facets.add( index )
		}
		None => Facet::NULL,
	}
}

/// The lifecycle entries shared by every object. Dispatch tables embed this
/// as their leading header; type-specific teardown rides in the object's own
/// `destroy` slot instead.
pub const LIFECYCLE: VTableHeader = VTableHeader {
	release: release_entry,
	acquire: acquire_entry,
	cast: cast_entry,
};

/// Static facet plan of an object type: which interfaces it exposes and
/// through which dispatch tables.
pub struct ObjectLayout<const N: usize> {
	uuids: [Uuid; N],
	vtables: [VTableRef; N],
}

impl<const N: usize> ObjectLayout<N> {

	/// Describes an object exposing `N` interfaces. Slot zero must be the
	/// component identity.
	///
	/// # Panics
	/// When `N` is zero.
	pub const fn new( uuids: [Uuid; N], vtables: [VTableRef; N] ) -> Self {
		assert!( N > 0, "an object exposes at least its component facet" );
		Self { uuids, vtables }
	}

}

/// One object allocation: header, facet array, payload.
#[repr(C)]
pub struct ObjectBox<T, const N: usize> {
	header: ObjectHeader,
	facets: [Facet; N],
	value: T,
}

impl<T: Send + Sync + 'static, const N: usize> ObjectBox<T, N> {

	/// Heap-allocates `value` under `layout` and hands back the owning
	/// component handle, count one.
	pub fn spawn( value: T, layout: &'static ObjectLayout<N> ) -> Handle<Component> {
		debug_assert!(
			layout.uuids[0] == Component::UUID,
			"facet zero of {} is not the component identity", std::any::type_name::<T>(),
		);
		let raw = Box::into_raw( Box::new( Self {
			header: ObjectHeader {
				strong: AtomicUsize::new( 1 ),
				facets: std::ptr::null(),
				facet_count: N,
				uuids: layout.uuids.as_ptr(),
				destroy: destroy_entry::<T, N>,
			},
			facets: [Facet::NULL; N],
			value,
		}));
		unsafe {
			let header = raw.cast::<ObjectHeader>();
			for index in 0..N {
				( *raw ).facets[index] = Facet {
					vtable: layout.vtables[index].as_ptr(),
					object: header,
				};
			}
			( *raw ).header.facets = std::ptr::addr_of!(( *raw ).facets ).cast::<Facet>();
			Handle::from_raw(( *raw ).facets[0] )
		}
	}

	/// Borrows the payload behind a facet of this object type.
	///
	/// # Safety
	/// `object` must head a live `ObjectBox<T, N>` allocation, and the
	/// borrow must not outlive the object's last strong reference.
	pub unsafe fn value_of<'a>( object: *mut ObjectHeader ) -> &'a T {
		&( *object.cast::<Self>() ).value
	}

}

unsafe fn destroy_entry<T, const N: usize>( object: *mut ObjectHeader ) {
	drop( Box::from_raw( object.cast::<ObjectBox<T, N>>() ));
}

/// Layout of a bare component exposing nothing beyond its identity.
pub static COMPONENT_LAYOUT: ObjectLayout<1> =
	ObjectLayout::new( [Component::UUID], [VTableRef::new( &LIFECYCLE )] );
