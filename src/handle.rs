//! Typed strong references to component facets.
//!
//! A [`Handle`] owns one strong reference to the object behind a facet and
//! dispatches through the interface's table. Clones acquire, drops release,
//! and [`cast`]( Handle::cast ) moves sideways across the facets of the same
//! object. [`freeze`]( Handle::freeze ) marks a handle read-only; mutating
//! operations check the mark through [`require_mut`]( Handle::require_mut ).

use std::marker::PhantomData ;

use crate::abi::{ Facet, VTableHeader };
use crate::error::Failure ;
use crate::interface::Interface ;



/// Owning, typed reference to one facet of a live object.
pub struct Handle<I: Interface> {
    facet: Facet,
    frozen: bool,
    marker: PhantomData<fn() -> I>,
}

// Every spawned payload is `Send + Sync` and dispatch tables are immutable
// statics.
unsafe impl<I: Interface> Send for Handle<I> {}
unsafe impl<I: Interface> Sync for Handle<I> {}

impl<I: Interface> Handle<I> {

    /// Adopts a facet that already owns one strong reference.
    ///
    /// # Safety
    /// `facet` must be non-null, refer to a live object implementing `I`,
    /// and carry a strong reference this handle becomes responsible for.
    pub unsafe fn from_raw( facet: Facet ) -> Self {
        debug_assert!( !facet.is_null(), "adopting the null facet" );
        Self { facet, frozen: false, marker: PhantomData }
    }

    /// Surrenders the handle without releasing its reference, for transport
    /// across the dispatch boundary. The frozen mark does not travel.
    pub fn into_raw( self ) -> Facet {
        let facet = self.facet ;
        std::mem::forget( self );
        facet
    }

    /// The underlying facet, reference count untouched.
    #[inline] pub fn as_raw( &self ) -> Facet { self.facet }

    /// The interface's dispatch table.
    #[inline] pub fn vtable( &self ) -> &I::VTable {
        unsafe { &*self.facet.vtable.cast::<I::VTable>() }
    }

    /// Requests the facet of the same object for another interface. The
    /// frozen mark carries over to the new handle.
    ///
    /// # Errors
    /// [`Failure::NotFound`] when the object does not implement `J`.
    pub fn cast<J: Interface>( &self ) -> Result<Handle<J>, Failure> {
        let product = unsafe { ( self.header().cast )( self.facet.object, &J::UUID )};
        match product.is_null() {
            true => Err( Failure::NotFound( format!( "interface {} ({})", J::NAME, J::UUID ))),
            false => Ok( Handle { facet: product, frozen: self.frozen, marker: PhantomData } ),
        }
    }

    /// Whether two handles, of any interface pair, refer to the same object.
    pub fn same_identity<J: Interface>( &self, other: &Handle<J> ) -> bool {
        std::ptr::eq( self.facet.object, other.facet.object )
    }

    /// Strong count of the underlying object. A snapshot only.
    pub fn strong_count( &self ) -> usize {
        unsafe { ( *self.facet.object ).strong_count() }
    }

    /// Marks the handle read-only. Clones and casts keep the mark; the raw
    /// facet does not.
    pub fn freeze( mut self ) -> Self {
        self.frozen = true ;
        self
    }

    /// Whether the handle carries the read-only mark.
    #[inline] pub fn is_frozen( &self ) -> bool { self.frozen }

    /// Gate for mutating operations.
    ///
    /// # Errors
    /// [`Failure::Immutable`] when the handle is frozen.
    pub fn require_mut( &self ) -> Result<(), Failure> {
        match self.frozen {
            true => Err( Failure::Immutable( I::NAME.to_string() )),
            false => Ok(()),
        }
    }

    fn header( &self ) -> &VTableHeader {
        unsafe { &*self.facet.vtable }
    }

}

impl<I: Interface> Clone for Handle<I> {
    fn clone( &self ) -> Self {
        unsafe { ( self.header().acquire )( self.facet.object )};
        Self { facet: self.facet, frozen: self.frozen, marker: PhantomData }
    }
}

impl<I: Interface> Drop for Handle<I> {
    fn drop( &mut self ) {
        unsafe { ( self.header().release )( self.facet.object )};
    }
}

impl<I: Interface> std::fmt::Debug for Handle<I> {
    fn fmt( &self, formatter: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        write!( formatter, "Handle<{}>( {:p}, frozen: {} )", I::NAME, self.facet.object, self.frozen )
    }
}
