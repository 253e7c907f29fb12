//! The factory interface and its typed wrapper.
//!
//! A factory is itself a component: its object exposes the [`Factory`] facet
//! next to the component identity. The `create` entry writes the product's
//! component facet through an out-parameter and reports through the usual
//! failure token; on failure the out-parameter is left untouched.

use crate::abi::{ DispatchTable, Facet, VTableHeader, VTableRef };
use crate::error::Failure ;
use crate::exception::{ guard, RawToken };
use crate::handle::Handle ;
use crate::interface::{ Component, Interface, Uuid };
use crate::object::{ ObjectBox, ObjectHeader, ObjectLayout, LIFECYCLE };



/// Interface of component factories.
pub enum Factory {}

impl Interface for Factory {
    type VTable = FactoryVTable ;
    const UUID: Uuid = Uuid::from_fields(
        0xb1f0_77c2, 0x09d4, 0x43ab,
        [0xb0, 0x2e, 0x56, 0x2d, 0xe3, 0x07, 0x91, 0x42],
    );
    const NAME: &'static str = "factory" ;
}

/// Dispatch table of the [`Factory`] interface.
#[repr(C)]
#[derive( Clone, Copy )]
pub struct FactoryVTable {
    pub header: VTableHeader,
    /// Produces one component, writing its facet to `product` on success.
    pub create: unsafe extern "C" fn( object: *mut ObjectHeader, product: *mut Facet ) -> RawToken,
}

unsafe impl DispatchTable for FactoryVTable {}

/// A [`Handle`]( crate::Handle ) to a factory, with the create protocol
/// spelled out.
#[derive( Debug, Clone )]
pub struct FactoryHandle {
    handle: Handle<Factory>,
}

impl FactoryHandle {

    pub fn new( handle: Handle<Factory> ) -> Self { Self { handle }}

    /// Adopts a raw factory facet.
    ///
    /// # Safety
    /// `facet` must be non-null, refer to a live object implementing
    /// [`Factory`], and carry a strong reference this wrapper becomes
    /// responsible for.
    pub unsafe fn from_raw( facet: Facet ) -> Self {
        Self { handle: Handle::from_raw( facet )}
    }

    /// Surrenders the factory facet for transport across the dispatch
    /// boundary.
    pub fn into_raw( self ) -> Facet { self.handle.into_raw() }

    #[inline] pub fn handle( &self ) -> &Handle<Factory> { &self.handle }

    /// Produces one component.
    ///
    /// # Errors
    /// Whatever failure the factory reports, or [`Failure::Logic`] when it
    /// reports success without writing a product.
    pub fn create( &self ) -> Result<Handle<Component>, Failure> {
        let mut product = Facet::NULL ;
        let token = unsafe { ( self.handle.vtable().create )( self.handle.as_raw().object, &mut product )};
        token.consume()?;
        match product.is_null() {
            true => Err( Failure::Logic( "factory reported success without a product".to_string() )),
            false => Ok( unsafe { Handle::from_raw( product )}),
        }
    }

}

struct Produce {
    produce: Box<dyn Fn() -> Result<Handle<Component>, Failure> + Send + Sync>,
}

static FACTORY_TABLE: FactoryVTable = FactoryVTable {
    header: LIFECYCLE,
    create: create_entry,
};

static FACTORY_LAYOUT: ObjectLayout<2> = ObjectLayout::new(
    [Component::UUID, Factory::UUID],
    [VTableRef::new( &LIFECYCLE ), VTableRef::new( &FACTORY_TABLE )],
);

/// Wraps a closure into a full factory component.
///
/// This is the usual way a module serves its
/// [`factory`]( crate::ModuleVTable::factory ) entry: one closure per
/// component kind it exports.
pub fn factory_object<F>( produce: F ) -> FactoryHandle
where F: Fn() -> Result<Handle<Component>, Failure> + Send + Sync + 'static {
    let component = ObjectBox::spawn(
        Produce { produce: Box::new( produce )},
        &FACTORY_LAYOUT,
    );
    match component.cast::<Factory>() {
        Ok( factory ) => FactoryHandle::new( factory ),
        Err( _ ) => unreachable!( "factory layout lost its facet" ),
    }
}

unsafe extern "C" fn create_entry( object: *mut ObjectHeader, product: *mut Facet ) -> RawToken {
    guard(|| {
        let state = unsafe { ObjectBox::<Produce, 2>::value_of( object )};
        let component = ( state.produce )()?;
        unsafe { *product = component.into_raw() };
        Ok(())
    })
}
