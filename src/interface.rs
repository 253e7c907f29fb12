//! Interface identity types and traits.
//!
//! An interface is a contract between components: it names the operations a
//! dispatch table carries and the identity under which implementations can be
//! requested. Interfaces are not tied to any specific module - they exist as
//! abstract specifications that components expose facets for.

use crate::abi::{ DispatchTable, VTableHeader };



/// Unique 16-byte identifier for an interface.
///
/// Used to request a facet from a component at runtime. Two builds that agree
/// on a `Uuid` agree on the whole dispatch table reachable through it; a
/// published identifier never changes, a revised table gets a new one.
#[repr(C)]
#[derive( Copy, Clone, Eq, Hash, PartialEq )]
pub struct Uuid( [u8; 16] );

impl Uuid {

    /// Creates an identifier from its raw bytes.
    pub const fn new( bytes: [u8; 16] ) -> Self { Self( bytes )}

    /// Creates an identifier from the conventional grouped fields.
    pub const fn from_fields( a: u32, b: u16, c: u16, d: [u8; 8] ) -> Self {
        let a = a.to_be_bytes();
        let b = b.to_be_bytes();
        let c = c.to_be_bytes();
        Self([
            a[0], a[1], a[2], a[3],
            b[0], b[1],
            c[0], c[1],
            d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7],
        ])
    }

    /// Returns the raw bytes of this identifier.
    #[inline] pub const fn bytes( &self ) -> [u8; 16] { self.0 }

}

impl std::fmt::Display for Uuid {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
        let b = &self.0 ;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15],
        )
    }
}

impl std::fmt::Debug for Uuid {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "Uuid( {} )", self )}
}

/// Marker trait binding an interface identity to its dispatch table type.
///
/// Implemented by uninhabited marker types; a [`Handle`]( crate::Handle )
/// parameterised over the marker resolves the matching table type without
/// carrying per-instance state.
pub trait Interface {

    /// The dispatch table facets of this interface point at.
    type VTable: DispatchTable ;

    /// The interface's published identity.
    const UUID: Uuid ;
    /// Short name used in diagnostics.
    const NAME: &'static str ;

}

/// The root interface every component implements.
///
/// Facet zero of every object answers to this identity; casting any facet of
/// an object back to `Component` yields the same facet, which makes the root
/// cast the identity test between handles.
pub enum Component {}

impl Interface for Component {
    type VTable = VTableHeader ;
    const UUID: Uuid = Uuid::from_fields( 0x5d33_c219, 0x82da, 0x4f74, [ 0x9c, 0x05, 0x8f, 0x4e, 0x17, 0xaa, 0x60, 0x01 ]);
    const NAME: &'static str = "component" ;
}
