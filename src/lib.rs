//! A reference-counted component ABI and plugin loader for building modular
//! applications.
//!
//! Components are plain heap objects behind C-layout dispatch tables. Every
//! table starts with the same three lifecycle entries (release, acquire,
//! cast), so any facet of any object can be retained, released, and asked
//! for the object's other interfaces without knowing its concrete type.
//! Failures cross the dispatch boundary as hierarchical 64-bit codes with
//! bounded messages and are replayed on the calling side, degrading unknown
//! codes to their nearest known ancestor. A small INI configuration maps
//! component names to the modules serving them, builtin or loaded by path.
//!
//! # Core Concepts
//!
//! - [`Interface`]: A marker type tying a 16-byte [`Uuid`] to a dispatch
//! 	table shape. The root [`Component`] interface carries the bare
//! 	lifecycle table every object answers to.
//!
//! - [`Facet`]: One dispatchable view of an object, a dispatch table pointer
//! 	next to the object pointer. This is the unit that crosses the ABI.
//!
//! - [`Handle`]: A typed strong reference to a facet. Clones acquire, drops
//! 	release, [`cast`]( Handle::cast ) moves sideways across the facets of
//! 	one object, and [`freeze`]( Handle::freeze ) marks a handle read-only.
//!
//! - [`ObjectBox`]: The one-allocation object layout (header, facet array,
//! 	payload) and the object side of the lifecycle protocol.
//!
//! - [`Failure`] / [`ErrorCode`]: The error taxonomy. Codes are paths of
//! 	up to eight non-zero bytes; a child code is understood by every
//! 	receiver that knows any of its ancestors.
//!
//! - [`RawToken`]: The owning wire form of one failure, replayed with
//! 	[`consume`]( RawToken::consume ). Provider bodies run behind
//! 	[`guard`], which also captures panics instead of unwinding across
//! 	the boundary.
//!
//! - [`Context`]: The bootstrapped runtime, itself a component. Modules
//! 	receive its facet in their init entry and reach configuration and
//! 	factories through the same dispatch tables the host uses.
//!
//! - **Module**: A unit serving components, builtin or dynamically loaded,
//! 	exposing exactly three entries: init, factory, reflect. Declared with
//! 	[`declare_module!`] and, for dynamic loading, [`export_module!`].
//!
//! # Re-exports
//!
//! `abi_link` re-exports [`NEMap`] and [`nem`] from `nonempty_collections`,
//! used for the never-empty plugin mappings of
//! [`Context::plugin_mappings`]. See the
//! [nonempty-collections docs](https://docs.rs/nonempty-collections/latest/nonempty_collections/)
//! for details.
//!
//! # Example
//!
//! Implementing and dispatching a component interface:
//!
//! ```
//! use std::sync::atomic::{ AtomicU64, Ordering };
//!
//! use abi_link::{
//! 	guard, Component, DispatchTable, Failure, Handle, Interface,
//! 	ObjectBox, ObjectHeader, ObjectLayout, RawToken, Uuid,
//! 	VTableHeader, VTableRef, LIFECYCLE,
//! };
//!
//! // An interface is a marker type: a UUID tied to a table shape.
//! enum Counter {}
//!
//! impl Interface for Counter {
//! 	type VTable = CounterVTable ;
//! 	const UUID: Uuid = Uuid::from_fields(
//! 		0x6fd9_11f3, 0x0d2a, 0x4f29,
//! 		[0xa5, 0x2b, 0x6b, 0xe2, 0x8a, 0x1f, 0x33, 0x07],
//! 	);
//! 	const NAME: &'static str = "counter" ;
//! }
//!
//! // Tables embed the lifecycle header first; operations follow in
//! // declaration order.
//! #[repr(C)]
//! struct CounterVTable {
//! 	header: VTableHeader,
//! 	add: unsafe extern "C" fn( object: *mut ObjectHeader, amount: u64 ) -> RawToken,
//! 	value: unsafe extern "C" fn( object: *mut ObjectHeader ) -> u64,
//! }
//!
//! unsafe impl DispatchTable for CounterVTable {}
//!
//! struct CounterState { total: AtomicU64 }
//!
//! static COUNTER_TABLE: CounterVTable = CounterVTable { header: LIFECYCLE, add, value };
//!
//! static COUNTER_LAYOUT: ObjectLayout<2> = ObjectLayout::new(
//! 	[Component::UUID, Counter::UUID],
//! 	[VTableRef::new( &LIFECYCLE ), VTableRef::new( &COUNTER_TABLE )],
//! );
//!
//! unsafe extern "C" fn add( object: *mut ObjectHeader, amount: u64 ) -> RawToken {
//! 	guard(|| {
//! 		let state = unsafe { ObjectBox::<CounterState, 2>::value_of( object )};
//! 		state.total.fetch_add( amount, Ordering::Relaxed );
//! 		Ok(())
//! 	})
//! }
//!
//! unsafe extern "C" fn value( object: *mut ObjectHeader ) -> u64 {
//! 	let state = ObjectBox::<CounterState, 2>::value_of( object );
//! 	state.total.load( Ordering::Relaxed )
//! }
//!
//! fn main() -> Result<(), Failure> {
//! 	let component: Handle<Component> = ObjectBox::spawn(
//! 		CounterState { total: AtomicU64::new( 0 )},
//! 		&COUNTER_LAYOUT,
//! 	);
//!
//! 	// Move sideways to the counter facet; both handles share one object.
//! 	let counter: Handle<Counter> = component.cast::<Counter>()?;
//! 	assert_eq!( component.strong_count(), 2 );
//! 	assert!( component.same_identity( &counter ));
//!
//! 	unsafe { ( counter.vtable().add )( counter.as_raw().object, 40 )}.consume()?;
//! 	unsafe { ( counter.vtable().add )( counter.as_raw().object, 2 )}.consume()?;
//! 	assert_eq!( unsafe { ( counter.vtable().value )( counter.as_raw().object )}, 42 );
//!
//! 	drop( component );
//! 	assert_eq!( counter.strong_count(), 1 );
//! 	Ok(())
//! }
//! ```
//!
//! # Modules and Configuration
//!
//! A module wraps three plain functions; the context resolves component
//! names to modules through the `[abilink.mapping]` section and runs each
//! module's init exactly once:
//!
//! ```
//! use abi_link::{
//! 	declare_module, factory_object, Component, ConfigSource, Context,
//! 	ContextHandle, Failure, FactoryHandle, Handle, ObjectBox, COMPONENT_LAYOUT,
//! };
//!
//! fn init( context: &ContextHandle ) -> Result<(), Failure> {
//! 	// Modules may read configuration during init.
//! 	let greeting = context.config_value( "greeter", "greeting" )?;
//! 	assert_eq!( greeting, "hello" );
//! 	Ok(())
//! }
//!
//! fn factory( name: &str ) -> Result<FactoryHandle, Failure> {
//! 	match name {
//! 		"greeter" => Ok( factory_object(|| Ok( ObjectBox::spawn( (), &COMPONENT_LAYOUT )))),
//! 		other => Err( Failure::NotFound( format!( "component {}", other ))),
//! 	}
//! }
//!
//! fn reflect() -> &'static str { "component greeter" }
//!
//! declare_module! { static GREETER_MODULE { init: init, factory: factory, reflect: reflect } }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//! 	let context = Context::initialize( &ConfigSource::inline( "
//! 		[abilink.mapping]
//! 		greeter = greeter_module
//!
//! 		[greeter]
//! 		greeting = hello
//! 	" ))?;
//!
//! 	// Builtins resolve by key before any dynamic library would load.
//! 	context.register_builtin( "greeter_module", GREETER_MODULE );
//!
//! 	let factory = context.factory( "greeter" )?;
//! 	let greeter: Handle<Component> = factory.create()?;
//! 	assert_eq!( greeter.strong_count(), 1 );
//! 	Ok(())
//! }
//! ```
//!
//! # Failure Channel
//!
//! Failures cross the boundary by code, not by type. A receiver that does
//! not recognise the exact code walks up the code's ancestry and replays the
//! nearest family it knows, message intact:
//!
//! ```
//! use abi_link::{ last_message, ErrorCode, Failure, RawToken };
//!
//! // A foreign build reports 0x02.66.01, a specialisation this build has
//! // never heard of, filed under the runtime family.
//! let code = ErrorCode::new( &[0x02, 0x66, 0x01] );
//! let token = RawToken::from_parts( code, "quota check failed" );
//! let failure = token.consume().unwrap_err();
//!
//! assert_eq!( failure, Failure::Runtime( "quota check failed".to_string() ));
//! assert_eq!( failure.code(), ErrorCode::RUNTIME );
//! assert_eq!( last_message().as_deref(), Some( "quota check failed" ));
//! ```
//!
//! # Important Notes
//!
//! **Init bodies must not request factories.** Module resolution holds its
//! memo lock across init, so an init entry that asks the context for a
//! factory deadlocks. Read configuration during init; resolve collaborators
//! lazily on first use.
//!
//! **Messages are bounded.** A failure message longer than
//! [`MESSAGE_CAPACITY`] bytes is truncated at a character boundary before
//! crossing the boundary.
//!
//! **The frozen mark is local.** [`Handle::freeze`] is a host-side
//! discipline; a facet sent through [`Handle::into_raw`] arrives unfrozen.

mod interface ;
mod abi ;
mod error ;
mod exception ;
mod object ;
mod handle ;
mod factory ;
mod config ;
mod module ;
mod loader ;
mod context ;

#[doc( no_inline )]
pub use nonempty_collections::{ NEMap, nem };

pub use interface::{ Component, Interface, Uuid };
pub use abi::{
	verify_layout, DispatchTable, Facet, LayoutError, StrView, TextPair,
	VTableHeader, VTableRef, ABI_VERSION, BUILD_FINGERPRINT,
};
pub use error::{ ErrorCode, Failure };
pub use exception::{ guard, last_message, RawFailure, RawToken, MESSAGE_CAPACITY };
pub use object::{ ObjectBox, ObjectHeader, ObjectLayout, COMPONENT_LAYOUT, LIFECYCLE };
pub use handle::Handle ;
pub use factory::{ factory_object, Factory, FactoryHandle, FactoryVTable };
pub use config::{ indirection, Config, ConfigError, ConfigSource, Section };
pub use module::{
	FactoryFn, InitFn, ModuleVTable, ReflectFn,
	FACTORY_SYMBOL, INIT_SYMBOL, REFLECT_SYMBOL,
};
pub use context::{
	BootstrapError, Context, ContextApi, ContextHandle, ContextVTable,
	Cursor, CursorHandle, CursorVTable, MAPPING_SECTION,
};
