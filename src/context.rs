//! The runtime context: configuration, module resolution, factories.
//!
//! The context is itself a component. Its object exposes the [`ContextApi`]
//! facet next to the component identity, and that facet is what a module's
//! init entry receives, so host code and module code reach the context
//! through the same dispatch tables. [`Context`] owns the root reference and
//! adds the host-side operations that never cross the boundary, plugin
//! selection and reflection among them.

use std::sync::{ Mutex, PoisonError };

use itertools::Itertools ;
use nonempty_collections::NEMap ;
use thiserror::Error ;

use crate::abi::{ verify_layout, DispatchTable, Facet, LayoutError, StrView, TextPair, VTableHeader, VTableRef };
use crate::config::{ indirection, Config, ConfigError, ConfigSource };
use crate::error::Failure ;
use crate::exception::{ guard, RawToken };
use crate::factory::{ Factory, FactoryHandle };
use crate::handle::Handle ;
use crate::interface::{ Component, Interface, Uuid };
use crate::loader::Loader ;
use crate::module::ModuleVTable ;
use crate::object::{ ObjectBox, ObjectHeader, ObjectLayout, LIFECYCLE };



/// The configuration section mapping component names to module keys.
pub const MAPPING_SECTION: &str = "abilink.mapping" ;

/// Rejection of a bootstrap attempt.
#[derive( Debug, Error )]
pub enum BootstrapError {
	#[error( "Configuration: {0}" )]
	Config( #[from] ConfigError ),
	#[error( "Memory Layout: {0}" )]
	Layout( #[from] LayoutError ),
	#[error( "Context Facet: {0}" )]
	Facet( #[from] Failure ),
}

/// Interface of the runtime context.
pub enum ContextApi {}

impl Interface for ContextApi {
	type VTable = ContextVTable ;
	const UUID: Uuid = Uuid::from_fields(
		0x83a0_4aee, 0x1d27, 0x4c11,
		[0x8b, 0x0a, 0x2a, 0x9e, 0x4d, 0xd1, 0x70, 0x2b],
	);
	const NAME: &'static str = "context" ;
}

/// Dispatch table of the [`ContextApi`] interface.
#[repr(C)]
#[derive( Clone, Copy )]
pub struct ContextVTable {
	pub header: VTableHeader,
	/// Resolves a component name to its factory facet.
	pub factory: unsafe extern "C" fn( object: *mut ObjectHeader, name: StrView, factory: *mut Facet ) -> RawToken,
	/// Reads one configuration value. The written view borrows from the
	/// context and must be copied out before the context is released.
	pub config_get: unsafe extern "C" fn( object: *mut ObjectHeader, section: StrView, key: StrView, value: *mut StrView ) -> RawToken,
	/// Spawns a cursor over the section names.
	pub sections: unsafe extern "C" fn( object: *mut ObjectHeader, cursor: *mut Facet ) -> RawToken,
	/// Spawns a cursor over one section's entries.
	pub entries: unsafe extern "C" fn( object: *mut ObjectHeader, section: StrView, cursor: *mut Facet ) -> RawToken,
}

unsafe impl DispatchTable for ContextVTable {}

/// Interface of forward-only enumeration cursors.
pub enum Cursor {}

impl Interface for Cursor {
	type VTable = CursorVTable ;
	const UUID: Uuid = Uuid::from_fields(
		0xc6dc_2f05, 0x7a48, 0x4d60,
		[0x93, 0x51, 0xee, 0x03, 0x25, 0xc7, 0x88, 0x9f],
	);
	const NAME: &'static str = "cursor" ;
}

/// Dispatch table of the [`Cursor`] interface.
///
/// A fresh cursor sits before its first entry; `advance` moves it forward
/// and `current` reads the entry it sits on. Both report out-of-range once
/// the cursor runs off the end.
#[repr(C)]
#[derive( Clone, Copy )]
pub struct CursorVTable {
	pub header: VTableHeader,
	/// Whether `advance` would land on an entry. Infallible.
	pub has_next: unsafe extern "C" fn( object: *mut ObjectHeader ) -> bool,
	pub advance: unsafe extern "C" fn( object: *mut ObjectHeader ) -> RawToken,
	/// Writes the current entry. The views borrow from the cursor and must
	/// be copied out before it is released.
	pub current: unsafe extern "C" fn( object: *mut ObjectHeader, pair: *mut TextPair ) -> RawToken,
}

unsafe impl DispatchTable for CursorVTable {}

struct CursorState {
	items: Vec<( String, String )>,
	// 0 is before the first entry; a positive position is 1-based.
	position: Mutex<usize>,
}

static CURSOR_TABLE: CursorVTable = CursorVTable {
	header: LIFECYCLE,
	has_next: cursor_has_next,
	advance: cursor_advance,
	current: cursor_current,
};

static CURSOR_LAYOUT: ObjectLayout<2> = ObjectLayout::new(
	[Component::UUID, Cursor::UUID],
	[VTableRef::new( &LIFECYCLE ), VTableRef::new( &CURSOR_TABLE )],
);

fn spawn_cursor( items: Vec<( String, String )> ) -> Result<CursorHandle, Failure> {
	let component = ObjectBox::spawn(
		CursorState { items, position: Mutex::new( 0 )},
		&CURSOR_LAYOUT,
	);
	component.cast::<Cursor>().map( CursorHandle::new )
}

unsafe extern "C" fn cursor_has_next( object: *mut ObjectHeader ) -> bool {
	let state = ObjectBox::<CursorState, 2>::value_of( object );
	let position = state.position.lock().unwrap_or_else( PoisonError::into_inner );
	*position < state.items.len()
}

unsafe extern "C" fn cursor_advance( object: *mut ObjectHeader ) -> RawToken {
	guard(|| {
		let state = unsafe { ObjectBox::<CursorState, 2>::value_of( object )};
		let mut position = state.position.lock().unwrap_or_else( PoisonError::into_inner );
		match *position < state.items.len() {
			true => {
				*position += 1 ;
				Ok(())
			}
			false => Err( Failure::OutOfRange(
				format!( "cursor exhausted after {} entries", state.items.len() ))),
		}
	})
}

unsafe extern "C" fn cursor_current( object: *mut ObjectHeader, pair: *mut TextPair ) -> RawToken {
	guard(|| {
		let state = unsafe { ObjectBox::<CursorState, 2>::value_of( object )};
		let position = *state.position.lock().unwrap_or_else( PoisonError::into_inner );
		if position == 0 {
			return Err( Failure::OutOfRange( "cursor is before the first entry".to_string() ))
		}
		let ( key, value ) = state.items.get( position - 1 ).ok_or_else(|| Failure::OutOfRange(
			format!( "cursor exhausted after {} entries", state.items.len() )))?;
		unsafe { *pair = TextPair { key: StrView::new( key ), value: StrView::new( value )}};
		Ok(())
	})
}

struct ContextState {
	config: Config,
	loader: Loader,
}

impl ContextState {

	fn module_key( &self, name: &str ) -> Result<&str, Failure> {
		let value = self.mapped_value( name )?;
		match indirection( value ) {
			Some( section ) => Err( Failure::InvalidArgument( format!(
				"component {} is plugin-mapped through [{}]; select a plugin", name, section ))),
			None => Ok( value ),
		}
	}

	fn plugin_section( &self, name: &str ) -> Result<&str, Failure> {
		let value = self.mapped_value( name )?;
		indirection( value ).ok_or_else(|| Failure::InvalidArgument(
			format!( "component {} is not plugin-mapped", name )))
	}

	fn mapped_value( &self, name: &str ) -> Result<&str, Failure> {
		self.config.value( MAPPING_SECTION, name ).ok_or_else(|| Failure::NotFound(
			format!( "component {} in [{}]", name, MAPPING_SECTION )))
	}

	fn factory( &self, name: &str, context: Facet ) -> Result<Facet, Failure> {
		let key = self.module_key( name )?;
		log::debug!( "factory {} served by module {}", name, key );
		self.loader.resolve( key, context )?.factory( name )
	}

	fn plugin_factory( &self, name: &str, plugin: &str, context: Facet ) -> Result<Facet, Failure> {
		let section = self.plugin_section( name )?;
		let key = self.config.value( section, plugin ).ok_or_else(|| Failure::NotFound(
			format!( "plugin {} in [{}]", plugin, section )))?;
		log::debug!( "factory {} served by plugin {} through module {}", name, plugin, key );
		self.loader.resolve( key, context )?.factory( name )
	}

	fn mappings( &self, name: &str ) -> Result<NEMap<String, String>, Failure> {
		let section_name = self.plugin_section( name )?;
		let section = self.config.section( section_name ).ok_or_else(|| Failure::NotFound(
			format!( "section [{}]", section_name )))?;
		let mut entries = section.entries();
		let Some(( first_plugin, first_key )) = entries.next() else {
			return Err( Failure::NotFound( format!( "section [{}] is empty", section_name )))
		};
		let mut map = NEMap::new( first_plugin.to_string(), first_key.to_string() );
		for ( plugin, key ) in entries {
			map.insert( plugin.to_string(), key.to_string() );
		}
		Ok( map )
	}

	fn reflect( &self, name: &str, context: Facet ) -> Result<String, Failure> {
		let value = self.mapped_value( name )?;
		match indirection( value ) {
			None => self.loader.resolve( value, context )?.reflect(),
			Some( section_name ) => {
				let section = self.config.section( section_name ).ok_or_else(|| Failure::NotFound(
					format!( "section [{}]", section_name )))?;
				let mut lines = Vec::with_capacity( section.len() );
				for ( plugin, key ) in section.entries().sorted_by(| left, right | left.0.cmp( &right.0 )) {
					let text = self.loader.resolve( key, context )?.reflect()?;
					lines.push( format!( "{}: {}", plugin, text ));
				}
				Ok( lines.iter().join( "\n" ))
			}
		}
	}

	fn value( &self, section: &str, key: &str ) -> Result<&str, Failure> {
		let found = self.config.section( section ).ok_or_else(|| Failure::NotFound(
			format!( "section [{}]", section )))?;
		found.get( key ).ok_or_else(|| Failure::NotFound(
			format!( "key {} in [{}]", key, section )))
	}

	fn sections_cursor( &self ) -> Result<CursorHandle, Failure> {
		let items = self.config.section_names()
			.map(| name | ( name.to_string(), String::new() ))
			.collect();
		spawn_cursor( items )
	}

	fn entries_cursor( &self, section: &str ) -> Result<CursorHandle, Failure> {
		let found = self.config.section( section ).ok_or_else(|| Failure::NotFound(
			format!( "section [{}]", section )))?;
		let items = found.entries()
			.map(|( key, value )| ( key.to_string(), value.to_string() ))
			.collect();
		spawn_cursor( items )
	}

}

static CONTEXT_TABLE: ContextVTable = ContextVTable {
	header: LIFECYCLE,
	factory: context_factory,
	config_get: context_config_get,
	sections: context_sections,
	entries: context_entries,
};

static CONTEXT_LAYOUT: ObjectLayout<2> = ObjectLayout::new(
	[Component::UUID, ContextApi::UUID],
	[VTableRef::new( &LIFECYCLE ), VTableRef::new( &CONTEXT_TABLE )],
);

// The context facet handed to module init, freshly acquired.
unsafe fn own_port( object: *mut ObjectHeader ) -> Handle<ContextApi> {
	let facet = ( LIFECYCLE.cast )( object, &ContextApi::UUID );
	debug_assert!( !facet.is_null(), "context object lost its facet" );
	Handle::from_raw( facet )
}

unsafe extern "C" fn context_factory( object: *mut ObjectHeader, name: StrView, factory: *mut Facet ) -> RawToken {
	guard(|| {
		let state = unsafe { ObjectBox::<ContextState, 2>::value_of( object )};
		let name = unsafe { name.to_str() }.map_err(| _ | Failure::InvalidArgument(
			"component name is not valid UTF-8".to_string() ))?;
		let port = unsafe { own_port( object )};
		let product = state.factory( name, port.as_raw() )?;
		unsafe { *factory = product };
		Ok(())
	})
}

unsafe extern "C" fn context_config_get( object: *mut ObjectHeader, section: StrView, key: StrView, value: *mut StrView ) -> RawToken {
	guard(|| {
		let state = unsafe { ObjectBox::<ContextState, 2>::value_of( object )};
		let section = unsafe { section.to_str() }.map_err(| _ | Failure::InvalidArgument(
			"section name is not valid UTF-8".to_string() ))?;
		let key = unsafe { key.to_str() }.map_err(| _ | Failure::InvalidArgument(
			"key is not valid UTF-8".to_string() ))?;
		let found = state.value( section, key )?;
		unsafe { *value = StrView::new( found )};
		Ok(())
	})
}

unsafe extern "C" fn context_sections( object: *mut ObjectHeader, cursor: *mut Facet ) -> RawToken {
	guard(|| {
		let state = unsafe { ObjectBox::<ContextState, 2>::value_of( object )};
		let handle = state.sections_cursor()?;
		unsafe { *cursor = handle.into_raw() };
		Ok(())
	})
}

unsafe extern "C" fn context_entries( object: *mut ObjectHeader, section: StrView, cursor: *mut Facet ) -> RawToken {
	guard(|| {
		let state = unsafe { ObjectBox::<ContextState, 2>::value_of( object )};
		let section = unsafe { section.to_str() }.map_err(| _ | Failure::InvalidArgument(
			"section name is not valid UTF-8".to_string() ))?;
		let handle = state.entries_cursor( section )?;
		unsafe { *cursor = handle.into_raw() };
		Ok(())
	})
}

/// A [`Handle`]( crate::Handle ) to the context facet, with the dispatch
/// protocols spelled out. This is what a module's init entry receives.
#[derive( Debug, Clone )]
pub struct ContextHandle {
	handle: Handle<ContextApi>,
}

impl ContextHandle {

	pub fn new( handle: Handle<ContextApi> ) -> Self { Self { handle }}

	/// Adopts a borrowed context facet, acquiring its own reference.
	///
	/// # Safety
	/// `facet` must be non-null and refer to a live context object.
	pub unsafe fn from_borrowed( facet: Facet ) -> Self {
		(( *facet.vtable ).acquire )( facet.object );
		Self { handle: Handle::from_raw( facet )}
	}

	#[inline] pub fn handle( &self ) -> &Handle<ContextApi> { &self.handle }

	/// Resolves a component name to its factory.
	///
	/// # Errors
	/// [`Failure::NotFound`] for an unmapped name,
	/// [`Failure::InvalidArgument`] for a plugin-mapped one, and whatever
	/// loading or module init reports.
	pub fn factory( &self, name: &str ) -> Result<FactoryHandle, Failure> {
		let mut facet = Facet::NULL ;
		let token = unsafe { ( self.handle.vtable().factory )(
			self.handle.as_raw().object, StrView::new( name ), &mut facet )};
		token.consume()?;
		adopt::<Factory>( facet, "a factory" ).map( FactoryHandle::new )
	}

	/// Reads one configuration value.
	///
	/// # Errors
	/// [`Failure::NotFound`] when the section or key is missing.
	pub fn config_value( &self, section: &str, key: &str ) -> Result<String, Failure> {
		let mut view = StrView::EMPTY ;
		let token = unsafe { ( self.handle.vtable().config_get )(
			self.handle.as_raw().object, StrView::new( section ), StrView::new( key ), &mut view )};
		token.consume()?;
		unsafe { view.to_str() }
			.map( str::to_string )
			.map_err(| _ | Failure::Incompatible( "configuration value is not valid UTF-8".to_string() ))
	}

	/// Spawns a cursor over the configuration's section names.
	///
	/// # Errors
	/// Whatever failure the context reports.
	pub fn sections( &self ) -> Result<CursorHandle, Failure> {
		let mut facet = Facet::NULL ;
		let token = unsafe { ( self.handle.vtable().sections )(
			self.handle.as_raw().object, &mut facet )};
		token.consume()?;
		adopt::<Cursor>( facet, "a cursor" ).map( CursorHandle::new )
	}

	/// Spawns a cursor over one section's entries.
	///
	/// # Errors
	/// [`Failure::NotFound`] when the section is missing.
	pub fn entries( &self, section: &str ) -> Result<CursorHandle, Failure> {
		let mut facet = Facet::NULL ;
		let token = unsafe { ( self.handle.vtable().entries )(
			self.handle.as_raw().object, StrView::new( section ), &mut facet )};
		token.consume()?;
		adopt::<Cursor>( facet, "a cursor" ).map( CursorHandle::new )
	}

}

fn adopt<I: Interface>( facet: Facet, what: &str ) -> Result<Handle<I>, Failure> {
	match facet.is_null() {
		true => Err( Failure::Logic( format!( "context reported success without {}", what ))),
		false => Ok( unsafe { Handle::from_raw( facet )}),
	}
}

/// A [`Handle`]( crate::Handle ) to a cursor, with the iteration protocol
/// spelled out. Also iterates directly, yielding owned key/value pairs.
#[derive( Debug, Clone )]
pub struct CursorHandle {
	handle: Handle<Cursor>,
}

impl CursorHandle {

	pub fn new( handle: Handle<Cursor> ) -> Self { Self { handle }}

	/// Adopts a raw cursor facet.
	///
	/// # Safety
	/// `facet` must be non-null, refer to a live object implementing
	/// [`Cursor`], and carry a strong reference this wrapper becomes
	/// responsible for.
	pub unsafe fn from_raw( facet: Facet ) -> Self {
		Self { handle: Handle::from_raw( facet )}
	}

	/// Surrenders the cursor facet for transport across the dispatch
	/// boundary.
	pub fn into_raw( self ) -> Facet { self.handle.into_raw() }

	#[inline] pub fn handle( &self ) -> &Handle<Cursor> { &self.handle }

	/// Whether an entry remains ahead of the cursor.
	pub fn has_next( &self ) -> bool {
		unsafe { ( self.handle.vtable().has_next )( self.handle.as_raw().object )}
	}

	/// Moves the cursor onto its next entry.
	///
	/// # Errors
	/// [`Failure::OutOfRange`] when no entry remains.
	pub fn advance( &self ) -> Result<(), Failure> {
		unsafe { ( self.handle.vtable().advance )( self.handle.as_raw().object )}.consume()
	}

	/// Reads the entry the cursor sits on.
	///
	/// # Errors
	/// [`Failure::OutOfRange`] before the first
	/// [`advance`]( Self::advance ) and after the cursor runs off the end.
	pub fn current( &self ) -> Result<( String, String ), Failure> {
		let mut pair = TextPair::EMPTY ;
		unsafe { ( self.handle.vtable().current )( self.handle.as_raw().object, &mut pair )}.consume()?;
		let key = unsafe { pair.key.to_str() }
			.map_err(| _ | Failure::Incompatible( "cursor key is not valid UTF-8".to_string() ))?;
		let value = unsafe { pair.value.to_str() }
			.map_err(| _ | Failure::Incompatible( "cursor value is not valid UTF-8".to_string() ))?;
		Ok(( key.to_string(), value.to_string() ))
	}

}

impl Iterator for CursorHandle {
	type Item = Result<( String, String ), Failure> ;

	fn next( &mut self ) -> Option<Self::Item> {
		match self.has_next() {
			true => Some( self.advance().and_then(| () | self.current() )),
			false => None,
		}
	}
}

/// The bootstrapped runtime, owning the root reference to the context
/// object.
///
/// Dropping the last [`Context`] releases the context object; modules stay
/// loaded for the life of the process.
#[derive( Debug )]
pub struct Context {
	port: ContextHandle,
}

impl Context {

	/// Bootstraps a runtime from a configuration source. Independent calls
	/// produce independent runtimes with separate loaders.
	///
	/// # Errors
	/// [`BootstrapError`] when the process memory layout fails
	/// verification, the configuration cannot be parsed, or the context
	/// object cannot be spawned.
	pub fn initialize( source: &ConfigSource ) -> Result<Self, BootstrapError> {
		verify_layout()?;
		let config = source.load()?;
		log::info!( "context initialised with {} sections", config.len() );
		let component = ObjectBox::spawn(
			ContextState { config, loader: Loader::new() },
			&CONTEXT_LAYOUT,
		);
		let handle = component.cast::<ContextApi>()?;
		Ok( Self { port: ContextHandle::new( handle )})
	}

	/// The context facet, as modules see it.
	#[inline] pub fn port( &self ) -> &ContextHandle { &self.port }

	fn state( &self ) -> &ContextState {
		unsafe { ObjectBox::<ContextState, 2>::value_of( self.port.handle.as_raw().object )}
	}

	/// Registers an in-process module under a key, shadowing any dynamic
	/// library the key would otherwise load.
	pub fn register_builtin( &self, key: &str, vtable: ModuleVTable ) {
		self.state().loader.register_builtin( key, vtable );
	}

	/// Resolves a component name to its factory, through the dispatch
	/// boundary.
	///
	/// # Errors
	/// As [`ContextHandle::factory`].
	pub fn factory( &self, name: &str ) -> Result<FactoryHandle, Failure> {
		self.port.factory( name )
	}

	/// Resolves a plugin-mapped component name through one of its plugins.
	///
	/// # Errors
	/// [`Failure::InvalidArgument`] when the name is not plugin-mapped,
	/// [`Failure::NotFound`] for an unknown plugin, and whatever loading or
	/// module init reports.
	pub fn plugin_factory( &self, name: &str, plugin: &str ) -> Result<FactoryHandle, Failure> {
		let facet = self.state().plugin_factory( name, plugin, self.port.handle.as_raw() )?;
		Ok( FactoryHandle::new( unsafe { Handle::from_raw( facet )}))
	}

	/// The plugin-id to module-key mappings of a plugin-mapped component.
	///
	/// # Errors
	/// [`Failure::InvalidArgument`] when the name is not plugin-mapped,
	/// [`Failure::NotFound`] when the mapping section is missing or empty.
	pub fn plugin_mappings( &self, name: &str ) -> Result<NEMap<String, String>, Failure> {
		self.state().mappings( name )
	}

	/// The definition text of a component's module. For a plugin-mapped
	/// name, one line per plugin in plugin order.
	///
	/// # Errors
	/// [`Failure::NotFound`] for an unmapped name, and whatever loading or
	/// the module's reflect entry reports.
	pub fn reflect( &self, name: &str ) -> Result<String, Failure> {
		self.state().reflect( name, self.port.handle.as_raw() )
	}

	/// Reads one configuration value, through the dispatch boundary.
	///
	/// # Errors
	/// As [`ContextHandle::config_value`].
	pub fn config_value( &self, section: &str, key: &str ) -> Result<String, Failure> {
		self.port.config_value( section, key )
	}

	/// Spawns a cursor over the configuration's section names.
	///
	/// # Errors
	/// As [`ContextHandle::sections`].
	pub fn config( &self ) -> Result<CursorHandle, Failure> {
		self.port.sections()
	}

	/// Spawns a cursor over one section's entries.
	///
	/// # Errors
	/// As [`ContextHandle::entries`].
	pub fn config_section( &self, section: &str ) -> Result<CursorHandle, Failure> {
		self.port.entries( section )
	}

}
