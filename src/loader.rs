//! Module resolution: builtins first, dynamic libraries by path.
//!
//! Resolution is memoized by exact key. The winning resolver loads the
//! module, runs its init entry exactly once, and leaks it for the life of
//! the process; a failed init is not memoized, so a later resolve may retry.
//! The memo lock is held across init, which means an init body must not
//! resolve modules itself.

use std::collections::HashMap ;
use std::sync::{ Mutex, PoisonError };

use libloading::Library ;

use crate::abi::{ Facet, StrView };
use crate::error::Failure ;
use crate::module::{
	FactoryFn, InitFn, ModuleVTable, ReflectFn,
	FACTORY_SYMBOL, INIT_SYMBOL, REFLECT_SYMBOL,
};



/// One resolved module, entries ready to dispatch.
pub(crate) struct LoadedModule {
	key: String,
	vtable: ModuleVTable,
	_library: Option<Library>,
}

impl LoadedModule {

	fn builtin( key: &str, vtable: ModuleVTable ) -> Self {
		Self { key: key.to_string(), vtable, _library: None }
	}

	fn open( key: &str ) -> Result<Self, Failure> {
		let library = unsafe { Library::new( key )}
			.map_err(| error | Failure::ModuleLoad( format!( "{}: {}", key, error )))?;
		let vtable = ModuleVTable {
			init: raw_symbol::<InitFn>( &library, key, INIT_SYMBOL )?,
			factory: raw_symbol::<FactoryFn>( &library, key, FACTORY_SYMBOL )?,
			reflect: raw_symbol::<ReflectFn>( &library, key, REFLECT_SYMBOL )?,
		};
		Ok( Self { key: key.to_string(), vtable, _library: Some( library )})
	}

	fn init( &self, context: Facet ) -> Result<(), Failure> {
		unsafe { ( self.vtable.init )( context )}.consume()
	}

	/// Requests the factory for a component name from this module.
	pub(crate) fn factory( &self, name: &str ) -> Result<Facet, Failure> {
		let mut facet = Facet::NULL ;
		let token = unsafe { ( self.vtable.factory )( StrView::new( name ), &mut facet )};
		token.consume()?;
		match facet.is_null() {
			true => Err( Failure::Logic(
				format!( "module {} reported success without a factory", self.key ))),
			false => Ok( facet ),
		}
	}

	/// The module's definition text.
	pub(crate) fn reflect( &self ) -> Result<String, Failure> {
		let view = unsafe { ( self.vtable.reflect )() };
		unsafe { view.to_str() }
			.map( str::to_string )
			.map_err(| _ | Failure::Incompatible(
				format!( "module {} definition text is not valid UTF-8", self.key )))
	}

}

pub(crate) struct Loader {
	builtins: Mutex<HashMap<String, ModuleVTable>>,
	resolved: Mutex<HashMap<String, &'static LoadedModule>>,
}

impl Loader {

	pub(crate) fn new() -> Self {
		Self {
			builtins: Mutex::new( HashMap::new() ),
			resolved: Mutex::new( HashMap::new() ),
		}
	}

	/// Registers an in-process module under a key, shadowing any dynamic
	/// library the key would otherwise load.
	pub(crate) fn register_builtin( &self, key: &str, vtable: ModuleVTable ) {
		let mut builtins = self.builtins.lock().unwrap_or_else( PoisonError::into_inner );
		if builtins.insert( key.to_string(), vtable ).is_some() {
			log::warn!( "builtin module {} replaced", key );
		}
	}

	/// Resolves a module key, initialising the module on first resolution.
	pub(crate) fn resolve( &self, key: &str, context: Facet ) -> Result<&'static LoadedModule, Failure> {
		let mut resolved = self.resolved.lock().unwrap_or_else( PoisonError::into_inner );
		if let Some( module ) = resolved.get( key ).copied() {
			return Ok( module )
		}
		let builtin = self.builtins.lock()
			.unwrap_or_else( PoisonError::into_inner )
			.get( key )
			.copied();
		let module = match builtin {
			Some( vtable ) => LoadedModule::builtin( key, vtable ),
			None => LoadedModule::open( key )?,
		};
		module.init( context )?;
		// Modules stay loaded for the life of the process.
		let module = &*Box::leak( Box::new( module ));
		resolved.insert( key.to_string(), module );
		log::info!( "module {} resolved and initialised", key );
		Ok( module )
	}

}

fn raw_symbol<T: Copy>( library: &Library, key: &str, name: &str ) -> Result<T, Failure> {
	unsafe { library.get::<T>( name.as_bytes() )}
		.map(| symbol | *symbol )
		.map_err(| _ | Failure::MissingSymbol( format!( "{} in {}", name, key )))
}
