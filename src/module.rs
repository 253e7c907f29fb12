//! The module contract: three versioned entry points.
//!
//! A module, builtin or dynamically loaded, exposes exactly three entries:
//! `init` runs once against the context, `factory` serves component
//! factories by name, `reflect` returns the module's definition text.
//! [`declare_module!`]( crate::declare_module ) wraps plain Rust functions
//! into the extern-"C" glue; [`export_module!`]( crate::export_module )
//! additionally exports the entries under their versioned symbol names for
//! dynamic loading.

use crate::abi::{ Facet, StrView };
use crate::exception::RawToken ;



/// Symbol of the init entry. The ABI revision rides in the suffix, so an
/// incompatible module fails resolution instead of dispatching wrong.
pub const INIT_SYMBOL: &str = "abilink_init_v1" ;
/// Symbol of the factory entry.
pub const FACTORY_SYMBOL: &str = "abilink_factory_v1" ;
/// Symbol of the reflect entry.
pub const REFLECT_SYMBOL: &str = "abilink_reflect_v1" ;

/// Runs once before any factory request, against the context facet. The
/// facet is borrowed; the module acquires its own reference when it keeps
/// the context.
pub type InitFn = unsafe extern "C" fn( context: Facet ) -> RawToken ;

/// Serves the factory for a component name, writing its facet to `factory`
/// on success.
pub type FactoryFn = unsafe extern "C" fn( name: StrView, factory: *mut Facet ) -> RawToken ;

/// Returns the module's definition text. The text must live as long as the
/// module stays loaded.
pub type ReflectFn = unsafe extern "C" fn() -> StrView ;

/// The three entries of one module.
#[derive( Debug, Clone, Copy )]
pub struct ModuleVTable {
    pub init: InitFn,
    pub factory: FactoryFn,
    pub reflect: ReflectFn,
}

/// Declares a module table from three plain Rust functions, generating the
/// extern-"C" glue around them. Failures and panics inside the functions
/// are captured into the returned tokens.
///
/// The functions are
/// `init( &ContextHandle ) -> Result<(), Failure>`,
/// `factory( &str ) -> Result<FactoryHandle, Failure>` and
/// `reflect() -> &'static str`.
///
/// ```
/// use abi_link::{ declare_module, factory_object, ContextHandle, Failure, FactoryHandle };
///
/// fn init( _context: &ContextHandle ) -> Result<(), Failure> { Ok(()) }
///
/// fn factory( name: &str ) -> Result<FactoryHandle, Failure> {
///     match name {
///         "nil" => Ok( factory_object(|| Err( Failure::Logic( "nil factory".to_string() )))),
///         other => Err( Failure::NotFound( format!( "component {}", other ))),
///     }
/// }
///
/// fn reflect() -> &'static str { "component nil" }
///
/// declare_module! { pub static NIL_MODULE { init: init, factory: factory, reflect: reflect } }
/// ```
#[macro_export]
macro_rules! declare_module {
    ( $vis:vis static $name:ident { init: $init:path, factory: $factory:path, reflect: $reflect:path $(,)? } ) => {
        $vis static $name: $crate::ModuleVTable = {
            unsafe extern "C" fn init_entry( context: $crate::Facet ) -> $crate::RawToken {
                $crate::guard(|| {
                    let context = unsafe { $crate::ContextHandle::from_borrowed( context )};
                    $init( &context )
                })
            }
            unsafe extern "C" fn factory_entry(
                name: $crate::StrView,
                factory: *mut $crate::Facet,
            ) -> $crate::RawToken {
                $crate::guard(|| {
                    let name = unsafe { name.to_str() }.map_err(| _ | $crate::Failure::InvalidArgument(
                        "factory name is not valid UTF-8".to_string(),
                    ))?;
                    let product = $factory( name )?;
                    unsafe { *factory = product.into_raw() };
                    Ok(())
                })
            }
            unsafe extern "C" fn reflect_entry() -> $crate::StrView {
                $crate::StrView::new( $reflect() )
            }
            $crate::ModuleVTable {
                init: init_entry,
                factory: factory_entry,
                reflect: reflect_entry,
            }
        };
    };
}

/// Exports a declared module table under the versioned symbol names, making
/// the enclosing library loadable by path.
#[macro_export]
macro_rules! export_module {
    ( $table:path ) => {
        #[no_mangle]
        pub unsafe extern "C" fn abilink_init_v1( context: $crate::Facet ) -> $crate::RawToken {
            ( $table.init )( context )
        }

        #[no_mangle]
        pub unsafe extern "C" fn abilink_factory_v1(
            name: $crate::StrView,
            factory: *mut $crate::Facet,
        ) -> $crate::RawToken {
            ( $table.factory )( name, factory )
        }

        #[no_mangle]
        pub unsafe extern "C" fn abilink_reflect_v1() -> $crate::StrView {
            ( $table.reflect )()
        }
    };
}
