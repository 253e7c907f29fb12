use abi_link::{
	export_module, Facet, FactoryHandle, StrView,
	ABI_VERSION, FACTORY_SYMBOL, INIT_SYMBOL, REFLECT_SYMBOL,
};

use crate::fixtures::{ total, Tally };


export_module!( crate::fixtures::TALLY_MODULE );

#[test]
fn loader_symbol_names_carry_the_revision() {

	assert_eq!( INIT_SYMBOL, "abilink_init_v1" );
	assert_eq!( FACTORY_SYMBOL, "abilink_factory_v1" );
	assert_eq!( REFLECT_SYMBOL, "abilink_reflect_v1" );

	let suffix = format!( "_v{}", ABI_VERSION );
	assert!( INIT_SYMBOL.ends_with( &suffix ));
	assert!( FACTORY_SYMBOL.ends_with( &suffix ));
	assert!( REFLECT_SYMBOL.ends_with( &suffix ));
}

#[test]
fn loader_exported_reflect_forwards_to_the_module() {

	let text = unsafe { abilink_reflect_v1() };
	assert_eq!(
		unsafe { text.to_str() }.expect( "definition text" ),
		"component tally (operations add, total, ratio, quota)",
	);
}

#[test]
fn loader_exported_factory_serves_a_component() {

	let mut facet = Facet::NULL ;
	unsafe { abilink_factory_v1( StrView::new( "tally" ), &mut facet )}
		.consume().expect( "factory facet" );
	assert!( !facet.is_null() );

	let factory = unsafe { FactoryHandle::from_raw( facet )};
	let component = factory.create().expect( "tally component" );
	let tally = component.cast::<Tally>().expect( "tally facet" );
	assert_eq!( total( &tally ), 0 );
}

#[test]
fn loader_exported_factory_rejects_unknown_names() {

	let mut facet = Facet::NULL ;
	let result = unsafe { abilink_factory_v1( StrView::new( "stranger" ), &mut facet )}.consume();
	assert!( result.is_err() );
	assert!( facet.is_null() );
}

#[test]
fn loader_exported_init_accepts_a_context_facet() {

	let context = runtime!( "
		[abilink.mapping]
		unused = nothing
	" );

	unsafe { abilink_init_v1( context.port().handle().as_raw() )}
		.consume().expect( "module init" );
}
