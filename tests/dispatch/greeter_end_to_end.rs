use abi_link::Component ;

use crate::fixtures::{ greeting, Greet, GREETER_MODULE };


#[test]
fn dispatch_greeter_end_to_end() {

	let context = runtime!( "
		[abilink.mapping]
		greeter = greeter_module

		[greeter]
		greeting = good morning
	", builtins = { "greeter_module" => GREETER_MODULE } );

	let factory = context.factory( "greeter" ).expect( "greeter factory" );
	let component = factory.create().expect( "greeter component" );
	assert!( component.cast::<Component>().expect( "component facet" ).same_identity( &component ));

	let greet = component.cast::<Greet>().expect( "greet facet" );
	assert_eq!( greeting( &greet ).expect( "greeting" ), "good morning" );

	// The module read its greeting during init, through the context facet
	// it was handed.
	assert_eq!( context.config_value( "greeter", "greeting" ).expect( "value" ), "good morning" );
}
