use abi_link::Failure ;

use crate::fixtures::{ FAILING_MODULE, TALLY_MODULE };


#[test]
fn loader_unmapped_component_is_not_found() {

	let context = runtime!( "
		[abilink.mapping]
		known = some_module
	" );

	match context.factory( "unknown" ) {
		Err( Failure::NotFound( message )) => assert!( message.contains( "unknown" )),
		value => panic!( "Expected NotFound, found: {:#?}", value ),
	}
}

#[test]
fn loader_missing_library_reports_module_load() {

	let context = runtime!( "
		[abilink.mapping]
		ghost = /nonexistent/path/libghost.so
	" );

	match context.factory( "ghost" ) {
		Err( Failure::ModuleLoad( message )) => assert!( message.contains( "libghost" )),
		value => panic!( "Expected ModuleLoad, found: {:#?}", value ),
	}
}

#[test]
fn loader_failed_init_is_reported_and_not_memoised() {

	let context = runtime!( "
		[abilink.mapping]
		broken = failing_module
	", builtins = { "failing_module" => FAILING_MODULE } );

	match context.factory( "broken" ) {
		Err( Failure::Runtime( message )) => assert_eq!( message, "init rejected by fixture" ),
		value => panic!( "Expected Runtime, found: {:#?}", value ),
	}

	// A second request initialises again instead of serving the failed run.
	match context.factory( "broken" ) {
		Err( Failure::Runtime( message )) => assert_eq!( message, "init rejected by fixture" ),
		value => panic!( "Expected Runtime, found: {:#?}", value ),
	}
}

#[test]
fn loader_module_refuses_foreign_component_names() {

	let context = runtime!( "
		[abilink.mapping]
		stranger = tally_module
	", builtins = { "tally_module" => TALLY_MODULE } );

	match context.factory( "stranger" ) {
		Err( Failure::NotFound( message )) => assert!( message.contains( "stranger" )),
		value => panic!( "Expected NotFound, found: {:#?}", value ),
	}
}
