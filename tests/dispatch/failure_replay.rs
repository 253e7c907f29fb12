use abi_link::{ last_message, ErrorCode, Failure };

use crate::fixtures::{ quota, ratio, spawn_tally, Tally };


#[test]
fn dispatch_divide_by_zero_replays_exactly() {

	let tally = spawn_tally().cast::<Tally>().expect( "tally facet" );

	assert_eq!( ratio( &tally, 84, 2 ).expect( "quotient" ), 42 );

	match ratio( &tally, 84, 0 ) {
		Err( Failure::DivideByZero( message )) => assert_eq!( message, "84 / 0" ),
		value => panic!( "Expected DivideByZero, found: {:#?}", value ),
	}
}

#[test]
fn dispatch_unknown_specialisation_degrades_to_its_family() {

	let tally = spawn_tally().cast::<Tally>().expect( "tally facet" );

	match quota( &tally ) {
		Err( Failure::Runtime( message )) => assert_eq!( message, "tally quota exhausted" ),
		value => panic!( "Expected Runtime, found: {:#?}", value ),
	}
	assert_eq!( last_message().as_deref(), Some( "tally quota exhausted" ));
}

#[test]
fn dispatch_failure_keeps_its_code_across_the_boundary() {

	let tally = spawn_tally().cast::<Tally>().expect( "tally facet" );

	let failure = ratio( &tally, 1, 0 ).expect_err( "zero denominator" );
	assert_eq!( failure.code(), ErrorCode::DIVIDE_BY_ZERO );
	assert!( failure.code().starts_with( ErrorCode::ARITHMETIC ));
}
