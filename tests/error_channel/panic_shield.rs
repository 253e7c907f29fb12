use abi_link::{ guard, last_message, ErrorCode, Failure };


#[test]
fn error_guard_captures_str_panics() {

	let token = guard(|| panic!( "fixture panicked on purpose" ));
	match token.consume() {
		Err( Failure::Foreign( message )) => assert_eq!( message, "fixture panicked on purpose" ),
		value => panic!( "Expected Foreign, found: {:#?}", value ),
	}
}

#[test]
fn error_guard_captures_formatted_panics() {

	let denominator = 0 ;
	let token = guard(|| panic!( "division by {}", denominator ));
	match token.consume() {
		Err( Failure::Foreign( message )) => assert_eq!( message, "division by 0" ),
		value => panic!( "Expected Foreign, found: {:#?}", value ),
	}
}

#[test]
fn error_guard_names_opaque_panic_payloads() {

	let token = guard(|| std::panic::panic_any( 42_u32 ));
	match token.consume() {
		Err( Failure::Foreign( message )) => assert_eq!( message, "unidentified panic payload" ),
		value => panic!( "Expected Foreign, found: {:#?}", value ),
	}
}

#[test]
fn error_captured_panic_lands_in_the_foreign_family() {

	let failure = guard(|| panic!( "classified" )).consume().unwrap_err();
	assert_eq!( failure.code(), ErrorCode::FOREIGN );
	assert_eq!( last_message().as_deref(), Some( "classified" ));
}
