use abi_link::{ ErrorCode, Failure, RawToken };


#[test]
fn error_unknown_child_degrades_to_the_nearest_ancestor() {

	let token = RawToken::from_parts( ErrorCode::new( &[0x02, 0x66, 0x01] ), "quota exceeded" );
	match token.consume() {
		Err( Failure::Runtime( message )) => assert_eq!( message, "quota exceeded" ),
		value => panic!( "Expected Runtime, found: {:#?}", value ),
	}
}

#[test]
fn error_unknown_module_child_degrades_to_module() {

	let token = RawToken::from_parts( ErrorCode::MODULE.child( 0x7F ), "bridge fell over" );
	match token.consume() {
		Err( Failure::Module( message )) => assert_eq!( message, "bridge fell over" ),
		value => panic!( "Expected Module, found: {:#?}", value ),
	}
}

#[test]
fn error_known_code_replays_its_exact_variant() {

	let token = RawToken::from_parts( ErrorCode::DIVIDE_BY_ZERO, "7 / 0" );
	match token.consume() {
		Err( Failure::DivideByZero( message )) => assert_eq!( message, "7 / 0" ),
		value => panic!( "Expected DivideByZero, found: {:#?}", value ),
	}
}

#[test]
fn error_unknown_family_falls_back_to_unrecognized() {

	let code = ErrorCode::new( &[0x7A, 0x01] );
	let token = RawToken::from_parts( code, "novel failure" );
	match token.consume() {
		Err( Failure::Unrecognized { code: seen, message }) => {
			assert_eq!( seen, code );
			assert_eq!( message, "novel failure" );
		}
		value => panic!( "Expected Unrecognized, found: {:#?}", value ),
	}
}

#[test]
fn error_decode_keeps_exact_codes_stable() {

	let failure = Failure::decode( ErrorCode::OUT_OF_RANGE, "index 9 of 3".to_string() );
	assert_eq!( failure, Failure::OutOfRange( "index 9 of 3".to_string() ));

	let failure = Failure::decode( ErrorCode::FOREIGN, "longjmp".to_string() );
	assert_eq!( failure, Failure::Foreign( "longjmp".to_string() ));
}

#[test]
fn error_decode_degrades_through_several_levels() {

	let code = ErrorCode::DIVIDE_BY_ZERO.child( 0x01 ).child( 0x02 );
	let failure = Failure::decode( code, "deep specialisation".to_string() );
	assert_eq!( failure, Failure::DivideByZero( "deep specialisation".to_string() ));
}
