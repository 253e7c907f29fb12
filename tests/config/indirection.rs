use abi_link::indirection ;


#[test]
fn config_indirection_reads_bracketed_values() {

	assert_eq!( indirection( "[plugins.compression]" ), Some( "plugins.compression" ));
	assert_eq!( indirection( "[ padded ]" ), Some( "padded" ));
}

#[test]
fn config_indirection_ignores_plain_values() {

	assert_eq!( indirection( "module.so" ), None );
	assert_eq!( indirection( "./relative/path" ), None );
}

#[test]
fn config_indirection_ignores_partial_brackets() {

	assert_eq!( indirection( "[unclosed" ), None );
	assert_eq!( indirection( "closed]" ), None );
	assert_eq!( indirection( "[]" ), None );
	assert_eq!( indirection( "[  ]" ), None );
}
