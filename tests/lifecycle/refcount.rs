use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Arc ;

use abi_link::{ Component, Handle };

use crate::fixtures::{ spawn_probe, Tally };


#[test]
fn lifecycle_clone_acquires_drop_releases() {

	let drops = Arc::new( AtomicUsize::new( 0 ));
	let component = spawn_probe( drops.clone() );
	assert_eq!( component.strong_count(), 1 );

	let sibling = component.clone();
	assert_eq!( component.strong_count(), 2 );

	drop( sibling );
	assert_eq!( component.strong_count(), 1 );
	assert_eq!( drops.load( Ordering::SeqCst ), 0 );

	drop( component );
	assert_eq!( drops.load( Ordering::SeqCst ), 1 );
}

#[test]
fn lifecycle_cast_shares_one_count() {

	let drops = Arc::new( AtomicUsize::new( 0 ));
	let component = spawn_probe( drops.clone() );
	let tally = component.cast::<Tally>().expect( "tally facet" );
	assert_eq!( component.strong_count(), 2 );
	assert_eq!( tally.strong_count(), 2 );

	drop( component );
	assert_eq!( drops.load( Ordering::SeqCst ), 0 );

	drop( tally );
	assert_eq!( drops.load( Ordering::SeqCst ), 1 );
}

#[test]
fn lifecycle_into_raw_then_from_raw_keeps_count() {

	let drops = Arc::new( AtomicUsize::new( 0 ));
	let component = spawn_probe( drops.clone() );

	let raw = component.into_raw();
	assert_eq!( drops.load( Ordering::SeqCst ), 0 );

	let revived = unsafe { Handle::<Component>::from_raw( raw )};
	assert_eq!( revived.strong_count(), 1 );

	drop( revived );
	assert_eq!( drops.load( Ordering::SeqCst ), 1 );
}
