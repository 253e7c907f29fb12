#[macro_export]
macro_rules! runtime {

	( $config:literal ) => {
		abi_link::Context::initialize( &abi_link::ConfigSource::inline( $config ))
			.expect( "Failed to initialise context" )
	};

	( $config:literal, builtins = { $( $key:literal => $module:expr ),+ $(,)? } ) => {{
		let context = abi_link::Context::initialize( &abi_link::ConfigSource::inline( $config ))
			.expect( "Failed to initialise context" );
		$( context.register_builtin( $key, $module ); )+
		context
	}};
}

#[allow( dead_code )]
mod fixtures {

	use std::sync::atomic::{ AtomicU64, AtomicUsize, Ordering };
	use std::sync::{ Arc, OnceLock };

	use abi_link::{
		declare_module, factory_object, guard, Component, ContextHandle, DispatchTable,
		ErrorCode, Failure, FactoryHandle, Handle, Interface, ObjectBox, ObjectHeader,
		ObjectLayout, RawToken, StrView, Uuid, VTableHeader, VTableRef, LIFECYCLE,
	};

	/// Arithmetic test interface: accumulate, read back, divide, fail.
	pub enum Tally {}

	impl Interface for Tally {
		type VTable = TallyVTable ;
		const UUID: Uuid = Uuid::from_fields(
			0x0bd5_2a6f, 0x4a0e, 0x46a3,
			[0x88, 0xd7, 0x41, 0x7f, 0x52, 0xc8, 0xbb, 0x19],
		);
		const NAME: &'static str = "tally" ;
	}

	/// A facet with no operations beyond the lifecycle header.
	pub enum Probe {}

	impl Interface for Probe {
		type VTable = VTableHeader ;
		const UUID: Uuid = Uuid::from_fields(
			0x23f9_6a1e, 0x8dc4, 0x4f09,
			[0x97, 0x42, 0xdd, 0x5a, 0x01, 0xe8, 0x36, 0xcf],
		);
		const NAME: &'static str = "probe" ;
	}

	#[repr(C)]
	pub struct TallyVTable {
		pub header: VTableHeader,
		pub add: unsafe extern "C" fn( object: *mut ObjectHeader, amount: u64 ) -> RawToken,
		pub total: unsafe extern "C" fn( object: *mut ObjectHeader ) -> u64,
		pub ratio: unsafe extern "C" fn(
			object: *mut ObjectHeader, numerator: u64, denominator: u64, quotient: *mut u64,
		) -> RawToken,
		pub quota: unsafe extern "C" fn( object: *mut ObjectHeader ) -> RawToken,
	}

	unsafe impl DispatchTable for TallyVTable {}

	pub struct TallyState {
		total: AtomicU64,
		drops: Option<Arc<AtomicUsize>>,
	}

	impl Drop for TallyState {
		fn drop( &mut self ) {
			if let Some( drops ) = &self.drops {
				drops.fetch_add( 1, Ordering::SeqCst );
			}
		}
	}

	static TALLY_TABLE: TallyVTable = TallyVTable {
		header: LIFECYCLE,
		add: tally_add_entry,
		total: tally_total_entry,
		ratio: tally_ratio_entry,
		quota: tally_quota_entry,
	};

	static TALLY_LAYOUT: ObjectLayout<3> = ObjectLayout::new(
		[Component::UUID, Tally::UUID, Probe::UUID],
		[VTableRef::new( &LIFECYCLE ), VTableRef::new( &TALLY_TABLE ), VTableRef::new( &LIFECYCLE )],
	);

	pub fn spawn_tally() -> Handle<Component> {
		ObjectBox::spawn( TallyState { total: AtomicU64::new( 0 ), drops: None }, &TALLY_LAYOUT )
	}

	/// A tally that reports its destruction through the shared counter.
	pub fn spawn_probe( drops: Arc<AtomicUsize> ) -> Handle<Component> {
		ObjectBox::spawn(
			TallyState { total: AtomicU64::new( 0 ), drops: Some( drops )},
			&TALLY_LAYOUT,
		)
	}

	pub fn add( tally: &Handle<Tally>, amount: u64 ) -> Result<(), Failure> {
		tally.require_mut()?;
		unsafe { ( tally.vtable().add )( tally.as_raw().object, amount )}.consume()
	}

	pub fn total( tally: &Handle<Tally> ) -> u64 {
		unsafe { ( tally.vtable().total )( tally.as_raw().object )}
	}

	pub fn ratio( tally: &Handle<Tally>, numerator: u64, denominator: u64 ) -> Result<u64, Failure> {
		let mut quotient = 0 ;
		unsafe { ( tally.vtable().ratio )( tally.as_raw().object, numerator, denominator, &mut quotient )}
			.consume()?;
		Ok( quotient )
	}

	pub fn quota( tally: &Handle<Tally> ) -> Result<(), Failure> {
		unsafe { ( tally.vtable().quota )( tally.as_raw().object )}.consume()
	}

	unsafe extern "C" fn tally_add_entry( object: *mut ObjectHeader, amount: u64 ) -> RawToken {
		guard(|| {
			let state = unsafe { ObjectBox::<TallyState, 3>::value_of( object )};
			state.total.fetch_add( amount, Ordering::Relaxed );
			Ok(())
		})
	}

	unsafe extern "C" fn tally_total_entry( object: *mut ObjectHeader ) -> u64 {
		let state = ObjectBox::<TallyState, 3>::value_of( object );
		state.total.load( Ordering::Relaxed )
	}

	unsafe extern "C" fn tally_ratio_entry(
		_object: *mut ObjectHeader, numerator: u64, denominator: u64, quotient: *mut u64,
	) -> RawToken {
		guard(|| match denominator {
			0 => Err( Failure::DivideByZero( format!( "{} / 0", numerator ))),
			_ => {
				unsafe { *quotient = numerator / denominator };
				Ok(())
			}
		})
	}

	unsafe extern "C" fn tally_quota_entry( _object: *mut ObjectHeader ) -> RawToken {
		// A foreign build reporting a specialisation code this build has
		// never heard of.
		RawToken::from_parts( ErrorCode::RUNTIME.child( 0x66 ).child( 0x01 ), "tally quota exhausted" )
	}

	/// Text test interface with a single read-only operation.
	pub enum Greet {}

	impl Interface for Greet {
		type VTable = GreetVTable ;
		const UUID: Uuid = Uuid::from_fields(
			0x47e1_9cf2, 0x5b11, 0x49ed,
			[0xa6, 0x63, 0x09, 0xd4, 0x7c, 0x15, 0x2e, 0x84],
		);
		const NAME: &'static str = "greet" ;
	}

	#[repr(C)]
	pub struct GreetVTable {
		pub header: VTableHeader,
		pub greeting: unsafe extern "C" fn( object: *mut ObjectHeader, out: *mut StrView ) -> RawToken,
	}

	unsafe impl DispatchTable for GreetVTable {}

	struct GreeterState {
		greeting: String,
	}

	static GREET_TABLE: GreetVTable = GreetVTable { header: LIFECYCLE, greeting: greet_entry };

	static GREET_LAYOUT: ObjectLayout<2> = ObjectLayout::new(
		[Component::UUID, Greet::UUID],
		[VTableRef::new( &LIFECYCLE ), VTableRef::new( &GREET_TABLE )],
	);

	unsafe extern "C" fn greet_entry( object: *mut ObjectHeader, out: *mut StrView ) -> RawToken {
		guard(|| {
			let state = unsafe { ObjectBox::<GreeterState, 2>::value_of( object )};
			unsafe { *out = StrView::new( &state.greeting )};
			Ok(())
		})
	}

	pub fn greeting( greeter: &Handle<Greet> ) -> Result<String, Failure> {
		let mut view = StrView::EMPTY ;
		unsafe { ( greeter.vtable().greeting )( greeter.as_raw().object, &mut view )}.consume()?;
		Ok( unsafe { view.to_str() }.expect( "greeting is UTF-8" ).to_string() )
	}

	fn spawn_greeter( greeting: &str ) -> Handle<Component> {
		ObjectBox::spawn( GreeterState { greeting: greeting.to_string() }, &GREET_LAYOUT )
	}

	// Configurable greeter: init reads its greeting from the context and
	// counts its runs, so loader memoisation is observable.

	pub static GREETER_INITS: AtomicUsize = AtomicUsize::new( 0 );
	static GREETING: OnceLock<String> = OnceLock::new();

	fn greeter_init( context: &ContextHandle ) -> Result<(), Failure> {
		GREETER_INITS.fetch_add( 1, Ordering::SeqCst );
		let greeting = context.config_value( "greeter", "greeting" )?;
		let _ = GREETING.set( greeting );
		Ok(())
	}

	fn greeter_factory( name: &str ) -> Result<FactoryHandle, Failure> {
		match name {
			"greeter" | "greeter2" => Ok( factory_object(|| Ok( spawn_greeter(
				GREETING.get().map_or( "", String::as_str ),
			)))),
			other => Err( Failure::NotFound( format!( "component {}", other ))),
		}
	}

	fn greeter_reflect() -> &'static str { "component greeter (operation greeting)" }

	declare_module! { pub static GREETER_MODULE {
		init: greeter_init, factory: greeter_factory, reflect: greeter_reflect,
	}}

	// Fixed-text greeters standing in for two plugins of one component.

	fn plain_init( _context: &ContextHandle ) -> Result<(), Failure> { Ok(()) }

	fn hello_factory( name: &str ) -> Result<FactoryHandle, Failure> {
		match name {
			"greeter" => Ok( factory_object(|| Ok( spawn_greeter( "hello" )))),
			other => Err( Failure::NotFound( format!( "component {}", other ))),
		}
	}

	fn hello_reflect() -> &'static str { "greeter module saying hello" }

	declare_module! { pub static HELLO_MODULE {
		init: plain_init, factory: hello_factory, reflect: hello_reflect,
	}}

	fn goodbye_factory( name: &str ) -> Result<FactoryHandle, Failure> {
		match name {
			"greeter" => Ok( factory_object(|| Ok( spawn_greeter( "goodbye" )))),
			other => Err( Failure::NotFound( format!( "component {}", other ))),
		}
	}

	fn goodbye_reflect() -> &'static str { "greeter module saying goodbye" }

	declare_module! { pub static GOODBYE_MODULE {
		init: plain_init, factory: goodbye_factory, reflect: goodbye_reflect,
	}}

	// Serves tally components; init needs nothing from the context.

	fn tally_factory( name: &str ) -> Result<FactoryHandle, Failure> {
		match name {
			"tally" => Ok( factory_object(|| Ok( spawn_tally() ))),
			other => Err( Failure::NotFound( format!( "component {}", other ))),
		}
	}

	fn tally_reflect() -> &'static str { "component tally (operations add, total, ratio, quota)" }

	declare_module! { pub static TALLY_MODULE {
		init: plain_init, factory: tally_factory, reflect: tally_reflect,
	}}

	// Refuses to initialise, so resolution failures stay observable.

	fn failing_init( _context: &ContextHandle ) -> Result<(), Failure> {
		Err( Failure::Runtime( "init rejected by fixture".to_string() ))
	}

	fn failing_factory( name: &str ) -> Result<FactoryHandle, Failure> {
		Err( Failure::NotFound( format!( "component {}", name )))
	}

	fn failing_reflect() -> &'static str { "module that never initialises" }

	declare_module! { pub static FAILING_MODULE {
		init: failing_init, factory: failing_factory, reflect: failing_reflect,
	}}

}
