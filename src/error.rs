//! Hierarchical failure codes and the failure taxonomy.
//!
//! A code is an eight-level byte path packed into a `u64`, family first.
//! Masking trailing levels walks toward the family root, which is how a
//! receiver degrades a code it has never heard of into the nearest ancestor
//! it knows.

use itertools::Itertools ;
use thiserror::Error ;



/// Hierarchical failure identity carried across the boundary.
///
/// The most significant byte names the family; each following byte descends
/// one level. Unused trailing bytes are zero, and zero is not a valid
/// segment, so depth is always well defined.
#[repr(transparent)]
#[derive( Copy, Clone, Eq, Hash, PartialEq )]
pub struct ErrorCode( u64 );

impl ErrorCode {

    /// Maximum number of path levels a code can carry.
    pub const MAX_DEPTH: usize = 8 ;

    pub const LOGIC: Self = Self::new( &[ 0x01 ]);
    pub const INVALID_ARGUMENT: Self = Self::new( &[ 0x01, 0x01 ]);
    pub const NOT_FOUND: Self = Self::new( &[ 0x01, 0x02 ]);
    pub const OUT_OF_RANGE: Self = Self::new( &[ 0x01, 0x03 ]);
    pub const IMMUTABLE: Self = Self::new( &[ 0x01, 0x04 ]);
    pub const RUNTIME: Self = Self::new( &[ 0x02 ]);
    pub const OVERFLOW: Self = Self::new( &[ 0x02, 0x01 ]);
    pub const ARITHMETIC: Self = Self::new( &[ 0x02, 0x02 ]);
    pub const DIVIDE_BY_ZERO: Self = Self::new( &[ 0x02, 0x02, 0x01 ]);
    pub const ALLOCATION: Self = Self::new( &[ 0x03 ]);
    pub const MODULE: Self = Self::new( &[ 0x04 ]);
    pub const MODULE_LOAD: Self = Self::new( &[ 0x04, 0x01 ]);
    pub const MODULE_SYMBOL: Self = Self::new( &[ 0x04, 0x02 ]);
    pub const MODULE_INCOMPATIBLE: Self = Self::new( &[ 0x04, 0x03 ]);
    pub const FOREIGN: Self = Self::new( &[ 0xFF ]);

    /// Builds a code from its byte path, most significant level first.
    ///
    /// # Panics
    /// Panics when the path is empty, longer than [`MAX_DEPTH`]( Self::MAX_DEPTH )
    /// levels or contains a zero segment.
    #[allow( clippy::cast_lossless )] // `u64::from` is not const.
    pub const fn new( path: &[u8] ) -> Self {
        assert!( !path.is_empty() && path.len() <= Self::MAX_DEPTH, "path carries one to eight levels" );
        let mut value = 0_u64 ;
        let mut index = 0 ;
        while index < path.len() {
            assert!( path[index] != 0, "path segments are non-zero" );
            value |= ( path[index] as u64 ) << ( 56 - 8 * index );
            index += 1 ;
        }
        Self( value )
    }

    /// Reinterprets a wire value. No validation; unknown values decode to
    /// [`Failure::Unrecognized`] later.
    pub const fn from_raw( value: u64 ) -> Self { Self( value )}

    /// Returns the wire value.
    #[inline] pub const fn raw( self ) -> u64 { self.0 }

    /// Returns the code one level deeper.
    ///
    /// # Panics
    /// Panics when `segment` is zero or the path already has
    /// [`MAX_DEPTH`]( Self::MAX_DEPTH ) levels.
    #[allow( clippy::cast_lossless )] // `u64::from` is not const.
    pub const fn child( self, segment: u8 ) -> Self {
        let depth = self.depth();
        assert!( segment != 0, "path segments are non-zero" );
        assert!( depth < Self::MAX_DEPTH, "path depth is capped at eight levels" );
        Self( self.0 | (( segment as u64 ) << ( 56 - 8 * depth )))
    }

    /// Returns the immediate ancestor, or `None` at the family root.
    pub const fn parent( self ) -> Option<Self> {
        let depth = self.depth();
        if depth <= 1 { return None }
        Some( Self( self.0 & !( 0xFF_u64 << ( 56 - 8 * ( depth - 1 )))))
    }

    /// Number of levels on this code's path.
    pub const fn depth( self ) -> usize {
        let mut depth = 0 ;
        while depth < Self::MAX_DEPTH {
            if (( self.0 >> ( 56 - 8 * depth )) & 0xFF ) == 0 { break }
            depth += 1 ;
        }
        depth
    }

    /// Returns `true` when `ancestor` lies on this code's path, itself
    /// included.
    pub const fn starts_with( self, ancestor: Self ) -> bool {
        let depth = ancestor.depth();
        if depth == 0 || depth > self.depth() { return false }
        let keep = 64 - 8 * depth ;
        ( self.0 >> keep ) == ( ancestor.0 >> keep )
    }

    #[allow( clippy::cast_possible_truncation )] // Masked to one byte.
    const fn segment( self, level: usize ) -> u8 {
        (( self.0 >> ( 56 - 8 * level )) & 0xFF ) as u8
    }

}

impl std::fmt::Display for ErrorCode {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
        let path = ( 0..self.depth() ).map(| level | format!( "{:02x}", self.segment( level ))).join( "." );
        write!( f, "{}", path )
    }
}

impl std::fmt::Debug for ErrorCode {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "ErrorCode( {} )", self )}
}

/// The failure taxonomy shared by both sides of the boundary.
///
/// Every variant except [`Unrecognized`]( Self::Unrecognized ) corresponds to
/// one [`ErrorCode`] constant; [`decode`]( Self::decode ) maps a wire code
/// back, degrading unknown codes to their nearest known ancestor.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
pub enum Failure {
    /// Broken caller expectation with no narrower classification.
    #[error( "Logic Error: {0}" )] Logic( String ),
    /// An argument was rejected before any work happened.
    #[error( "Invalid Argument: {0}" )] InvalidArgument( String ),
    /// The requested interface, name, section or key is not there.
    #[error( "Not Found: {0}" )] NotFound( String ),
    /// An index or cursor moved outside its domain.
    #[error( "Out Of Range: {0}" )] OutOfRange( String ),
    /// A mutating operation reached a frozen reference.
    #[error( "Immutable Target: {0}" )] Immutable( String ),
    /// Failed during execution with no narrower classification.
    #[error( "Runtime Error: {0}" )] Runtime( String ),
    /// A value left its representable range.
    #[error( "Overflow: {0}" )] Overflow( String ),
    /// An arithmetic operation failed.
    #[error( "Arithmetic Error: {0}" )] Arithmetic( String ),
    /// Division by zero.
    #[error( "Division By Zero: {0}" )] DivideByZero( String ),
    /// The provider could not allocate.
    #[error( "Allocation Failed: {0}" )] AllocationFailed( String ),
    /// A module misbehaved with no narrower classification.
    #[error( "Module Error: {0}" )] Module( String ),
    /// The operating system rejected the module.
    #[error( "Module Load Failed: {0}" )] ModuleLoad( String ),
    /// A required entry point is not exported.
    #[error( "Missing Module Symbol: {0}" )] MissingSymbol( String ),
    /// The module speaks a different protocol revision.
    #[error( "Incompatible Module: {0}" )] Incompatible( String ),
    /// Something that is not a failure object crossed the boundary, a panic
    /// payload for instance.
    #[error( "Foreign Exception: {0}" )] Foreign( String ),
    /// The code matches no known family at any depth. Code and message are
    /// preserved verbatim.
    #[error( "Unrecognized Failure {code}: {message}" )] Unrecognized { code: ErrorCode, message: String },
}

impl Failure {

    /// The wire code of this failure.
    pub fn code( &self ) -> ErrorCode { match self {
        Self::Logic( _ ) => ErrorCode::LOGIC,
        Self::InvalidArgument( _ ) => ErrorCode::INVALID_ARGUMENT,
        Self::NotFound( _ ) => ErrorCode::NOT_FOUND,
        Self::OutOfRange( _ ) => ErrorCode::OUT_OF_RANGE,
        Self::Immutable( _ ) => ErrorCode::IMMUTABLE,
        Self::Runtime( _ ) => ErrorCode::RUNTIME,
        Self::Overflow( _ ) => ErrorCode::OVERFLOW,
        Self::Arithmetic( _ ) => ErrorCode::ARITHMETIC,
        Self::DivideByZero( _ ) => ErrorCode::DIVIDE_BY_ZERO,
        Self::AllocationFailed( _ ) => ErrorCode::ALLOCATION,
        Self::Module( _ ) => ErrorCode::MODULE,
        Self::ModuleLoad( _ ) => ErrorCode::MODULE_LOAD,
        Self::MissingSymbol( _ ) => ErrorCode::MODULE_SYMBOL,
        Self::Incompatible( _ ) => ErrorCode::MODULE_INCOMPATIBLE,
        Self::Foreign( _ ) => ErrorCode::FOREIGN,
        Self::Unrecognized { code, .. } => *code,
    }}

    /// The human readable message of this failure.
    pub fn message( &self ) -> &str { match self {
        Self::Logic( message )
        | Self::InvalidArgument( message )
        | Self::NotFound( message )
        | Self::OutOfRange( message )
        | Self::Immutable( message )
        | Self::Runtime( message )
        | Self::Overflow( message )
        | Self::Arithmetic( message )
        | Self::DivideByZero( message )
        | Self::AllocationFailed( message )
        | Self::Module( message )
        | Self::ModuleLoad( message )
        | Self::MissingSymbol( message )
        | Self::Incompatible( message )
        | Self::Foreign( message )
        | Self::Unrecognized { message, .. } => message,
    }}

    /// Decodes a wire code into the richest failure this build knows.
    ///
    /// Walks from the exact code toward the family root one level at a time
    /// and stops at the first known ancestor; a code with no known ancestor
    /// is preserved as [`Unrecognized`]( Self::Unrecognized ). The message
    /// survives every outcome.
    pub fn decode( code: ErrorCode, message: String ) -> Self {
        let mut candidate = Some( code );
        while let Some( current ) = candidate {
            if let Some( build ) = Self::builder( current ) {
                if current != code {
                    log::debug!( "degraded foreign code {} to ancestor {}", code, current );
                }
                return build( message );
            }
            candidate = current.parent();
        }
        log::debug!( "code {} matches no known family, kept verbatim", code );
        Self::Unrecognized { code, message }
    }

    fn builder( code: ErrorCode ) -> Option<fn( String ) -> Self> { match code {
        ErrorCode::LOGIC => Some( Self::Logic ),
        ErrorCode::INVALID_ARGUMENT => Some( Self::InvalidArgument ),
        ErrorCode::NOT_FOUND => Some( Self::NotFound ),
        ErrorCode::OUT_OF_RANGE => Some( Self::OutOfRange ),
        ErrorCode::IMMUTABLE => Some( Self::Immutable ),
        ErrorCode::RUNTIME => Some( Self::Runtime ),
        ErrorCode::OVERFLOW => Some( Self::Overflow ),
        ErrorCode::ARITHMETIC => Some( Self::Arithmetic ),
        ErrorCode::DIVIDE_BY_ZERO => Some( Self::DivideByZero ),
        ErrorCode::ALLOCATION => Some( Self::AllocationFailed ),
        ErrorCode::MODULE => Some( Self::Module ),
        ErrorCode::MODULE_LOAD => Some( Self::ModuleLoad ),
        ErrorCode::MODULE_SYMBOL => Some( Self::MissingSymbol ),
        ErrorCode::MODULE_INCOMPATIBLE => Some( Self::Incompatible ),
        ErrorCode::FOREIGN => Some( Self::Foreign ),
        _ => None,
    }}

}
