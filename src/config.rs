//! INI-style configuration model and parser.
//!
//! The bootstrap format is deliberately small: `[section]` headers,
//! `key=value` entries, `;` or `#` line comments. A value written as
//! `[other_section]` is an indirection, read by the context when it maps
//! plugin ids to module paths. Parsing is strict; the first malformed line
//! aborts the bootstrap with its line number.

use std::collections::HashMap ;
use std::path::{ Path, PathBuf };

use pipe_trait::Pipe ;
use thiserror::Error ;



/// Rejection of a configuration text, with the offending 1-based line.
#[derive( Debug, Error )]
pub enum ConfigError {
    #[error( "Unterminated Section Header On Line {0}" )]
    UnterminatedHeader( usize ),
    #[error( "Empty Section Name On Line {0}" )]
    EmptySectionName( usize ),
    #[error( "Entry Outside Any Section On Line {0}" )]
    OrphanEntry( usize ),
    #[error( "Entry Without A Key On Line {0}" )]
    MissingKey( usize ),
    #[error( "Malformed Line {0}: {1:?}" )]
    MalformedLine( usize, String ),
    #[error( "Unreadable Configuration At {0}: {1}" )]
    Unreadable( String, #[source] std::io::Error ),
}

/// One `[section]`, entries in document order.
#[derive( Debug, Clone )]
pub struct Section {
    name: String,
    entries: Vec<( String, String )>,
    index: HashMap<String, usize>,
}

impl Section {

    fn new( name: &str ) -> Self {
        Self { name: name.to_string(), entries: Vec::new(), index: HashMap::new() }
    }

    #[inline] pub fn name( &self ) -> &str { &self.name }

    // A repeated key replaces its earlier value in place, keeping lookup
    // and enumeration consistent.
    fn put( &mut self, key: &str, value: &str ) {
        match self.index.get( key ) {
            Some( &position ) => self.entries[position].1 = value.to_string(),
            None => {
                self.index.insert( key.to_string(), self.entries.len() );
                self.entries.push(( key.to_string(), value.to_string() ));
            }
        }
    }

    pub fn get( &self, key: &str ) -> Option<&str> {
        self.index.get( key ).map(| &position | self.entries[position].1.as_str() )
    }

    /// Entries in document order.
    pub fn entries( &self ) -> impl Iterator<Item = ( &str, &str )> + '_ {
        self.entries.iter().map(|( key, value )| ( key.as_str(), value.as_str() ))
    }

    #[inline] pub fn len( &self ) -> usize { self.entries.len() }

    #[inline] pub fn is_empty( &self ) -> bool { self.entries.is_empty() }

}

/// A parsed configuration: sections in document order, indexed by name.
#[derive( Debug, Clone, Default )]
pub struct Config {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl Config {

    /// Parses a configuration text.
    ///
    /// A repeated `[section]` header re-opens the earlier section.
    ///
    /// # Errors
    /// The first [`ConfigError`] the text violates.
    pub fn parse( text: &str ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut current: Option<usize> = None ;
        for ( index, raw ) in text.lines().enumerate() {
            let number = index + 1 ;
            let line = raw.trim();
            if line.is_empty() || line.starts_with( ';' ) || line.starts_with( '#' ) {
                continue
            }
            if let Some( rest ) = line.strip_prefix( '[' ) {
                let Some( name ) = rest.strip_suffix( ']' ) else {
                    return Err( ConfigError::UnterminatedHeader( number ))
                };
                let name = name.trim();
                if name.is_empty() { return Err( ConfigError::EmptySectionName( number )) }
                current = Some( config.section_at( name ));
                continue
            }
            let Some(( key, value )) = line.split_once( '=' ) else {
                return Err( ConfigError::MalformedLine( number, line.to_string() ))
            };
            let key = key.trim();
            if key.is_empty() { return Err( ConfigError::MissingKey( number )) }
            let Some( position ) = current else {
                return Err( ConfigError::OrphanEntry( number ))
            };
            config.sections[position].put( key, value.trim() );
        }
        Ok( config )
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// [`ConfigError::Unreadable`] when the file cannot be read, or whatever
    /// [`parse`]( Self::parse ) rejects.
    pub fn from_file( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        std::fs::read_to_string( path )
            .map_err(| error | ConfigError::Unreadable( path.display().to_string(), error ))?
            .pipe(| text | Self::parse( &text ))
    }

    fn section_at( &mut self, name: &str ) -> usize {
        match self.index.get( name ) {
            Some( &position ) => position,
            None => {
                let position = self.sections.len();
                self.index.insert( name.to_string(), position );
                self.sections.push( Section::new( name ));
                position
            }
        }
    }

    pub fn section( &self, name: &str ) -> Option<&Section> {
        self.index.get( name ).map(| &position | &self.sections[position] )
    }

    pub fn value( &self, section: &str, key: &str ) -> Option<&str> {
        self.section( section ).and_then(| section | section.get( key ))
    }

    /// Section names in document order.
    pub fn section_names( &self ) -> impl Iterator<Item = &str> + '_ {
        self.sections.iter().map( Section::name )
    }

    #[inline] pub fn len( &self ) -> usize { self.sections.len() }

    #[inline] pub fn is_empty( &self ) -> bool { self.sections.is_empty() }

}

/// Reads a `[other_section]` indirection value: the section it points at,
/// or `None` for a plain value. Empty brackets read as a plain value.
pub fn indirection( value: &str ) -> Option<&str> {
    let name = value.strip_prefix( '[' )?.strip_suffix( ']' )?.trim();
    match name.is_empty() {
        true => None,
        false => Some( name ),
    }
}

/// Where the bootstrap configuration comes from.
#[derive( Debug, Clone )]
pub enum ConfigSource {
    Inline( String ),
    File( PathBuf ),
}

impl ConfigSource {

    pub fn inline( text: impl Into<String> ) -> Self { Self::Inline( text.into() )}

    pub fn file( path: impl Into<PathBuf> ) -> Self { Self::File( path.into() )}

    pub(crate) fn load( &self ) -> Result<Config, ConfigError> {
        match self {
            Self::Inline( text ) => Config::parse( text ),
            Self::File( path ) => Config::from_file( path ),
        }
    }

}
