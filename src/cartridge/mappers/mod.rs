// Mappers module - cartridge bank-switching implementations
//
// This module contains the mapper factory and the individual mapper
// implementations. Each mapper translates cartridge-facing addresses into
// offsets in the decoded PRG/CHR memories and holds its private banking
// state.

mod mapper0;
mod mapper4;

use super::{Cartridge, Mapper};
use mapper0::Mapper0;
use mapper4::Mapper4;

/// Error type for mapper creation
#[derive(Debug)]
pub enum MapperError {
    /// The requested mapper number is not supported
    UnsupportedMapper(u8),
}

impl std::fmt::Display for MapperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapperError::UnsupportedMapper(num) => {
                write!(f, "mapper {} is not supported", num)
            }
        }
    }
}

impl std::error::Error for MapperError {}

/// Create a mapper instance for the given cartridge
///
/// The cartridge is moved into the mapper, which owns it for the lifetime of
/// the session. The mapper number comes from the iNES header nibbles.
///
/// # Errors
/// Returns `MapperError::UnsupportedMapper` for mapper ids without an
/// implementation.
pub fn create_mapper(cartridge: Cartridge) -> Result<Box<dyn Mapper>, MapperError> {
    match cartridge.mapper_id {
        0 => Ok(Box::new(Mapper0::new(cartridge))),
        4 => Ok(Box::new(Mapper4::new(cartridge))),
        id => Err(MapperError::UnsupportedMapper(id)),
    }
}
