//! Streaming readers for CASTEP .cell, .castep, .phonon, and .geom files.
//!
//! Every read produces an [AtomSetCollection]: one [AtomSet] per structure,
//! geometry step, or phonon mode, with optional partial charges, spins, Born
//! charge tensors, and mass-weighted vibration vectors on the atoms.

use std::{io::Cursor, path::Path};

pub use config::{Config, DesiredQ, Filter};
pub use error::ParseError;
pub use model::*;
pub use phonon::{Decision, PhononAtomExtra, PhononParseSession, QPoint};
pub use reader::{CastepReader, FileKind};
pub use transform::phonon_vector;

pub mod cell;
pub mod charges;
pub mod config;
pub mod error;
pub mod geom;
pub mod lines;
pub mod model;
pub mod output;
pub mod phonon;
pub mod reader;
pub mod transform;

#[cfg(test)]
mod tests;

/// read the CASTEP file at `path` with the settings in `config`
pub fn read_file<P: AsRef<Path>>(
    path: P,
    config: Config,
) -> Result<AtomSetCollection, ParseError> {
    CastepReader::open(path, config)?.read()
}

/// read CASTEP text held in memory
pub fn read_str(
    s: &str,
    config: Config,
) -> Result<AtomSetCollection, ParseError> {
    CastepReader::new(Cursor::new(s), config).read()
}
