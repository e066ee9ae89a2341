//! Structure and energy sections of .castep output

use std::io::BufRead;

use log::warn;
use xtal::{Atom, Lattice, Supercell};

use crate::{AtomSetCollection, ParseError, lines::LineReader};

/// `Real Lattice(A)`: finish the current frame and start a new fractional
/// one on the three lattice vectors that follow
pub fn read_lattice<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
    supercell: Option<&Supercell>,
) -> Result<(), ParseError> {
    asc.realize(supercell);
    asc.new_atom_set();
    asc.set_fractional(true);
    let [a, b, c] = lines.read_vectors(false)?;
    asc.set_lattice(Lattice::from_vectors(a, b, c));
    Ok(())
}

/// rows like
///
/// `x  Si           1         0.000000   0.000000   0.000000   x`
///
/// after two heading lines, up to the closing `xxxx` rule
pub fn read_atoms<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
) -> Result<(), ParseError> {
    lines.skip(2)?;
    while lines.next_line()? && !lines.contains("xxx") {
        let symbol = lines.field(1)?;
        let name = format!("{symbol}{}", lines.field(2)?);
        let [x, y, z] = lines.float_fields(3)?;
        asc.add_atom_with_mapped_name(Atom::new(symbol, x, y, z).with_name(name));
    }
    Ok(())
}

/// read the energy in eV from field `index` and name the current set after
/// it, starting with `prefix`. a value that cannot be read is recorded as a
/// note
pub fn read_energy<R: BufRead>(
    lines: &LineReader<R>,
    asc: &mut AtomSetCollection,
    index: usize,
    prefix: &str,
) {
    match lines.float_field(index) {
        Ok(e) => {
            asc.set_name(format!("{prefix}Energy = {e} eV"));
            asc.set_energy(e);
        }
        Err(e) => {
            warn!("{e}");
            asc.append_note(format!(
                "CASTEP Energy could not be read: {}",
                lines.line()
            ));
        }
    }
}
