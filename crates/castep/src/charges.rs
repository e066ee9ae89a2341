//! Population analysis tables and Born effective charge tensors from .castep
//! output

use std::io::BufRead;

use log::{debug, info};
use xtal::Mat3;

use crate::{AtomSetCollection, ParseError, lines::LineReader};

/// resolve the atom a table row refers to. a leading integer is a 1-based
/// index into the current set, otherwise the first two fields form an atom
/// name like `Si1`
fn atom_index<R: BufRead>(
    lines: &LineReader<R>,
    asc: &AtomSetCollection,
) -> Result<usize, ParseError> {
    let first = lines.field(0)?;
    let (index, key) = match lines.parse_int(first) {
        Ok(i) => (i.checked_sub(1), first.to_owned()),
        Err(_) => {
            let name = format!("{first}{}", lines.field(1)?);
            (asc.atom_index(&name), name)
        }
    };
    let count = asc.current().map_or(0, |s| s.atoms.len());
    index
        .filter(|&i| i < count)
        .ok_or(ParseError::AtomIndex {
            line: lines.line_number(),
            index: key,
        })
}

/// Read a Mulliken or Hirshfeld population table if its heading mentions
/// `charge_type`. The heading is followed by a rule, the column headings,
/// and another rule; rows run until a line containing `=`. The charge is the
/// last column, or the second to last when there is a `Spin` column, in which
/// case the spins are stored as the "spin" property of the current set.
pub fn read_charges<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
    charge_type: &str,
) -> Result<(), ParseError> {
    if !lines.line().to_uppercase().contains(charge_type) {
        debug!("skipping {}", lines.line().trim());
        return Ok(());
    }
    info!("reading charges: {}", lines.line().trim());
    lines.skip(2)?;
    let have_spin = lines.contains("Spin");
    lines.skip(1)?;
    let count = asc.current().map_or(0, |s| s.atoms.len());
    let mut spins = have_spin.then(|| vec![0.0; count]);
    while lines.next_line()? && !lines.contains("=") {
        let index = atom_index(lines, asc)?;
        let last = lines.tokens().len().saturating_sub(1);
        let col = if have_spin { last.saturating_sub(1) } else { last };
        let charge = lines.float_field(col)?;
        if let Some(spins) = &mut spins {
            spins[index] = lines.float_field(last)?;
        }
        asc.current_mut().atoms[index].partial_charge = Some(charge);
    }
    if let Some(spins) = spins {
        asc.set_atom_property("spin", spins);
    }
    Ok(())
}

/// Read Born effective charge tensors: after a `----` rule, each atom takes
/// three lines, `Sym n t11 t12 t13` and two continuation rows. Returns whether
/// any tensor was read.
pub fn read_born_charges<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
) -> Result<bool, ParseError> {
    if !lines.next_line()? || !lines.contains("--------") {
        return Ok(false);
    }
    asc.append_note("Ellipsoids: Born Charge Tensors");
    let mut any = false;
    while lines.next_line()? && !lines.contains("=") {
        let index = atom_index(lines, asc)?;
        let mut values = Vec::with_capacity(9);
        for token in lines.tokens().iter().skip(2) {
            values.push(lines.parse_float(token)?);
        }
        for _ in 0..2 {
            lines.next_line()?;
            for token in lines.tokens() {
                values.push(lines.parse_float(token)?);
            }
        }
        if values.len() < 9 {
            return Err(ParseError::MissingField {
                line: lines.line_number(),
                index: values.len(),
            });
        }
        debug!("born charge tensor for atom {index}: {values:?}");
        asc.current_mut().atoms[index].tensor =
            Some(Mat3::from_row_slice(&values[..9]));
        any = true;
    }
    Ok(any)
}
