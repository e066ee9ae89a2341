//! `<-- E` blocks of .geom and .md trajectories

use std::io::BufRead;

use log::debug;
use xtal::{ANGBOHR, Atom, Lattice};

use crate::{
    AtomSetCollection, Config, ParseError, lines::LineReader,
    output::read_energy,
};

/// Read consecutive frames, each starting at a line like
///
/// `-1.8963455e+001   -1.8963455e+001    <-- E`
///
/// followed by `<-- h` lattice vectors and `<-- R` positions, all in atomic
/// units. `lines` should be on the first `<-- E` line.
///
/// In a transition state search (`ts`) the line before each `<-- E` labels
/// the frame as `REA`, `TS`, or `PRO`. That label prefixes the frame name and
/// is matched against the TSTYPE filter. The trajectory flag is only set for
/// .geom and .md files.
pub fn read_trajectories<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
    config: &Config,
    ts: bool,
) -> Result<(), ParseError> {
    if !ts {
        asc.trajectory = config.single_vibration().is_none();
    }
    let tstype = config.filter.tstype.as_deref();
    while lines.contains("<-- E") {
        let label = lines.prev_line();
        if ts && tstype.is_some_and(|t| !label.contains(t)) {
            debug!("skipping transition state frame labelled `{label}`");
            if !lines.discard_until_contains("<-- E")? {
                break;
            }
            continue;
        }
        asc.realize(config.supercell.as_ref());
        asc.new_atom_set();
        if ts {
            let prefix = label.split_whitespace().next().unwrap_or("-");
            let prefix = format!("{prefix} ");
            read_energy(lines, asc, 0, &prefix);
        } else {
            asc.set_energy(lines.float_field(0)?);
        }
        if !lines.discard_until_contains("<-- h")? {
            break;
        }
        asc.set_space_group("P1");
        let [a, b, c] = lines.read_vectors(true)?;
        asc.set_lattice(Lattice::from_vectors(a, b, c));
        asc.set_fractional(false);
        if !lines.discard_until_contains("<-- R")? {
            break;
        }
        while lines.contains("<-- R") {
            let [x, y, z] = lines.float_fields(2)?;
            let atom =
                Atom::new(lines.field(0)?, x * ANGBOHR, y * ANGBOHR, z * ANGBOHR);
            asc.add_atom(atom);
            lines.next_line()?;
        }
        debug!(
            "read trajectory frame {} with {} atoms",
            asc.len(),
            asc.current().map_or(0, |s| s.atoms.len())
        );
        if !lines.contains("<-- E") {
            lines.discard_until_contains("<-- E")?;
        }
    }
    Ok(())
}
