//! Phonon sections of .phonon files: the unit cell, the reference structure,
//! and one block of frequencies and eigenvectors per q-point.

use std::io::{BufRead, ErrorKind};

use log::{debug, info};
use num_complex::Complex64;
use xtal::{Atom, Lattice, Supercell, Vec3, fcoord, is_int};

use crate::{
    AtomSetCollection, Config, ParseError, lines::LineReader,
    transform::phonon_vector,
};

/// per-site data that only the phonon reader needs
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhononAtomExtra {
    /// atomic mass in amu
    pub mass: f32,
}

/// A q-point header, `q-pt= 1 0.0 0.0 0.0 ...`, after it has been counted
#[derive(Clone, Debug, PartialEq)]
pub struct QPoint {
    /// the q-point number as written in the file
    pub label: String,
    pub vector: Vec3,

    /// 1 for the first of a run of headers with the same label, 2 for the
    /// second, and so on
    pub occurrence: usize,

    /// `{1/4 0 0}` when the components are twelfths, otherwise the literal
    /// components in braces
    pub fcoord: String,
}

impl QPoint {
    pub fn is_gamma(&self) -> bool {
        self.vector.norm() == 0.0
    }

    pub fn is_repeat(&self) -> bool {
        self.occurrence > 1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    /// rejected by the filter or the supercell before the q-point was noted
    Filtered,

    /// rejected, possibly after noting the q-point
    Rejected { note: bool },

    /// read the block, describing its modes with `qname`
    Accepted { qname: String, note: bool },
}

/// The state carried from one phonon section to the next
#[derive(Debug, Default)]
pub struct PhononParseSession {
    last_label: Option<String>,
    occurrence: usize,
    have_phonons: bool,
    have_cell: bool,
    supercell: Option<Supercell>,
    supercell_logged: bool,

    /// fractional positions of the unique sites, before any supercell
    /// expansion
    reference: Vec<Vec3>,
    extra: Vec<PhononAtomExtra>,

    /// running vibration count across every q-point in the file
    vibration_number: usize,
}

impl PhononParseSession {
    pub fn new(supercell: Option<Supercell>) -> Self {
        Self {
            supercell,
            ..Default::default()
        }
    }

    /// number of unique sites, which is also the number of eigenvector lines
    /// per mode
    pub fn base_count(&self) -> usize {
        self.reference.len()
    }

    pub fn extra(&self) -> &[PhononAtomExtra] {
        &self.extra
    }

    pub fn vibration_number(&self) -> usize {
        self.vibration_number
    }

    /// ` Unit cell vectors (A)` followed by three vectors
    pub fn read_unit_cell<R: BufRead>(
        &mut self,
        lines: &mut LineReader<R>,
        asc: &mut AtomSetCollection,
    ) -> Result<(), ParseError> {
        let bohr = lines.contains("bohr");
        let [a, b, c] = lines.read_vectors(bohr)?;
        asc.set_space_group("P1");
        asc.set_lattice(Lattice::from_vectors(a, b, c));
        self.have_cell = true;
        Ok(())
    }

    /// ` Fractional Co-ordinates` followed by `index x y z symbol mass` rows
    /// up to `END header`
    pub fn read_fractional_coords<R: BufRead>(
        &mut self,
        lines: &mut LineReader<R>,
        asc: &mut AtomSetCollection,
    ) -> Result<(), ParseError> {
        asc.set_fractional(true);
        self.extra.clear();
        while lines.next_line()? && !lines.contains("END") {
            let [x, y, z] = lines.float_fields(1)?;
            let atom = Atom::new(lines.field(4)?, x, y, z);
            let mass = lines.float_field(5)?;
            asc.add_atom(atom);
            self.extra.push(PhononAtomExtra { mass: mass as f32 });
        }
        self.reference = asc
            .current()
            .map(|s| s.atoms.iter().map(|a| a.coord).collect())
            .unwrap_or_default();
        debug!("read {} phonon sites", self.reference.len());
        Ok(())
    }

    /// count a q-point header with number `label`, components `raw`, and
    /// parsed vector `vector`
    pub fn observe(
        &mut self,
        label: &str,
        raw: [&str; 3],
        vector: Vec3,
    ) -> QPoint {
        let repeat = self.last_label.as_deref() == Some(label);
        self.occurrence = if repeat { self.occurrence + 1 } else { 1 };
        self.last_label = Some(label.to_owned());
        let twelfths = vector.iter().all(|q| is_int(q * 12.0));
        let fcoord = if self.have_cell && twelfths {
            format!("{{{}}}", fcoord(&vector))
        } else {
            format!("{{{} {} {}}}", raw[0], raw[1], raw[2])
        };
        QPoint {
            label: label.to_owned(),
            vector,
            occurrence: self.occurrence,
            fcoord,
        }
    }

    /// Decide whether the modes at `q` should be read. An explicit `Q=` filter
    /// is tried first, as `Q=fcoord.n`, `Q=label.n`, and then, for the first
    /// listing only, bare `Q=fcoord` and `Q=label`. Without a match, a
    /// configured supercell accepts any q-point commensurate with it. With
    /// neither, only Gamma is read. After the first accepted q-point every
    /// other one is rejected unless `Q=ALL` was given.
    ///
    /// With three or more consecutive listings of one q-point, the `.n`
    /// suffix and the bare-label fallbacks can disagree with what a user
    /// expects; the order above is kept as is.
    pub fn accept(&mut self, q: &QPoint, config: &Config) -> Decision {
        let filter = &config.filter;
        let mut fcoord = q.fcoord.clone();
        let mut ok = filter.all_q;
        let second = q.is_repeat();
        if !ok && filter.has_key("Q=") {
            if let Some(d) = &filter.desired_q
                && (d.vector - q.vector).norm() < 0.001
            {
                fcoord = d.label.clone();
            }
            let n = q.occurrence;
            let label = &q.label;
            ok = filter.has_key(&format!("Q={fcoord}.{n};"))
                || filter.has_key(&format!("Q={label}.{n};"))
                || !second && filter.has_key(&format!("Q={fcoord};"))
                || !second && filter.has_key(&format!("Q={label};"));
            if !ok {
                debug!("q-pt {} {fcoord} does not match {filter}", q.label);
                return Decision::Filtered;
            }
        }
        if let Some(sc) = &self.supercell
            && !ok
            && !second
        {
            if !self.supercell_logged {
                info!("using supercell {:?}", sc.n);
                self.supercell_logged = true;
            }
            if !sc.accepts(&q.vector) {
                debug!("q-pt {} is not commensurate with {:?}", q.label, sc.n);
                return Decision::Filtered;
            }
            ok = true;
        }
        let note = self.supercell.is_none() || !self.have_phonons;
        if !ok && second {
            return Decision::Rejected { note };
        }
        if !ok && self.supercell.is_none() != q.is_gamma() {
            return Decision::Rejected { note };
        }
        if self.have_phonons && !filter.all_q {
            return Decision::Rejected { note };
        }
        self.have_phonons = true;
        Decision::Accepted {
            qname: format!("q={} {fcoord}", q.label),
            note,
        }
    }

    /// handle a `q-pt=` line: count it, decide whether to read it, and read
    /// its frequencies and eigenvectors if so. `include` is consulted for
    /// every vibration number
    pub fn read_qpoint<R: BufRead>(
        &mut self,
        lines: &mut LineReader<R>,
        asc: &mut AtomSetCollection,
        config: &Config,
        include: &dyn Fn(usize) -> bool,
    ) -> Result<(), ParseError> {
        let label = lines.field(1)?.to_owned();
        let raw = [lines.field(2)?, lines.field(3)?, lines.field(4)?];
        let [x, y, z] = lines.float_fields(2)?;
        let q = self.observe(&label, raw, Vec3::new(x, y, z));
        let (qname, note) = match self.accept(&q, config) {
            Decision::Filtered => return Ok(()),
            Decision::Rejected { note } => (None, note),
            Decision::Accepted { qname, note } => (Some(qname), note),
        };
        if note {
            asc.append_note(lines.line().trim());
        }
        let Some(qname) = qname else {
            return Ok(());
        };
        info!("reading phonons at {qname}");
        asc.realize(self.supercell.as_ref());
        self.read_frequencies(lines, asc, config, &q, &qname, include)
    }

    /// read the frequencies following an accepted q-point header, then one
    /// eigenvector line per site for each mode
    fn read_frequencies<R: BufRead>(
        &mut self,
        lines: &mut LineReader<R>,
        asc: &mut AtomSetCollection,
        config: &Config,
        q: &QPoint,
        qname: &str,
        include: &dyn Fn(usize) -> bool,
    ) -> Result<(), ParseError> {
        let qvec = (!q.is_gamma()).then_some(q.vector);
        let mut freqs = Vec::new();
        while lines.next_line()? && !lines.contains("Phonon") {
            freqs.push(lines.float_field(1)?);
        }
        // column headings
        lines.skip(1)?;
        asc.set_collection_name(qname);
        let base_count = self.base_count();
        for freq in freqs {
            self.vibration_number += 1;
            if !include(self.vibration_number) {
                lines.skip(base_count)?;
                continue;
            }
            if config.single_vibration().is_none() && !config.trajectory {
                asc.clone_last_atom_set(base_count, &self.reference);
                asc.realize(self.supercell.as_ref());
            }
            for j in 0..base_count {
                if !lines.next_line()? {
                    return Err(ParseError::Io(
                        ErrorKind::UnexpectedEof,
                        format!("missing eigenvector for mode {freq}"),
                    ));
                }
                let [_, _, xr, xi, yr, yi, zr, zi] = lines.float_fields(0)?;
                let data = [
                    Complex64::new(xr, xi),
                    Complex64::new(yr, yi),
                    Complex64::new(zr, zi),
                ];
                let mass = self.extra.get(j).map_or(1.0, |e| e.mass);
                let atoms = &asc.current_mut().atoms;
                let vibs: Vec<_> = atoms
                    .iter()
                    .enumerate()
                    .skip(j)
                    .filter(|(_, a)| a.atom_site == j)
                    .map(|(k, a)| {
                        let mut td = a.coord - atoms[a.atom_site].coord;
                        if let Some(sc) = &self.supercell {
                            td = sc.transform_point(&td);
                        }
                        (k, phonon_vector(&data, qvec.as_ref(), &td, mass))
                    })
                    .collect();
                for (k, vib) in vibs {
                    asc.add_vibration(k, vib);
                }
            }
            asc.set_frequency(self.vibration_number, freq, "cm-1");
            let label = format_decimal(freq, 2);
            asc.set_name(format!("{label} cm-1 {qname}"));
            if config.trajectory {
                asc.push_trajectory_step();
            }
        }
        Ok(())
    }
}

/// `x` to `digits` decimal places, rounding halves away from zero
fn format_decimal(x: f64, digits: usize) -> String {
    let scale = 10f64.powi(digits as i32);
    format!("{:.*}", digits, (x * scale).round() / scale)
}
