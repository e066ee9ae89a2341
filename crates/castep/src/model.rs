//! The in-memory result of a read: a growing collection of atom sets, one per
//! structure or vibrational frame, plus free-text load notes.

use std::{collections::BTreeMap, fmt::Display};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use xtal::{Atom, Lattice, Mat4, Supercell, Vec3, Vib};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    /// 1-based vibration number, counted across the whole file
    pub index: usize,
    pub value: f64,
    pub units: String,
}

/// one frame of a trajectory-mode atom set
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub coords: Vec<Vec3>,
    pub vibs: Vec<Option<Vib>>,
    pub frequency: Option<Frequency>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomSet {
    pub name: Option<String>,
    pub atoms: Vec<Atom>,
    pub lattice: Option<Lattice>,
    pub space_group: Option<String>,

    /// whether atom coordinates are currently fractional. always false after
    /// [AtomSetCollection::finalize]
    pub fractional: bool,

    /// eV for .castep output, hartree for .geom trajectories
    pub energy: Option<f64>,
    pub frequency: Option<Frequency>,

    /// per-atom properties like "spin", indexed like `atoms`
    pub properties: BTreeMap<String, Vec<f64>>,

    /// the supercell this set was expanded into, if any
    pub supercell: Option<Supercell>,

    pub trajectory: Vec<TrajectoryStep>,

    /// space group operators acting on fractional coordinates, applied when
    /// the collection is finalized
    pub symmetry_ops: Vec<Mat4>,

    #[serde(skip)]
    realized: bool,
}

/// positions closer than this along every fractional axis, modulo 1, are
/// the same site
const SITE_TOLERANCE: f64 = 0.001;

fn same_site(a: &Vec3, b: &Vec3) -> bool {
    (a - b).iter().all(|d| (d - d.round()).abs() < SITE_TOLERANCE)
}

impl AtomSet {
    /// index of the atom whose name is `name`
    pub fn atom_index(&self, name: &str) -> Option<usize> {
        self.atoms
            .iter()
            .position(|a| a.name.as_deref() == Some(name))
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// expand the set into `supercell` if one is given. this happens at most
    /// once per set; afterwards every atom's `atom_site` points at the unique
    /// site it was generated from
    pub fn realize(&mut self, supercell: Option<&Supercell>) {
        if self.realized {
            return;
        }
        self.realized = true;
        match supercell {
            Some(sc) if self.fractional => {
                let atoms = sc.expand(&self.atoms);
                for values in self.properties.values_mut() {
                    let expanded = atoms
                        .iter()
                        .map(|a| values.get(a.atom_site).copied().unwrap_or(0.0))
                        .collect();
                    *values = expanded;
                }
                self.atoms = atoms;
                self.lattice = self.lattice.as_ref().map(|l| l.scaled(sc.n));
                self.supercell = Some(*sc);
            }
            _ if supercell.is_some() => {
                warn!("not building a supercell from Cartesian coordinates");
            }
            _ => {}
        }
    }

    /// the unit cell lattice, undoing any supercell expansion
    pub fn unit_lattice(&self) -> Option<Lattice> {
        let lattice = self.lattice.as_ref()?;
        Some(match self.supercell {
            Some(sc) => lattice.reduced(sc.n),
            None => lattice.clone(),
        })
    }

    /// Add the image of every atom under each of the symmetry operators,
    /// wrapped into the unit cell, unless an atom already sits there. Images
    /// point back at the atom they were generated from through `atom_site`.
    /// Cartesian sets are converted to fractional coordinates first.
    fn apply_symmetry(&mut self) {
        if self.symmetry_ops.is_empty() {
            return;
        }
        if !self.fractional {
            let Some(inv) =
                self.lattice.as_ref().and_then(|l| l.vectors.try_inverse())
            else {
                warn!("cannot apply symmetry operators without a unit cell");
                return;
            };
            for atom in &mut self.atoms {
                atom.coord = inv * atom.coord;
            }
            self.fractional = true;
        }
        let base = self.atoms.len();
        for op in &self.symmetry_ops {
            for i in 0..base {
                let image = (op * self.atoms[i].coord.push(1.0)).xyz();
                let image = image.map(|x| x - x.floor());
                if self.atoms.iter().any(|a| same_site(&a.coord, &image)) {
                    continue;
                }
                let mut atom = self.atoms[i].clone();
                atom.coord = image;
                atom.atom_site = i;
                self.atoms.push(atom);
            }
        }
        for values in self.properties.values_mut() {
            let generated: Vec<_> = self.atoms[base..]
                .iter()
                .map(|a| values.get(a.atom_site).copied().unwrap_or(0.0))
                .collect();
            values.extend(generated);
        }
        debug!(
            "{} symmetry operators generated {} atoms",
            self.symmetry_ops.len(),
            self.atoms.len() - base
        );
    }

    /// convert fractional coordinates to Cartesian, keeping the fractional
    /// ones on each atom
    fn finalize(&mut self) {
        let Some(lattice) = &self.lattice else {
            return;
        };
        if self.fractional {
            for atom in &mut self.atoms {
                atom.frac = Some(atom.coord);
                atom.coord = lattice.to_cartesian(&atom.coord);
            }
            for step in &mut self.trajectory {
                for c in &mut step.coords {
                    *c = lattice.to_cartesian(c);
                }
            }
            self.fractional = false;
        } else {
            for atom in &mut self.atoms {
                atom.frac = lattice.to_fractional(&atom.coord);
            }
        }
    }
}

impl Display for AtomSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name.as_deref().unwrap_or("-"))?;
        if let Some(sg) = &self.space_group {
            writeln!(f, "space group {sg}")?;
        }
        if let Some(sc) = &self.supercell {
            let [x, y, z] = sc.n;
            writeln!(f, "supercell {x} {y} {z}")?;
        }
        if let Some(lattice) = &self.lattice {
            write!(f, "{lattice}")?;
        }
        if let Some(e) = self.energy {
            writeln!(f, "energy = {e}")?;
        }
        if let Some(Frequency {
            index,
            value,
            units,
        }) = &self.frequency
        {
            writeln!(f, "frequency {index} = {value} {units}")?;
        }
        for (i, atom) in self.atoms.iter().enumerate() {
            write!(f, "{atom}")?;
            if let Some(q) = atom.partial_charge {
                write!(f, " q={q:.4}")?;
            }
            for (name, values) in &self.properties {
                if let Some(v) = values.get(i) {
                    write!(f, " {name}={v:.4}")?;
                }
            }
            if let Some(v) = atom.vib {
                write!(f, " vib {:10.6} {:10.6} {:10.6}", v.x, v.y, v.z)?;
            }
            writeln!(f)?;
        }
        if !self.trajectory.is_empty() {
            writeln!(f, "{} trajectory steps", self.trajectory.len())?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomSetCollection {
    pub name: Option<String>,
    pub sets: Vec<AtomSet>,

    /// whether the sets are successive frames of one trajectory rather than
    /// independent structures
    pub trajectory: bool,

    /// free-text annotations collected while reading
    pub notes: Vec<String>,
}

impl AtomSetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn current(&self) -> Option<&AtomSet> {
        self.sets.last()
    }

    /// the set currently being built, starting one if there is none yet
    pub fn current_mut(&mut self) -> &mut AtomSet {
        if self.sets.is_empty() {
            self.sets.push(AtomSet::default());
        }
        let n = self.sets.len();
        &mut self.sets[n - 1]
    }

    pub fn new_atom_set(&mut self) -> &mut AtomSet {
        self.sets.push(AtomSet::default());
        self.current_mut()
    }

    pub fn set_collection_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_fractional(&mut self, fractional: bool) {
        self.current_mut().fractional = fractional;
    }

    pub fn set_lattice(&mut self, lattice: Lattice) {
        self.current_mut().lattice = Some(lattice);
    }

    pub fn add_symmetry_op(&mut self, op: Mat4) {
        self.current_mut().symmetry_ops.push(op);
    }

    pub fn set_space_group(&mut self, name: &str) {
        self.current_mut().space_group = Some(name.to_owned());
    }

    /// append `atom` to the current set, returning its index in that set
    pub fn add_atom(&mut self, mut atom: Atom) -> usize {
        let set = self.current_mut();
        atom.atom_site = set.atoms.len();
        set.atoms.push(atom);
        set.atoms.len() - 1
    }

    /// like [Self::add_atom], but the atom must carry a name that later
    /// sections can refer to it by
    pub fn add_atom_with_mapped_name(&mut self, atom: Atom) -> usize {
        if atom.name.is_none() {
            debug!("mapping unnamed atom {}", atom.symbol);
        }
        self.add_atom(atom)
    }

    pub fn atom_index(&self, name: &str) -> Option<usize> {
        self.current()?.atom_index(name)
    }

    /// start a new set holding the first `count` atoms of the last one, moved
    /// back to `positions`. the new set keeps the unit cell and coordinate
    /// mode of its source but none of its vibrations, frequency, or supercell
    /// expansion
    pub fn clone_last_atom_set(
        &mut self,
        count: usize,
        positions: &[Vec3],
    ) -> &mut AtomSet {
        let last = self.sets.last().cloned().unwrap_or_default();
        let atoms = last
            .atoms
            .iter()
            .take(count)
            .zip(positions)
            .enumerate()
            .map(|(i, (a, p))| Atom {
                coord: *p,
                frac: None,
                vib: None,
                atom_site: i,
                ..a.clone()
            })
            .collect();
        let properties = last
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().take(count).copied().collect()))
            .collect();
        self.sets.push(AtomSet {
            atoms,
            lattice: last.unit_lattice(),
            space_group: last.space_group,
            fractional: last.fractional,
            properties,
            ..Default::default()
        });
        self.current_mut()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.current_mut().name = Some(name.into());
    }

    pub fn set_energy(&mut self, energy: f64) {
        self.current_mut().energy = Some(energy);
    }

    pub fn set_frequency(&mut self, index: usize, value: f64, units: &str) {
        self.current_mut().frequency = Some(Frequency {
            index,
            value,
            units: units.to_owned(),
        });
    }

    /// attach `vib` to atom `index` of the current set
    pub fn add_vibration(&mut self, index: usize, vib: Vib) {
        match self.current_mut().atoms.get_mut(index) {
            Some(atom) => atom.vib = Some(vib),
            None => warn!("no atom {index} to attach a vibration to"),
        }
    }

    pub fn set_atom_property(&mut self, name: &str, values: Vec<f64>) {
        self.current_mut()
            .properties
            .insert(name.to_owned(), values);
    }

    /// snapshot the current set's positions, vibrations, frequency, and name
    /// as a new trajectory step
    pub fn push_trajectory_step(&mut self) {
        let set = self.current_mut();
        let step = TrajectoryStep {
            coords: set.atoms.iter().map(|a| a.coord).collect(),
            vibs: set.atoms.iter().map(|a| a.vib).collect(),
            frequency: set.frequency.clone(),
            name: set.name.clone(),
        };
        set.trajectory.push(step);
        self.trajectory = true;
    }

    pub fn append_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// finish the current frame, applying `supercell` to it
    pub fn realize(&mut self, supercell: Option<&Supercell>) {
        if let Some(set) = self.sets.last_mut() {
            set.realize(supercell);
        }
    }

    /// drop sets that never received atoms, apply symmetry operators, realize
    /// every remaining set, and convert fractional sets to Cartesian
    /// coordinates
    pub fn finalize(&mut self, supercell: Option<&Supercell>) {
        let before = self.sets.len();
        self.sets.retain(|s| !s.atoms.is_empty());
        if self.sets.len() < before {
            debug!("dropped {} empty atom sets", before - self.sets.len());
        }
        for set in &mut self.sets {
            set.apply_symmetry();
            set.realize(supercell);
            set.finalize();
        }
    }
}

impl Display for AtomSetCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "{name}")?;
        }
        writeln!(
            f,
            "{} atom sets{}",
            self.sets.len(),
            if self.trajectory { " (trajectory)" } else { "" }
        )?;
        for (i, set) in self.sets.iter().enumerate() {
            write!(f, "\natom set {}: {set}", i + 1)?;
        }
        Ok(())
    }
}
