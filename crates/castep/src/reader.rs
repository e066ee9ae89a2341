use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::OnceLock,
};

use log::{info, trace};
use regex::Regex;

use crate::{
    AtomSetCollection, Config, ParseError,
    cell::read_cell,
    charges::{read_born_charges, read_charges},
    geom::read_trajectories,
    lines::LineReader,
    output::{read_atoms, read_energy, read_lattice},
    phonon::PhononParseSession,
};

static OUTPUT_SECTIONS: OnceLock<[(Regex, Section); 7]> = OnceLock::new();
static PHONON_SECTIONS: OnceLock<[(Regex, Section); 4]> = OnceLock::new();

/// The kinds of CASTEP file, told apart by their first significant line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// .cell input, made of `%BLOCK`s
    Cell,
    /// .phonon output and .geom/.md trajectories, which start with
    /// `BEGIN header`
    Phonon,
    /// .castep output
    Output,
    /// .ts transition state search output, a trajectory whose frames are
    /// labelled `REA`, `TS`, or `PRO`
    TransitionState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    RealLattice,
    Atoms,
    Charges,
    BornCharges,
    /// energy in the given whitespace-separated field
    Energy(usize),
    Trajectory,
    UnitCell,
    PhononCoords,
    QPoint,
}

fn output_sections() -> &'static [(Regex, Section)] {
    OUTPUT_SECTIONS.get_or_init(|| {
        trace!("initializing .castep section regexes");
        [
            (Regex::new(r"Real Lattice\(A\)").unwrap(), Section::RealLattice),
            (
                Regex::new(r"Fractional coordinates of atoms").unwrap(),
                Section::Atoms,
            ),
            (
                Regex::new(r"Atomic Populations \(Mulliken\)|Hirshfi?eld Analysis")
                    .unwrap(),
                Section::Charges,
            ),
            (
                Regex::new(r"Born Effective Charges").unwrap(),
                Section::BornCharges,
            ),
            // not "Final energy, E"
            (Regex::new(r"Final energy ").unwrap(), Section::Energy(3)),
            (
                Regex::new(r"Dispersion corrected final energy\*").unwrap(),
                Section::Energy(5),
            ),
            (
                Regex::new(r"Total energy corrected").unwrap(),
                Section::Energy(8),
            ),
        ]
    })
}

fn phonon_sections() -> &'static [(Regex, Section)] {
    PHONON_SECTIONS.get_or_init(|| {
        trace!("initializing .phonon section regexes");
        [
            (Regex::new(r"<-- E").unwrap(), Section::Trajectory),
            (Regex::new(r"^.Unit cell vectors").unwrap(), Section::UnitCell),
            (
                Regex::new(r"Fractional Co-ordinates").unwrap(),
                Section::PhononCoords,
            ),
            (Regex::new(r"q-pt").unwrap(), Section::QPoint),
        ]
    })
}

type VibrationFilter = Box<dyn Fn(usize) -> bool>;

/// A single-use reader over one CASTEP file
pub struct CastepReader<R> {
    lines: LineReader<R>,
    config: Config,
    include: Option<VibrationFilter>,
    asc: AtomSetCollection,
    phonon: PhononParseSession,
    kind: Option<FileKind>,

    /// 1-based count of structures seen in .castep output
    model_number: usize,

    /// whether the most recent structure passed [Config::include_model]
    model_selected: bool,

    born_noted: bool,
}

impl CastepReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: Config,
    ) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ParseError::Io(e.kind(), format!("{}: {e}", path.display()))
        })?;
        Ok(Self::new(BufReader::new(f), config))
    }
}

impl<R: BufRead> CastepReader<R> {
    pub fn new(input: R, config: Config) -> Self {
        Self {
            lines: LineReader::new(input),
            phonon: PhononParseSession::new(config.supercell),
            config,
            include: None,
            asc: AtomSetCollection::new(),
            kind: None,
            model_number: 0,
            model_selected: false,
            born_noted: false,
        }
    }

    /// only materialize vibrations for which `f` returns true, in addition to
    /// the vibration and NOVIB settings of the [Config]
    pub fn with_vibration_filter(
        mut self,
        f: impl Fn(usize) -> bool + 'static,
    ) -> Self {
        self.include = Some(Box::new(f));
        self
    }

    /// scan past blank and comment lines until one identifies the kind of
    /// file
    fn detect(&mut self) -> Result<Option<FileKind>, ParseError> {
        while self.lines.next_line()? {
            let line = self.lines.line().trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!')
            {
                continue;
            }
            if line.starts_with('%') {
                return Ok(Some(FileKind::Cell));
            }
            if line.starts_with("LST") {
                return Ok(Some(FileKind::TransitionState));
            }
            if line.starts_with("BEGIN header") {
                return Ok(Some(FileKind::Phonon));
            }
            if line.contains("CASTEP") {
                return Ok(Some(FileKind::Output));
            }
        }
        Ok(None)
    }

    /// consume the input and return the finalized collection
    pub fn read(mut self) -> Result<AtomSetCollection, ParseError> {
        self.config.validate()?;
        self.kind = self.detect()?;
        match self.kind {
            Some(FileKind::Cell) => {
                info!("reading CASTEP .cell file");
                read_cell(
                    &mut self.lines,
                    &mut self.asc,
                    !self.config.filter.nosym,
                )?;
            }
            Some(kind) => {
                info!("reading CASTEP {kind:?} file");
                let table = match kind {
                    FileKind::Output => output_sections(),
                    _ => phonon_sections(),
                };
                while self.lines.next_line()? {
                    self.check_line(table)?;
                }
            }
            None => info!("no CASTEP content found"),
        }
        self.asc.finalize(self.config.supercell.as_ref());
        Ok(self.asc)
    }

    /// dispatch the current line to the first section whose pattern matches
    fn check_line(
        &mut self,
        table: &[(Regex, Section)],
    ) -> Result<(), ParseError> {
        let line = self.lines.line();
        let Some(section) = table
            .iter()
            .find(|(re, _)| re.is_match(line))
            .map(|(_, s)| *s)
        else {
            return Ok(());
        };
        trace!("line {}: {section:?}", self.lines.line_number());
        let supercell = self.config.supercell;
        let lines = &mut self.lines;
        let asc = &mut self.asc;
        match section {
            Section::RealLattice => read_lattice(lines, asc, supercell.as_ref()),
            Section::Atoms => {
                self.model_number += 1;
                self.model_selected =
                    self.config.include_model(self.model_number);
                if self.model_selected {
                    read_atoms(lines, asc)?;
                }
                Ok(())
            }
            Section::Charges if self.model_selected => {
                read_charges(lines, asc, &self.config.filter.charge)
            }
            Section::BornCharges if self.model_selected => {
                if read_born_charges(lines, asc)? && !self.born_noted {
                    asc.append_note(
                        "Ellipsoids set \"charge\": Born Effective Charges",
                    );
                    self.born_noted = true;
                }
                Ok(())
            }
            Section::Charges | Section::BornCharges => Ok(()),
            Section::Energy(field) => {
                read_energy(lines, asc, field, "");
                Ok(())
            }
            Section::Trajectory => read_trajectories(
                lines,
                asc,
                &self.config,
                self.kind == Some(FileKind::TransitionState),
            ),
            Section::UnitCell => self.phonon.read_unit_cell(lines, asc),
            Section::PhononCoords => {
                self.phonon.read_fractional_coords(lines, asc)
            }
            Section::QPoint => {
                let config = &self.config;
                let extra = self.include.as_deref();
                let include = |n: usize| {
                    config.include_vibration(n) && extra.is_none_or(|f| f(n))
                };
                self.phonon.read_qpoint(lines, asc, config, &include)
            }
        }
    }
}
