//! Settings controlling which parts of a CASTEP file are read

use std::{
    fmt::{Debug, Display},
    path::Path,
    str::FromStr,
};

use log::info;
use serde::{Deserialize, Serialize};
use xtal::{Supercell, Vec3};

use crate::ParseError;

/// A q-point requested with a brace-enclosed vector like `{1/4 1/4 0}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesiredQ {
    pub vector: Vec3,

    /// the vector exactly as it appears in the normalized filter, braces
    /// included
    pub label: String,
}

/// A normalized filter string. Keys are looked up by substring, so the text is
/// upper case, `;`-delimited, and wrapped in `;` on both ends:
///
/// `q=(1/4 1/4 0), charge=hirshfeld` becomes `;Q={1/4 1/4 0};CHARGE=HIRSHFELD;`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Filter {
    raw: String,
    text: String,

    /// the first four letters of the requested charge table
    pub charge: String,

    /// `Q=ALL`: read every q-point, not just the first accepted one
    pub all_q: bool,

    pub desired_q: Option<DesiredQ>,

    /// `NOVIB`: skip every vibration
    pub novib: bool,

    /// `NOSYM`: ignore `SYMMETRY_OPS` blocks in .cell files
    pub nosym: bool,

    /// `TSTYPE=`: read only the transition-state frames whose label line
    /// contains this text, like `REA`, `TS`, or `PRO`
    pub tstype: Option<String>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            raw: String::new(),
            text: String::new(),
            charge: "MULL".to_owned(),
            all_q: false,
            desired_q: None,
            novib: false,
            nosym: false,
            tstype: None,
        }
    }
}

/// upper case, `(` and `)` to braces, single spaces, and `;` for commas that
/// are not inside braces
fn normalize(s: &str) -> String {
    let mut ret = String::with_capacity(s.len() + 2);
    ret.push(';');
    let mut depth = 0;
    for c in s.trim().to_uppercase().chars() {
        let c = match c {
            '(' => '{',
            ')' => '}',
            c => c,
        };
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ' ' if ret.ends_with(' ') => continue,
            ',' if depth == 0 => {
                ret.push(';');
                continue;
            }
            _ => {}
        }
        ret.push(c);
    }
    ret.push(';');
    ret
}

/// parse a single component like `0.25`, `-1/4`, or `1/3`
fn parse_fraction(s: &str) -> Result<f64, ParseError> {
    let err = || ParseError::Config(format!("bad q-point component `{s}`"));
    match s.split_once('/') {
        Some((n, d)) => {
            let n: f64 = n.trim().parse().map_err(|_| err())?;
            let d: f64 = d.trim().parse().map_err(|_| err())?;
            Ok(n / d)
        }
        None => s.trim().parse().map_err(|_| err()),
    }
}

/// read the first brace-enclosed vector of `text`. components are separated
/// by commas if there are any, otherwise by spaces
fn desired_q(text: &str) -> Result<Option<DesiredQ>, ParseError> {
    let Some(start) = text.find('{') else {
        return Ok(None);
    };
    let Some(len) = text[start..].find('}') else {
        return Err(ParseError::Config(format!(
            "unterminated q-point in `{text}`"
        )));
    };
    let label = &text[start..=start + len];
    let inner = &label[1..label.len() - 1];
    let parts: Vec<&str> = if inner.contains(',') {
        inner.split(',').collect()
    } else {
        inner.split_whitespace().collect()
    };
    let [x, y, z] = parts[..] else {
        return Err(ParseError::Config(format!(
            "q-point `{label}` needs three components"
        )));
    };
    Ok(Some(DesiredQ {
        vector: Vec3::new(
            parse_fraction(x)?,
            parse_fraction(y)?,
            parse_fraction(z)?,
        ),
        label: label.to_owned(),
    }))
}

impl Filter {
    pub fn new(s: &str) -> Result<Self, ParseError> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut ret = Self {
            raw: s.to_owned(),
            text: normalize(s),
            ..Self::default()
        };
        if let Some(charge) = ret.get("CHARGE=") {
            ret.charge = charge.chars().take(4).collect();
        }
        ret.all_q = ret.has_key("Q=ALL");
        ret.novib = ret.has_key("NOVIB");
        ret.nosym = ret.has_key("NOSYM");
        ret.tstype = ret.get("TSTYPE=").map(str::to_owned);
        if !ret.all_q {
            ret.desired_q = desired_q(&ret.text)?;
        }
        ret.text = ret.text.replace("-PT", "");
        if let Some(q) = &ret.desired_q {
            info!("looking for q-pt={}", q.label);
        }
        Ok(ret)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.text.contains(key)
    }

    /// the value following `key`, up to the next `;`
    pub fn get(&self, key: &str) -> Option<&str> {
        let start = self.text.find(key)? + key.len();
        let len = self.text[start..].find(';')?;
        Some(&self.text[start..start + len])
    }
}

impl FromStr for Filter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Filter {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Filter> for String {
    fn from(value: Filter) -> Self {
        value.raw
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// Filter keywords, separated by commas or semicolons. Supported keys are
    /// Q=n, Q=n.m for the mth consecutive listing of q-point n, Q={a b c} for
    /// an explicit wavevector, Q=ALL, CHARGE=MULLIKEN or CHARGE=HIRSHFELD,
    /// NOVIB, NOSYM, and TSTYPE=REA, TS, or PRO.
    filter: Option<String>,

    /// The single 1-based vibration to read. All vibrations are read if this
    /// is absent or 0.
    vibration: Option<usize>,

    /// Repeat counts along a, b, and c for building a supercell and selecting
    /// the q-points commensurate with it. Every count must be at least 1.
    supercell: Option<[usize; 3]>,

    /// Whether to store phonon modes as steps of one trajectory instead of as
    /// separate atom sets. Defaults to false.
    trajectory: Option<bool>,

    /// The single 1-based structure to read from .castep output. All
    /// structures are read if this is absent.
    model: Option<usize>,
}

/// Construct a `Config` using [Config::load] on a TOML file or use
/// [Config::new] and the builder methods
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct Config {
    pub filter: Filter,

    /// 1-based vibration number to read, or `None` for all of them
    pub vibration: Option<usize>,

    pub supercell: Option<Supercell>,

    /// append phonon modes as trajectory steps instead of cloning atom sets
    pub trajectory: bool,

    /// 1-based structure to read from .castep output, or `None` for all
    pub model: Option<usize>,
}

impl TryFrom<RawConfig> for Config {
    type Error = ParseError;

    fn try_from(rc: RawConfig) -> Result<Self, Self::Error> {
        let ret = Self {
            filter: Filter::new(rc.filter.as_deref().unwrap_or_default())?,
            vibration: rc.vibration.filter(|&n| n > 0),
            supercell: rc.supercell.map(Supercell::from),
            trajectory: rc.trajectory.unwrap_or(false),
            model: rc.model,
        };
        ret.validate()?;
        Ok(ret)
    }
}

impl Config {
    /// Construct a [Config] that reads everything: no filter, every vibration
    /// and structure, no supercell, and one atom set per phonon mode
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// read only vibration `n`. 0 means every vibration
    pub fn vibration(mut self, n: usize) -> Self {
        self.vibration = (n > 0).then_some(n);
        self
    }

    pub fn supercell(mut self, nx: usize, ny: usize, nz: usize) -> Self {
        self.supercell = Some(Supercell::new(nx, ny, nz));
        self
    }

    pub fn trajectory(mut self, b: bool) -> Self {
        self.trajectory = b;
        self
    }

    pub fn model(mut self, n: usize) -> Self {
        self.model = Some(n);
        self
    }

    /// load a [Config] from the TOML file specified by `filename`
    pub fn load<P>(filename: P) -> Result<Self, ParseError>
    where
        P: AsRef<Path> + Debug,
    {
        let contents = std::fs::read_to_string(&filename)?;
        toml::from_str(&contents).map_err(|e| {
            ParseError::Config(format!(
                "failed to deserialize config file '{filename:?}' with {e}"
            ))
        })
    }

    /// check the settings that cannot be caught while building a [Config]
    /// with the builder methods. [crate::CastepReader::read] calls this
    /// before reading anything
    pub fn validate(&self) -> Result<(), ParseError> {
        if let Some(sc) = &self.supercell
            && sc.n.contains(&0)
        {
            let [x, y, z] = sc.n;
            return Err(ParseError::Config(format!(
                "supercell {x} {y} {z} needs at least one cell along each axis"
            )));
        }
        Ok(())
    }

    /// the single vibration to read, if one was requested
    pub fn single_vibration(&self) -> Option<usize> {
        self.vibration.filter(|&n| n > 0)
    }

    /// whether the 1-based vibration `n` should be read
    pub fn include_vibration(&self, n: usize) -> bool {
        !self.filter.novib && self.single_vibration().is_none_or(|v| v == n)
    }

    /// whether the 1-based structure `n` should be read
    pub fn include_model(&self, n: usize) -> bool {
        self.model.is_none_or(|m| m == n)
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Config {
            filter,
            vibration,
            supercell,
            trajectory,
            model,
        } = self;
        let opt = |o: Option<usize>| o.map_or("all".to_owned(), |n| n.to_string());
        write!(
            f,
            "
Configuration Options:
filter = {filter}
charge = {}
vibration = {}
supercell = {}
trajectory = {trajectory}
model = {}
",
            filter.charge,
            opt(vibration.filter(|&n| n > 0)),
            supercell.map_or("none".to_owned(), |s| {
                let [x, y, z] = s.n;
                format!("{x} {y} {z}")
            }),
            opt(*model),
        )
    }
}
