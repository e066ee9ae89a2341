use std::{fmt::Display, io, str::FromStr};

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::{Mat3, Vec3, Vib};

/// A single atom in an atom set. `coord` is fractional or Cartesian depending
/// on the coordinate mode of the owning set until the set is finalized, after
/// which it is always Cartesian and `frac` holds the fractional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub symbol: String,

    #[serde(default)]
    pub name: Option<String>,

    pub coord: Vec3,

    #[serde(default)]
    pub frac: Option<Vec3>,

    /// index within the owning set of the unique site this atom was
    /// replicated from. equal to the atom's own index for unreplicated atoms
    pub atom_site: usize,

    #[serde(default)]
    pub partial_charge: Option<f64>,

    #[serde(default)]
    pub vib: Option<Vib>,

    /// Born effective charge tensor
    #[serde(default)]
    pub tensor: Option<Mat3>,
}

impl AbsDiffEq for Atom {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-8
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < epsilon;
        self.symbol == other.symbol
            && close(self.coord.x, other.coord.x)
            && close(self.coord.y, other.coord.y)
            && close(self.coord.z, other.coord.z)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:5} {:15.10} {:15.10} {:15.10}",
            self.label(),
            self.coord.x,
            self.coord.y,
            self.coord.z
        )
    }
}

impl FromStr for Atom {
    type Err = io::Error;

    /// parse an Atom from a line like
    ///  Si 0.25 0.25 0.25
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<_> = s.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(io::Error::other("wrong number of fields in Atom"));
        }
        let coord = fields[1..].iter().map(|s| s.parse());
        if coord.clone().any(|s| s.is_err()) {
            return Err(io::Error::other(
                "failed to parse coordinate field as f64",
            ));
        }
        let coord: Vec<_> = coord.flatten().collect();
        Ok(Self::new(fields[0], coord[0], coord[1], coord[2]))
    }
}

fn titlecase(s: &str) -> String {
    let mut cs = s.chars();
    let Some(first) = cs.next() else {
        return String::new();
    };
    let mut ret = first.to_uppercase().to_string();
    for c in cs {
        ret.push_str(&c.to_lowercase().to_string());
    }
    ret
}

/// reduce a species label like `FE`, `Fe1`, or `fe_b` to an element symbol
pub fn element_symbol(label: &str) -> String {
    let alpha: String =
        label.chars().take_while(char::is_ascii_alphabetic).collect();
    titlecase(&alpha)
}

impl Atom {
    pub fn new(symbol: &str, x: f64, y: f64, z: f64) -> Self {
        Self {
            symbol: element_symbol(symbol),
            name: None,
            coord: Vec3::new(x, y, z),
            frac: None,
            atom_site: 0,
            partial_charge: None,
            vib: None,
            tensor: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// the atom name if one was read, otherwise the element symbol
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titlecase() {
        assert_eq!(super::titlecase("AL"), "Al");
        assert_eq!(super::titlecase("Al"), "Al");
        assert_eq!(super::titlecase("al"), "Al");
        assert_eq!(super::titlecase("H"), "H");
        assert_eq!(super::titlecase(""), "");
    }

    #[test]
    fn symbols() {
        assert_eq!(element_symbol("Pd"), "Pd");
        assert_eq!(element_symbol("FE2"), "Fe");
        assert_eq!(element_symbol("o_surf"), "O");
    }

    #[test]
    fn from_str() {
        let got: Atom = "SI 0.25 0.5 0.75".parse().unwrap();
        assert_eq!(got.symbol, "Si");
        assert_eq!(got.coord, Vec3::new(0.25, 0.5, 0.75));
        assert!("Si 0.25 0.5".parse::<Atom>().is_err());
        assert!("Si 0.25 0.5 x".parse::<Atom>().is_err());
    }
}
