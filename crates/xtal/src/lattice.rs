use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Mat3, Vec3};

/// unit cell vectors, stored as the columns of `vectors` so that a Cartesian
/// position is `vectors * frac`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    pub vectors: Mat3,
}

impl Lattice {
    pub fn from_vectors(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vectors: Mat3::from_columns(&[a, b, c]),
        }
    }

    /// build a lattice from lengths and angles (in degrees) with `a` along x
    /// and `b` in the xy plane
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Self {
        let (ca, cb) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sg, cg) = gamma.to_radians().sin_cos();
        let cy = (ca - cb * cg) / sg;
        let cz = (1.0 - cb * cb - cy * cy).sqrt();
        Self::from_vectors(
            Vec3::new(a, 0.0, 0.0),
            Vec3::new(b * cg, b * sg, 0.0),
            Vec3::new(c * cb, c * cy, c * cz),
        )
    }

    pub fn a(&self) -> Vec3 {
        self.vectors.column(0).into_owned()
    }

    pub fn b(&self) -> Vec3 {
        self.vectors.column(1).into_owned()
    }

    pub fn c(&self) -> Vec3 {
        self.vectors.column(2).into_owned()
    }

    /// a, b, c, alpha, beta, gamma with the angles in degrees
    pub fn parameters(&self) -> [f64; 6] {
        let (a, b, c) = (self.a(), self.b(), self.c());
        let angle = |u: &Vec3, v: &Vec3| u.angle(v).to_degrees();
        [
            a.norm(),
            b.norm(),
            c.norm(),
            angle(&b, &c),
            angle(&a, &c),
            angle(&a, &b),
        ]
    }

    pub fn volume(&self) -> f64 {
        self.vectors.determinant().abs()
    }

    pub fn to_cartesian(&self, frac: &Vec3) -> Vec3 {
        self.vectors * frac
    }

    /// returns `None` for a degenerate cell
    pub fn to_fractional(&self, cart: &Vec3) -> Option<Vec3> {
        self.vectors.try_inverse().map(|inv| inv * cart)
    }

    /// express the Cartesian rotation `rot` in the basis of the lattice
    /// vectors, so that it acts on fractional coordinates. `None` for a
    /// degenerate cell
    pub fn to_lattice_basis(&self, rot: &Mat3) -> Option<Mat3> {
        self.vectors
            .try_inverse()
            .map(|inv| inv * rot * self.vectors)
    }

    /// the lattice of an `n[0] x n[1] x n[2]` supercell of `self`
    pub fn scaled(&self, n: [usize; 3]) -> Self {
        let mut vectors = self.vectors;
        for (i, ni) in n.iter().enumerate() {
            vectors.column_mut(i).scale_mut(*ni as f64);
        }
        Self { vectors }
    }

    /// the inverse of [Self::scaled], recovering the unit cell of an
    /// `n[0] x n[1] x n[2]` supercell
    pub fn reduced(&self, n: [usize; 3]) -> Self {
        let mut vectors = self.vectors;
        for (i, ni) in n.iter().enumerate() {
            vectors.column_mut(i).unscale_mut(*ni as f64);
        }
        Self { vectors }
    }
}

impl Display for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, v) in ["a", "b", "c"].iter().zip([self.a(), self.b(), self.c()])
        {
            writeln!(f, "{name} {:12.6} {:12.6} {:12.6}", v.x, v.y, v.z)?;
        }
        Ok(())
    }
}
