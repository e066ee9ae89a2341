use serde::{Deserialize, Serialize};

use crate::{Atom, Mat4, Vec3, fraction::is_int};

/// a diagonal supercell of `n[0] x n[1] x n[2]` unit cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Supercell {
    pub n: [usize; 3],
}

impl From<[usize; 3]> for Supercell {
    fn from(n: [usize; 3]) -> Self {
        Self { n }
    }
}

impl Supercell {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { n: [nx, ny, nz] }
    }

    pub fn is_unit(&self) -> bool {
        self.n == [1, 1, 1]
    }

    fn scale(&self) -> Vec3 {
        Vec3::new(self.n[0] as f64, self.n[1] as f64, self.n[2] as f64)
    }

    /// the affine matrix taking supercell fractional coordinates to unit
    /// cell fractional coordinates
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_diagonal(&self.scale().push(1.0))
    }

    /// apply [Self::matrix] to the point `p`
    pub fn transform_point(&self, p: &Vec3) -> Vec3 {
        (self.matrix() * p.push(1.0)).xyz()
    }

    /// whether every component of `q`, with zeros counted as 1, times the
    /// repeat count along that axis is an integer
    pub fn is_commensurate(&self, q: &Vec3) -> bool {
        q.iter()
            .zip(self.n)
            .all(|(&q, n)| is_int(if q == 0.0 { 1.0 } else { q } * n as f64))
    }

    /// whether modes at `q` have a real representation in this supercell.
    /// the Gamma point is only accepted by the trivial supercell
    pub fn accepts(&self, q: &Vec3) -> bool {
        let gamma = q.norm() == 0.0;
        !(gamma && !self.is_unit()) && self.is_commensurate(q)
    }

    /// replicate `base`, whose coordinates are fractional in the unit cell,
    /// into the supercell. the first `base.len()` atoms of the result are the
    /// original sites, followed by one block of replicas per extra cell. every
    /// atom's `atom_site` is the index of the original it came from
    pub fn expand(&self, base: &[Atom]) -> Vec<Atom> {
        let scale = self.scale();
        let place = |atom: &Atom, site: usize, cell: Vec3| {
            let mut atom = atom.clone();
            atom.coord = (atom.coord + cell).component_div(&scale);
            atom.atom_site = site;
            atom
        };
        let mut ret: Vec<Atom> = base
            .iter()
            .enumerate()
            .map(|(j, a)| place(a, j, Vec3::zeros()))
            .collect();
        let [nx, ny, nz] = self.n;
        for ix in 0..nx {
            for iy in 0..ny {
                for iz in 0..nz {
                    if ix == 0 && iy == 0 && iz == 0 {
                        continue;
                    }
                    let cell = Vec3::new(ix as f64, iy as f64, iz as f64);
                    for (j, atom) in base.iter().enumerate() {
                        ret.push(place(atom, j, cell));
                    }
                }
            }
        }
        ret
    }
}
