use std::f64::consts::TAU;

use num_complex::Complex64;
use xtal::{Vec3, Vib};

/// Turn the complex eigenvector components of one atom into a real,
/// mass-weighted displacement. At Gamma (`qvec` is `None`) the real parts are
/// used directly. Otherwise each component is rotated by the phase
/// `2π q·translation`, where `translation` is the atom's offset in unit-cell
/// fractional coordinates from the site it was replicated from, and the real
/// part of the result is kept.
pub fn phonon_vector(
    data: &[Complex64; 3],
    qvec: Option<&Vec3>,
    translation: &Vec3,
    mass: f32,
) -> Vib {
    let v = match qvec {
        None => Vec3::new(data[0].re, data[1].re, data[2].re),
        Some(q) => {
            let rot = Complex64::from_polar(1.0, TAU * q.dot(translation));
            Vec3::from_iterator(data.iter().map(|z| (z * rot).re))
        }
    };
    let weight = f64::from(1.0 / mass).sqrt();
    (v * weight).cast()
}
