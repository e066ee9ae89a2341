//! Compact labels for fractional coordinates, used to name q-points the way
//! they are usually written in band-structure paths (`1/2 0 1/4`).

use crate::Vec3;

const TWELFTHS: [&str; 12] = [
    "0", "1/12", "1/6", "1/4", "1/3", "5/12", "1/2", "7/12", "2/3", "3/4",
    "5/6", "11/12",
];

/// whether `f` is within 0.001 of an integer
pub fn is_int(f: f64) -> bool {
    (f - f.round()).abs() < 0.001
}

/// round to two decimal places
fn approx(f: f64) -> f64 {
    (f * 100.0).round() / 100.0
}

/// label a count of twelfths as a reduced fraction. counts that are not
/// whole twelfths fall back to the smallest denominator below 20 that fits
pub fn twelfths_of(n12ths: f64) -> String {
    let (sign, n12ths) = if n12ths < 0.0 {
        ("-", -n12ths)
    } else {
        ("", n12ths)
    };
    let mut n = n12ths.round() as i64;
    let mut m = 12;
    if (n as f64 - n12ths).abs() > 0.01 {
        let f = n12ths / 12.0;
        let found = (3..20).find_map(|m| {
            let fm = f * m as f64;
            let n = fm.round();
            ((n - fm).abs() < 0.01).then_some((n as i64, m))
        });
        let Some((num, den)) = found else {
            return format!("{sign}{f}");
        };
        n = num;
        m = den;
    } else {
        if n == 12 {
            return format!("{sign}1");
        }
        if n < 12 {
            return format!("{sign}{}", TWELFTHS[n as usize]);
        }
        m = match n % 12 {
            0 => return format!("{sign}{}", n / 12),
            2 | 10 => 6,
            3 | 9 => 4,
            4 | 8 => 3,
            6 => 2,
            _ => m,
        };
        n = n * m / 12;
    }
    format!("{sign}{n}/{m}")
}

/// label a single fractional component, preferring thirds and twelfths in
/// the way symmetry operators are written
fn fc(x: f64) -> String {
    let m = if x < 0.0 { "-" } else { "" };
    let x24 = approx(x.abs() * 24.0) as i64;
    if x24 % 24 == 0 {
        return format!("{m}{}", x24 / 24);
    }
    if x24 % 8 != 0 {
        return format!("{m}{}", twelfths_of((x24 >> 1) as f64));
    }
    format!("{m}{}/3", x24 / 8)
}

/// space-separated label for a vector whose components are multiples of 1/12
pub fn fcoord(p: &Vec3) -> String {
    format!("{} {} {}", fc(p.x), fc(p.y), fc(p.z))
}
