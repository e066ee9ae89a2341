//! `%BLOCK` sections of .cell input files

use std::io::BufRead;

use log::{debug, info, warn};
use xtal::{ANGBOHR, Atom, Lattice, Mat3, Mat4, Vec3};

use crate::{AtomSetCollection, ParseError, lines::LineReader};

/// scale factors to Å for the length units CASTEP accepts
const LENGTH_UNITS: [(&str, f64); 6] = [
    ("bohr", ANGBOHR),
    ("m", 1e10),
    ("cm", 1e8),
    ("nm", 10.0),
    ("ang", 1.0),
    ("a0", ANGBOHR),
];

fn is_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.starts_with('!')
}

/// advance past blank and comment lines
fn next_significant<R: BufRead>(
    lines: &mut LineReader<R>,
) -> Result<bool, ParseError> {
    while lines.next_line()? {
        if !is_comment(lines.line()) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// parse a number that may be written as a fraction like `1/3`
fn parse_calc<R: BufRead>(
    lines: &LineReader<R>,
    token: &str,
) -> Result<f64, ParseError> {
    match token.split_once('/') {
        Some((n, d)) => Ok(lines.parse_float(n)? / lines.parse_float(d)?),
        None => lines.parse_float(token),
    }
}

fn calc_fields<R: BufRead>(
    lines: &LineReader<R>,
    start: usize,
) -> Result<Vec3, ParseError> {
    Ok(Vec3::new(
        parse_calc(lines, lines.field(start)?)?,
        parse_calc(lines, lines.field(start + 1)?)?,
        parse_calc(lines, lines.field(start + 2)?)?,
    ))
}

/// if the current line names a length unit, consume it and return its scale
/// factor
fn read_length_unit<R: BufRead>(
    lines: &mut LineReader<R>,
) -> Result<Option<f64>, ParseError> {
    let Ok(unit) = lines.field(0) else {
        return Ok(Some(1.0));
    };
    let Some((_, factor)) = LENGTH_UNITS
        .iter()
        .find(|(name, _)| unit.eq_ignore_ascii_case(name))
    else {
        return Ok(Some(1.0));
    };
    let factor = *factor;
    if !next_significant(lines)? {
        return Ok(None);
    }
    Ok(Some(factor))
}

fn field_count<R: BufRead>(lines: &LineReader<R>) -> usize {
    lines.tokens().len()
}

fn is_end_block<R: BufRead>(lines: &LineReader<R>) -> bool {
    lines
        .field(0)
        .is_ok_and(|t| t.eq_ignore_ascii_case("%ENDBLOCK"))
}

/// Read every block of a .cell file. `lines` should already be on the first
/// `%` line. SYMMETRY_OPS blocks are only read if `symmetry` is true.
pub fn read_cell<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
    symmetry: bool,
) -> Result<(), ParseError> {
    loop {
        let tokens = lines.tokens();
        if tokens.len() >= 2 && tokens[0].eq_ignore_ascii_case("%BLOCK") {
            let block = tokens[1].to_ascii_uppercase();
            info!("{}", lines.line().trim());
            match block.as_str() {
                "LATTICE_ABC" => read_lattice_abc(lines, asc)?,
                "LATTICE_CART" => read_lattice_cart(lines, asc)?,
                "POSITIONS_FRAC" => {
                    asc.set_fractional(true);
                    read_positions(lines, asc, false)?;
                }
                "POSITIONS_ABS" => {
                    asc.set_fractional(false);
                    read_positions(lines, asc, true)?;
                }
                "SYMMETRY_OPS" if symmetry => read_symmetry_ops(lines, asc)?,
                _ => debug!("skipping block {block}"),
            }
        }
        if !next_significant(lines)? {
            return Ok(());
        }
    }
}

/// ```text
/// %BLOCK LATTICE_ABC
/// ang
/// 16.66566792 8.33283396  16.82438907
/// 90.0    90.0    90.0
/// %ENDBLOCK LATTICE_ABC
/// ```
fn read_lattice_abc<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
) -> Result<(), ParseError> {
    if !next_significant(lines)? {
        return Ok(());
    }
    let Some(factor) = read_length_unit(lines)? else {
        return Ok(());
    };
    if field_count(lines) < 3 {
        warn!("error reading a,b,c in LATTICE_ABC: {}", lines.line());
        return Ok(());
    }
    let abc = calc_fields(lines, 0)? * factor;
    if !next_significant(lines)? {
        return Ok(());
    }
    if field_count(lines) < 3 {
        warn!("error reading alpha,beta,gamma in LATTICE_ABC: {}", lines.line());
        return Ok(());
    }
    let angles = calc_fields(lines, 0)?;
    asc.set_lattice(Lattice::from_parameters(
        abc.x, abc.y, abc.z, angles.x, angles.y, angles.z,
    ));
    Ok(())
}

/// ```text
/// %BLOCK LATTICE_CART
/// ang
/// 16.66566792 0.0   0.0
/// 0.0   8.33283396  0.0
/// 0.0   0.0   16.82438907
/// %ENDBLOCK LATTICE_CART
/// ```
fn read_lattice_cart<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
) -> Result<(), ParseError> {
    if !next_significant(lines)? {
        return Ok(());
    }
    let Some(factor) = read_length_unit(lines)? else {
        return Ok(());
    };
    let mut abc = [Vec3::zeros(); 3];
    for (i, v) in abc.iter_mut().enumerate() {
        if i > 0 && !next_significant(lines)? {
            return Ok(());
        }
        if field_count(lines) < 3 {
            warn!(
                "error reading lattice vector {} in LATTICE_CART: {}",
                i + 1,
                lines.line()
            );
            return Ok(());
        }
        *v = calc_fields(lines, 0)? * factor;
    }
    let [a, b, c] = abc;
    asc.set_lattice(Lattice::from_vectors(a, b, c));
    Ok(())
}

/// ```text
/// %BLOCK POSITIONS_FRAC
/// Pd         0.0 0.0 0.0
/// O:surf     0.5 0.5 0.1
/// %ENDBLOCK POSITIONS_FRAC
/// ```
///
/// POSITIONS_ABS blocks have the same rows but may start with a length unit
fn read_positions<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
    absolute: bool,
) -> Result<(), ParseError> {
    if !next_significant(lines)? {
        return Ok(());
    }
    let factor = if absolute {
        let Some(factor) = read_length_unit(lines)? else {
            return Ok(());
        };
        factor
    } else {
        1.0
    };
    loop {
        if is_end_block(lines) {
            return Ok(());
        }
        if field_count(lines) >= 4 {
            let species = lines.field(0)?;
            let coord = calc_fields(lines, 1)? * factor;
            let atom = match species.split_once(':') {
                Some((symbol, _)) => {
                    Atom::new(symbol, coord.x, coord.y, coord.z)
                        .with_name(species)
                }
                None => Atom::new(species, coord.x, coord.y, coord.z),
            };
            asc.add_atom(atom);
        } else {
            warn!("cannot read CASTEP atom data: {}", lines.line());
        }
        if !next_significant(lines)? {
            return Ok(());
        }
    }
}

/// ```text
/// %BLOCK SYMMETRY_OPS
/// # Symm. op. 2  6_3
///   0.5000000000  0.8660254038  0.0000000000
///  -0.8660254038  0.5000000000  0.0000000000
///   0.0000000000  0.0000000000  1.0000000000
///   0.0000000000  0.0000000000  0.5000000000
/// %ENDBLOCK SYMMETRY_OPS
/// ```
///
/// Each operator is three rows of a Cartesian rotation, stored transposed,
/// followed by a fractional translation. The rotation is converted to the
/// basis of the current lattice, which must already have been read.
fn read_symmetry_ops<R: BufRead>(
    lines: &mut LineReader<R>,
    asc: &mut AtomSetCollection,
) -> Result<(), ParseError> {
    let lattice = asc.current().and_then(|s| s.lattice.clone());
    let mut rows = [Vec3::zeros(); 4];
    let mut n = 0;
    while next_significant(lines)? && !is_end_block(lines) {
        if field_count(lines) < 3 {
            warn!("error reading symmetry operator row: {}", lines.line());
            continue;
        }
        rows[n] = calc_fields(lines, 0)?;
        n += 1;
        if n < 4 {
            continue;
        }
        n = 0;
        let rot = Mat3::from_columns(&rows[..3]);
        let Some(rot) = lattice.as_ref().and_then(|l| l.to_lattice_basis(&rot))
        else {
            warn!("skipping symmetry operator without a unit cell");
            continue;
        };
        let mut op = Mat4::identity();
        op.fixed_view_mut::<3, 3>(0, 0).copy_from(&rot);
        op.fixed_view_mut::<3, 1>(0, 3).copy_from(&rows[3]);
        asc.add_symmetry_op(op);
    }
    if n > 0 {
        warn!("incomplete symmetry operator with {n} rows");
    }
    Ok(())
}
