// src/io/poscar.rs

use crate::model::Structure;
use crate::utils::linalg::{cart_to_frac, cell_volume};
use std::fs;
use std::io;

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn parse_floats(line: &str, n: usize, what: &str) -> io::Result<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(n)
        .map(|t| t.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid(format!("Invalid {}: '{}'", what, line.trim())))?;
    if values.len() < n {
        return Err(invalid(format!("Invalid {}: '{}'", what, line.trim())));
    }
    Ok(values)
}

/// "Si_pv/a3b1c2" -> "Si" (VASP 6 writes POTCAR labels and hashes).
fn clean_symbol(token: &str) -> String {
    token
        .split(['/', '_'])
        .next()
        .unwrap_or(token)
        .to_string()
}

pub fn parse(path: &str) -> io::Result<Structure> {
    let text = fs::read_to_string(path)?;
    parse_str(&text)
}

/// Parses POSCAR/CONTCAR text into a structure in fractional coordinates.
pub fn parse_str(text: &str) -> io::Result<Structure> {
    let mut lines = text.lines();
    let mut next = |what: &str| {
        lines
            .next()
            .ok_or_else(|| invalid(format!("Unexpected EOF: missing {}", what)))
    };

    let comment = next("comment")?;

    // Scale: one factor, three per-axis factors, or a negative target volume
    // (trailing comments like "1.0 ! scale" fall back to the first token)
    let scale_line = next("scale")?;
    let scales = match parse_floats(scale_line, 3, "scale") {
        Ok(v) => v,
        Err(_) => parse_floats(scale_line, 1, "scale")?,
    };

    // Lattice
    let mut lattice = [[0.0; 3]; 3];
    for row in lattice.iter_mut() {
        let v = parse_floats(next("lattice")?, 3, "lattice line")?;
        row.copy_from_slice(&v);
    }

    // Per-axis factors applied to every cartesian component (lattice and positions)
    let axis_scale: [f64; 3] = if scales.len() == 3 {
        [scales[0], scales[1], scales[2]]
    } else if scales[0] < 0.0 {
        let vol = cell_volume(lattice);
        if vol == 0.0 {
            return Err(invalid("Singular lattice"));
        }
        [(-scales[0] / vol).cbrt(); 3]
    } else {
        [scales[0]; 3]
    };
    for row in lattice.iter_mut() {
        for (x, s) in row.iter_mut().zip(axis_scale) {
            *x *= s;
        }
    }

    // Elements & Counts
    let line6 = next("counts")?;
    let starts_alpha = line6
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic());
    let (names, counts_line): (Option<Vec<String>>, &str) = if starts_alpha {
        (
            Some(line6.split_whitespace().map(clean_symbol).collect()),
            next("counts")?,
        )
    } else {
        (None, line6)
    };

    let counts: Vec<usize> = counts_line
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid(format!("Invalid counts: '{}'", counts_line.trim())))?;
    if counts.is_empty() {
        return Err(invalid("Missing atom counts"));
    }

    // VASP 4 files carry no species line; try the comment line, else "X"
    let names = names.unwrap_or_else(|| {
        let from_comment: Vec<String> = comment.split_whitespace().map(clean_symbol).collect();
        if from_comment.len() == counts.len()
            && from_comment
                .iter()
                .all(|s| !s.is_empty() && s.chars().all(char::is_alphabetic))
        {
            from_comment
        } else {
            vec!["X".to_string(); counts.len()]
        }
    });
    if names.len() != counts.len() {
        return Err(invalid(format!(
            "{} species names but {} counts",
            names.len(),
            counts.len()
        )));
    }

    // Mode (optionally preceded by "Selective dynamics")
    let mut mode_line = next("coordinate mode")?;
    if mode_line.trim_start().starts_with(['s', 'S']) {
        mode_line = next("coordinate mode")?;
    }
    let is_direct = match mode_line.trim_start().chars().next() {
        Some('d' | 'D') => true,
        Some('c' | 'C' | 'k' | 'K') => false,
        _ => return Err(invalid(format!("Unknown coordinate mode: '{}'", mode_line.trim()))),
    };

    // Atoms
    let total: usize = counts.iter().sum();
    let mut positions = Vec::with_capacity(total);
    let mut species = Vec::with_capacity(total);

    for (name, &count) in names.iter().zip(&counts) {
        for _ in 0..count {
            let v = parse_floats(next("atom position")?, 3, "atom position")?;
            let p = [v[0], v[1], v[2]];
            let frac = if is_direct {
                p
            } else {
                let cart = [
                    p[0] * axis_scale[0],
                    p[1] * axis_scale[1],
                    p[2] * axis_scale[2],
                ];
                cart_to_frac(cart, lattice).ok_or_else(|| invalid("Singular lattice"))?
            };
            positions.push(frac);
            species.push(name.clone());
        }
    }

    Structure::new(lattice, positions, species).map_err(|e| invalid(e.to_string()))
}
