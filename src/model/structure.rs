// src/model/structure.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Errors ---

/// Raised when a structure is built from inconsistent data.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureError {
    /// `positions` and `species` must be index-aligned.
    ShapeMismatch { positions: usize, species: usize },
    /// Lattice must be exactly 3 rows of 3 components.
    LatticeShape { rows: usize, row_len: usize },
    /// A fractional coordinate that is not a triple.
    PositionShape { index: usize, len: usize },
    /// NaN or infinite component in the coordinate of atom `index` (0-based).
    NonFinite { index: usize },
    NonFiniteLattice,
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StructureError::ShapeMismatch { positions, species } => write!(
                f,
                "Structure has {} positions but {} species",
                positions, species
            ),
            StructureError::LatticeShape { rows, row_len } => write!(
                f,
                "Lattice must be 3x3, got {} rows (offending row length {})",
                rows, row_len
            ),
            StructureError::PositionShape { index, len } => write!(
                f,
                "Position of atom {} has {} components, expected 3",
                index + 1,
                len
            ),
            StructureError::NonFinite { index } => {
                write!(f, "Position of atom {} is not finite", index + 1)
            }
            StructureError::NonFiniteLattice => write!(f, "Lattice contains non-finite values"),
        }
    }
}

impl std::error::Error for StructureError {}

// --- Structure ---

/// A periodic structure in fractional coordinates.
///
/// Lattice rows are the basis vectors a, b, c (Angstrom). Atom order defines
/// the 1-based index used in every report. The fields are only reachable
/// through accessors: once built, a structure is never modified in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStructure")]
pub struct Structure {
    lattice: [[f64; 3]; 3],
    positions: Vec<[f64; 3]>,
    species: Vec<String>,
}

/// Unchecked wire form, used when deserializing from JSON.
#[derive(Deserialize)]
struct RawStructure {
    lattice: Vec<Vec<f64>>,
    positions: Vec<Vec<f64>>,
    species: Vec<String>,
}

impl TryFrom<RawStructure> for Structure {
    type Error = StructureError;

    fn try_from(raw: RawStructure) -> Result<Self, Self::Error> {
        Structure::from_rows(raw.lattice, raw.positions, raw.species)
    }
}

impl Structure {
    pub fn new(
        lattice: [[f64; 3]; 3],
        positions: Vec<[f64; 3]>,
        species: Vec<String>,
    ) -> Result<Self, StructureError> {
        if positions.len() != species.len() {
            return Err(StructureError::ShapeMismatch {
                positions: positions.len(),
                species: species.len(),
            });
        }
        if lattice.iter().flatten().any(|x| !x.is_finite()) {
            return Err(StructureError::NonFiniteLattice);
        }
        if let Some(index) = positions
            .iter()
            .position(|p| p.iter().any(|x| !x.is_finite()))
        {
            return Err(StructureError::NonFinite { index });
        }

        Ok(Self {
            lattice,
            positions,
            species,
        })
    }

    /// Builds a structure from dynamically sized rows, checking every shape.
    pub fn from_rows(
        lattice: Vec<Vec<f64>>,
        positions: Vec<Vec<f64>>,
        species: Vec<String>,
    ) -> Result<Self, StructureError> {
        if lattice.len() != 3 || lattice.iter().any(|row| row.len() != 3) {
            let row_len = lattice
                .iter()
                .map(Vec::len)
                .find(|&n| n != 3)
                .unwrap_or(3);
            return Err(StructureError::LatticeShape {
                rows: lattice.len(),
                row_len,
            });
        }

        let mut lat = [[0.0; 3]; 3];
        for (i, row) in lattice.iter().enumerate() {
            lat[i].copy_from_slice(row);
        }

        let mut frac = Vec::with_capacity(positions.len());
        for (index, p) in positions.iter().enumerate() {
            if p.len() != 3 {
                return Err(StructureError::PositionShape {
                    index,
                    len: p.len(),
                });
            }
            frac.push([p[0], p[1], p[2]]);
        }

        Self::new(lat, frac, species)
    }

    pub fn lattice(&self) -> [[f64; 3]; 3] {
        self.lattice
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates `(0-based index, species, fractional position)` in atom order.
    pub fn atoms(&self) -> impl Iterator<Item = (usize, &str, [f64; 3])> + '_ {
        self.species
            .iter()
            .zip(&self.positions)
            .enumerate()
            .map(|(i, (sp, pos))| (i, sp.as_str(), *pos))
    }

    /// Chemical formula in insertion order of species, e.g. "Si7C1".
    pub fn formula(&self) -> String {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for sp in &self.species {
            match counts.iter_mut().find(|(el, _)| *el == sp.as_str()) {
                Some((_, n)) => *n += 1,
                None => counts.push((sp.as_str(), 1)),
            }
        }
        counts
            .iter()
            .map(|(el, n)| format!("{}{}", el, n))
            .collect()
    }

    // --- Derived structures (the original is left untouched) ---

    /// Copy of this structure with the atom at 0-based `index` removed.
    pub fn without_atom(&self, index: usize) -> Self {
        let mut out = self.clone();
        if index < out.len() {
            out.positions.remove(index);
            out.species.remove(index);
        }
        out
    }

    /// Copy of this structure with the species of atom `index` replaced.
    pub fn with_species(&self, index: usize, species: &str) -> Self {
        let mut out = self.clone();
        if let Some(sp) = out.species.get_mut(index) {
            *sp = species.to_string();
        }
        out
    }

    /// Copy of this structure with an extra atom appended.
    pub fn with_atom(&self, species: &str, position: [f64; 3]) -> Result<Self, StructureError> {
        let mut positions = self.positions.clone();
        let mut all_species = self.species.clone();
        positions.push(position);
        all_species.push(species.to_string());
        Self::new(self.lattice, positions, all_species)
    }
}
