// src/model/defect.rs
//
// Value records produced by the defect analysis. Indices are 1-based and
// refer to atom order in the structure named by the field.

use serde::Serialize;

/// Atom of the perfect structure with no counterpart in the defect structure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Vacancy {
    pub species: String,
    pub position: [f64; 3],
    pub perfect_index: usize,
}

/// Site present in both structures but occupied by a different species.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Substitution {
    pub new_species: String,
    pub old_species: String,
    /// Position of the atom in the defect structure.
    pub position: [f64; 3],
    pub defect_index: usize,
    pub perfect_index: usize,
}

/// Atom of the defect structure with no counterpart in the perfect structure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interstitial {
    pub species: String,
    pub position: [f64; 3],
    pub defect_index: usize,
}

/// One member of a neighbor shell.
///
/// `index` is a defect-structure index, except for a vacancy spliced into a
/// substitution shell, which keeps its perfect-structure index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Neighbor {
    pub distance: f64,
    pub species: String,
    pub position: [f64; 3],
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Defect {
    Vacancy(Vacancy),
    Substitution(Substitution),
    Interstitial(Interstitial),
}

impl Defect {
    pub fn position(&self) -> [f64; 3] {
        match self {
            Defect::Vacancy(v) => v.position,
            Defect::Substitution(s) => s.position,
            Defect::Interstitial(i) => i.position,
        }
    }

    /// Kroger-Vink style label: `V_Si`, `C_Si`, `Si_i`.
    pub fn label(&self) -> String {
        match self {
            Defect::Vacancy(v) => format!("V_{}", v.species),
            Defect::Substitution(s) => format!("{}_{}", s.new_species, s.old_species),
            Defect::Interstitial(i) => format!("{}_i", i.species),
        }
    }
}

impl From<Vacancy> for Defect {
    fn from(v: Vacancy) -> Self {
        Defect::Vacancy(v)
    }
}

impl From<Substitution> for Defect {
    fn from(s: Substitution) -> Self {
        Defect::Substitution(s)
    }
}

impl From<Interstitial> for Defect {
    fn from(i: Interstitial) -> Self {
        Defect::Interstitial(i)
    }
}

/// A classified defect together with its nearest neighbor shell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DefectShell {
    pub defect: Defect,
    pub neighbors: Vec<Neighbor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let v: Defect = Vacancy {
            species: "Si".into(),
            position: [0.0; 3],
            perfect_index: 1,
        }
        .into();
        let s: Defect = Substitution {
            new_species: "C".into(),
            old_species: "Si".into(),
            position: [0.5; 3],
            defect_index: 2,
            perfect_index: 3,
        }
        .into();
        let i: Defect = Interstitial {
            species: "Li".into(),
            position: [0.25; 3],
            defect_index: 9,
        }
        .into();

        assert_eq!(v.label(), "V_Si");
        assert_eq!(s.label(), "C_Si");
        assert_eq!(i.label(), "Li_i");
        assert_eq!(i.position(), [0.25; 3]);
    }
}
