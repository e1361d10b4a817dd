// src/physics/analysis/mod.rs

pub mod defects;
pub mod neighbors;

pub use defects::{find_interstitials, find_substitutions, find_vacancies};
pub use neighbors::{closest_atoms, nearest_shell, substitution_shell};

use crate::config::{ConfigError, DefectConfig};
use crate::model::{Defect, DefectShell, Interstitial, Structure, Substitution, Vacancy};
use crate::utils::linalg::lattices_match;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    Config(ConfigError),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnalysisError::Config(e) => write!(f, "Invalid analysis settings: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AnalysisError {
    fn from(e: ConfigError) -> Self {
        AnalysisError::Config(e)
    }
}

/// Everything found when comparing a defect structure with its reference.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DefectAnalysis {
    pub vacancies: Vec<Vacancy>,
    pub substitutions: Vec<Substitution>,
    pub interstitials: Vec<Interstitial>,
    /// One entry per defect: vacancies, then substitutions, then interstitials.
    pub shells: Vec<DefectShell>,
}

impl DefectAnalysis {
    pub fn is_pristine(&self) -> bool {
        self.defect_count() == 0
    }

    pub fn defect_count(&self) -> usize {
        self.vacancies.len() + self.substitutions.len() + self.interstitials.len()
    }
}

/// Classify the defects of `defect` against `perfect` and attach the
/// nearest-neighbor shell of each one.
///
/// Distances are measured with the lattice of `defect`; both structures are
/// expected to share the same cell.
pub fn analyze(
    perfect: &Structure,
    defect: &Structure,
    config: &DefectConfig,
) -> Result<DefectAnalysis, AnalysisError> {
    config.validate()?;

    if !lattices_match(perfect.lattice(), defect.lattice(), config.tolerance) {
        log::warn!("Perfect and defect lattices differ; using the defect lattice for all distances");
    }

    let (vacancies, (substitutions, interstitials)) = if config.parallel {
        rayon::join(
            || find_vacancies(perfect, defect, config),
            || {
                rayon::join(
                    || find_substitutions(perfect, defect, config),
                    || find_interstitials(perfect, defect, config),
                )
            },
        )
    } else {
        (
            find_vacancies(perfect, defect, config),
            (
                find_substitutions(perfect, defect, config),
                find_interstitials(perfect, defect, config),
            ),
        )
    };

    let classified: Vec<Defect> = vacancies
        .iter()
        .cloned()
        .map(Defect::from)
        .chain(substitutions.iter().cloned().map(Defect::from))
        .chain(interstitials.iter().cloned().map(Defect::from))
        .collect();

    let shell_of = |d: Defect| {
        let neighbors = match &d {
            Defect::Substitution(s) => substitution_shell(s, &vacancies, defect, config),
            other => closest_atoms(other.position(), defect, config),
        };
        DefectShell {
            defect: d,
            neighbors,
        }
    };

    let shells: Vec<DefectShell> = if config.parallel {
        classified.into_par_iter().map(shell_of).collect()
    } else {
        classified.into_iter().map(shell_of).collect()
    };

    log::info!(
        "Found {} vacancies, {} substitutions, {} interstitials",
        vacancies.len(),
        substitutions.len(),
        interstitials.len()
    );

    Ok(DefectAnalysis {
        vacancies,
        substitutions,
        interstitials,
        shells,
    })
}
