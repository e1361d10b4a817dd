// src/lib.rs
//
// Point defect identification: compares a defect structure with its perfect
// reference, classifies vacancies, substitutions and interstitials, and finds
// the nearest-neighbor shell of each defect.

pub mod config;
pub mod io;
pub mod model;
pub mod physics;
pub mod utils;

pub use config::{Config, DefectConfig, DEFAULT_TOLERANCE};
pub use model::{Defect, DefectShell, Interstitial, Neighbor, Structure, Substitution, Vacancy};
pub use physics::analysis::{analyze, DefectAnalysis};
