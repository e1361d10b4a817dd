//src/model/mod.rs
pub mod defect;
pub mod structure;

// Re-exports for cleaner imports
pub use defect::{Defect, DefectShell, Interstitial, Neighbor, Substitution, Vacancy};
pub use structure::{Structure, StructureError};
