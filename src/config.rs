// src/config.rs

use crate::utils::linalg::BoundaryMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

/// Matching threshold in Angstrom, used for site matching and neighbor ties.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

// --- Enums ---

/// How the neighbor search decides that a candidate is the target itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfExclusion {
  /// Skip atoms whose fractional coordinates equal the target bit for bit.
  #[default]
  Exact,
  /// Skip atoms closer than the tolerance.
  Tolerance,
}

/// Which perfect-structure atom a defect-structure atom is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteMatch {
  /// First atom in index order within the tolerance.
  #[default]
  First,
  /// Closest atom within the tolerance.
  Closest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
  Text,
  Json,
}

// --- Errors ---

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
  InvalidTolerance(f64),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ConfigError::InvalidTolerance(t) => {
        write!(f, "Tolerance must be finite and positive, got {}", t)
      }
    }
  }
}

impl std::error::Error for ConfigError {}

// --- Engine settings ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefectConfig {
  /// Cartesian distance (Angstrom) below which two sites are the same site,
  /// and the width of the nearest-neighbor tie band.
  pub tolerance: f64,
  pub boundary: BoundaryMode,
  pub self_exclusion: SelfExclusion,
  pub site_match: SiteMatch,
  /// Run scans and neighbor queries on the rayon pool. Output order is
  /// the same either way.
  pub parallel: bool,
}

impl Default for DefectConfig {
  fn default() -> Self {
    Self {
      tolerance: DEFAULT_TOLERANCE,
      boundary: BoundaryMode::Open,
      self_exclusion: SelfExclusion::Exact,
      site_match: SiteMatch::First,
      parallel: true,
    }
  }
}

impl DefectConfig {
  pub fn with_tolerance(tolerance: f64) -> Self {
    Self {
      tolerance,
      ..Default::default()
    }
  }

  /// Periodic variant: minimum image distances and tolerance-based self exclusion.
  pub fn periodic() -> Self {
    Self {
      boundary: BoundaryMode::MinimumImage,
      self_exclusion: SelfExclusion::Tolerance,
      ..Default::default()
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
      return Err(ConfigError::InvalidTolerance(self.tolerance));
    }
    Ok(())
  }
}

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
  #[serde(default)]
  pub defect: DefectConfig,

  #[serde(default = "default_defect_path")]
  pub defect_path: String,

  #[serde(default = "default_perfect_path")]
  pub perfect_path: String,

  /// Reports land in `<report_root>/<working dir name>/Data`.
  #[serde(default = "default_report_root")]
  pub report_root: String,

  #[serde(default = "default_report_format")]
  pub report_format: ReportFormat,
}

fn default_defect_path() -> String {
  "POSCAR".to_string()
}

fn default_perfect_path() -> String {
  "../perfect/POSCAR".to_string()
}

fn default_report_root() -> String {
  "localized-defects".to_string()
}

fn default_report_format() -> ReportFormat {
  ReportFormat::Text
}

impl Default for Config {
  fn default() -> Self {
    Self {
      defect: DefectConfig::default(),
      defect_path: default_defect_path(),
      perfect_path: default_perfect_path(),
      report_root: default_report_root(),
      report_format: default_report_format(),
    }
  }
}

impl Config {
  /// Loads config from standard OS location (e.g., ~/.config/cdefect/settings.json)
  pub fn load() -> (Self, String) {
    Self::load_from(&Self::get_path())
  }

  pub fn load_from(path: &PathBuf) -> (Self, String) {
    if path.exists() {
      match File::open(path) {
        Ok(file) => {
          let reader = BufReader::new(file);
          match serde_json::from_reader(reader) {
            Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
            Err(e) => (Self::default(), format!("Error parsing config: {}", e)),
          }
        }
        Err(e) => (Self::default(), format!("Error opening config: {}", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> String {
    self.save_to(&Self::get_path())
  }

  pub fn save_to(&self, path: &PathBuf) -> String {
    if let Some(parent) = path.parent() {
      let _ = fs::create_dir_all(parent);
    }

    match File::create(path) {
      Ok(file) => {
        let writer = BufWriter::new(file);
        match serde_json::to_writer_pretty(writer, self) {
          Ok(_) => format!("Config saved to {:?}", path),
          Err(e) => format!("Failed to save config: {}", e),
        }
      }
      Err(e) => format!("Could not create config file: {}", e),
    }
  }

  pub fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "mavensgroup", "cdefect") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}
