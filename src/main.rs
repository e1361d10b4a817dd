// src/main.rs

use clap::{Parser, ValueEnum};
use cdefect::config::{Config, ReportFormat, SelfExclusion, SiteMatch};
use cdefect::utils::linalg::BoundaryMode;
use cdefect::utils::{logger, report};
use cdefect::{analyze, io};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "cdefect",
    about = "Identify point defects against a perfect cell and report their nearest-neighbor shells.",
    version
)]
struct Cli {
    /// Defect structure (POSCAR, CONTCAR or .json). Defaults to the settings file.
    #[arg(value_name = "DEFECT")]
    defect: Option<String>,
    /// Perfect reference structure.
    #[arg(value_name = "PERFECT")]
    perfect: Option<String>,
    /// Matching tolerance in Angstrom, also the tie band of a neighbor shell.
    #[arg(short, long)]
    tolerance: Option<f64>,
    /// Minimum image distances with tolerance-based self exclusion.
    #[arg(long, conflicts_with_all = ["boundary", "self_exclusion"])]
    periodic: bool,
    #[arg(long, value_enum)]
    boundary: Option<Boundary>,
    #[arg(long, value_enum)]
    self_exclusion: Option<Exclusion>,
    #[arg(long, value_enum)]
    site_match: Option<Matching>,
    /// Run on a single thread.
    #[arg(long)]
    sequential: bool,
    /// Write neighbor_atoms.json instead of neighbor_atoms.dat.
    #[arg(long)]
    json: bool,
    /// Directory the report tree is written under.
    #[arg(long, value_name = "DIR")]
    report_root: Option<String>,
    /// Store the effective settings as the new defaults.
    #[arg(long)]
    save_config: bool,
    /// off, error, warn, info, debug or trace.
    #[arg(long, env = "CDEFECT_LOG", default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse().map_err(|_| format!("unknown log level '{}'", s))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Boundary {
    Open,
    MinimumImage,
}

impl From<Boundary> for BoundaryMode {
    fn from(b: Boundary) -> Self {
        match b {
            Boundary::Open => BoundaryMode::Open,
            Boundary::MinimumImage => BoundaryMode::MinimumImage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Exclusion {
    Exact,
    Tolerance,
}

impl From<Exclusion> for SelfExclusion {
    fn from(e: Exclusion) -> Self {
        match e {
            Exclusion::Exact => SelfExclusion::Exact,
            Exclusion::Tolerance => SelfExclusion::Tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Matching {
    First,
    Closest,
}

impl From<Matching> for SiteMatch {
    fn from(m: Matching) -> Self {
        match m {
            Matching::First => SiteMatch::First,
            Matching::Closest => SiteMatch::Closest,
        }
    }
}

impl Cli {
    /// Command-line values win over the settings file.
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.defect {
            config.defect_path = path.clone();
        }
        if let Some(path) = &self.perfect {
            config.perfect_path = path.clone();
        }
        if let Some(root) = &self.report_root {
            config.report_root = root.clone();
        }

        let d = &mut config.defect;
        if self.periodic {
            d.boundary = BoundaryMode::MinimumImage;
            d.self_exclusion = SelfExclusion::Tolerance;
        }
        if let Some(t) = self.tolerance {
            d.tolerance = t;
        }
        if let Some(b) = self.boundary {
            d.boundary = b.into();
        }
        if let Some(e) = self.self_exclusion {
            d.self_exclusion = e.into();
        }
        if let Some(m) = self.site_match {
            d.site_match = m.into();
        }
        if self.sequential {
            d.parallel = false;
        }
        if self.json {
            config.report_format = ReportFormat::Json;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = logger::init(cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, msg) = Config::load();
    log::debug!("{}", msg);
    cli.apply(&mut config);

    if cli.save_config {
        config.defect.validate()?;
        log::info!("{}", config.save());
    }

    let defect = io::load_structure(&config.defect_path)
        .map_err(|e| format!("Cannot read {}: {}", config.defect_path, e))?;
    let perfect = io::load_structure(&config.perfect_path)
        .map_err(|e| format!("Cannot read {}: {}", config.perfect_path, e))?;
    log::info!(
        "Comparing {} ({}) against {} ({})",
        config.defect_path,
        defect.formula(),
        config.perfect_path,
        perfect.formula()
    );

    let analysis = analyze(&perfect, &defect, &config.defect)?;

    let folder_name = std::env::current_dir()?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());

    let (text, file_name) = match config.report_format {
        ReportFormat::Text => (report::defect_report(&analysis, &folder_name), "neighbor_atoms.dat"),
        ReportFormat::Json => (report::json_report(&analysis)?, "neighbor_atoms.json"),
    };

    print!("{}", text);
    println!("\n{}", report::summary(&analysis));

    let dir = PathBuf::from(&config.report_root).join(&folder_name).join("Data");
    let path = io::save_report(&dir, file_name, &text)?;
    log::info!("Defect information was saved in {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_keeps_settings() {
        let cli = Cli::try_parse_from(["cdefect"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "cdefect",
            "CONTCAR",
            "ref/POSCAR",
            "--tolerance",
            "0.01",
            "--periodic",
            "--site-match",
            "closest",
            "--sequential",
            "--json",
            "--save-config",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.defect_path, "CONTCAR");
        assert_eq!(config.perfect_path, "ref/POSCAR");
        assert_eq!(config.defect.tolerance, 0.01);
        assert_eq!(config.defect.boundary, BoundaryMode::MinimumImage);
        assert_eq!(config.defect.self_exclusion, SelfExclusion::Tolerance);
        assert_eq!(config.defect.site_match, SiteMatch::Closest);
        assert!(!config.defect.parallel);
        assert_eq!(config.report_format, ReportFormat::Json);
        assert_eq!(cli.log_level, LevelFilter::Debug);
        assert!(cli.save_config);
    }

    #[test]
    fn test_boundary_flag() {
        let cli = Cli::try_parse_from(["cdefect", "--boundary", "minimum-image"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.defect.boundary, BoundaryMode::MinimumImage);
        assert_eq!(config.defect.self_exclusion, SelfExclusion::Exact);
    }

    #[test]
    fn test_help_and_bad_flags() {
        let err = Cli::try_parse_from(["cdefect", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

        assert!(Cli::try_parse_from(["cdefect", "--periodic", "--boundary", "open"]).is_err());
        assert!(Cli::try_parse_from(["cdefect", "--tolerance", "abc"]).is_err());
        assert!(Cli::try_parse_from(["cdefect", "--log-level", "loud"]).is_err());
    }
}
