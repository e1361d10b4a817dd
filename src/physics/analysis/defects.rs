// src/physics/analysis/defects.rs

use crate::config::{DefectConfig, SiteMatch};
use crate::model::{Interstitial, Structure, Substitution, Vacancy};
use crate::utils::linalg::cartesian_distance;
use rayon::prelude::*;

/// Runs `f` over `0..n` and keeps the hits, in index order.
///
/// The parallel path relies on rayon's order-preserving `collect`, so both
/// paths return identical vectors.
fn scan<T, F>(n: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> Option<T> + Sync + Send,
{
    if parallel {
        (0..n).into_par_iter().filter_map(f).collect()
    } else {
        (0..n).filter_map(f).collect()
    }
}

/// True if any atom of `others` lies within the tolerance of `pos`.
///
/// Stops at the first hit: this only answers "found or not".
fn has_site(pos: [f64; 3], others: &Structure, lattice: [[f64; 3]; 3], config: &DefectConfig) -> bool {
    others
        .positions()
        .iter()
        .any(|&q| cartesian_distance(pos, q, lattice, config.boundary) < config.tolerance)
}

/// 0-based index of the perfect-structure atom paired with `pos`.
fn match_site(
    pos: [f64; 3],
    perfect: &Structure,
    lattice: [[f64; 3]; 3],
    config: &DefectConfig,
) -> Option<usize> {
    let within = |q: [f64; 3]| {
        let d = cartesian_distance(pos, q, lattice, config.boundary);
        (d < config.tolerance).then_some(d)
    };

    let found = match config.site_match {
        SiteMatch::First => perfect.positions().iter().position(|&q| within(q).is_some()),
        SiteMatch::Closest => perfect
            .positions()
            .iter()
            .enumerate()
            .filter_map(|(j, &q)| within(q).map(|d| (j, d)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(j, _)| j),
    };

    // Diagnostic only: a tight tolerance should never admit two sites.
    if found.is_some() && log::log_enabled!(log::Level::Warn) {
        let hits = perfect
            .positions()
            .iter()
            .filter(|&&q| within(q).is_some())
            .count();
        if hits > 1 {
            log::warn!(
                "{} reference sites within {} A of {:?}; paired with site {}",
                hits,
                config.tolerance,
                pos,
                found.map_or(0, |j| j + 1)
            );
        }
    }

    found
}

/// Atoms of `perfect` with no atom of `defect` within the tolerance.
pub fn find_vacancies(perfect: &Structure, defect: &Structure, config: &DefectConfig) -> Vec<Vacancy> {
    let lattice = defect.lattice();

    let found = scan(perfect.len(), config.parallel, |i| {
        let pos = perfect.positions()[i];
        if has_site(pos, defect, lattice, config) {
            return None;
        }
        Some(Vacancy {
            species: perfect.species()[i].clone(),
            position: pos,
            perfect_index: i + 1,
        })
    });

    log::debug!("Vacancy scan: {} of {} reference sites empty", found.len(), perfect.len());
    found
}

/// Atoms of `defect` sitting on a reference site that holds another species.
///
/// Each defect atom is paired with at most one reference site (see
/// [`SiteMatch`]); once paired, the scan for that atom ends whether or not
/// the species differ.
pub fn find_substitutions(
    perfect: &Structure,
    defect: &Structure,
    config: &DefectConfig,
) -> Vec<Substitution> {
    let lattice = defect.lattice();

    let found = scan(defect.len(), config.parallel, |i| {
        let pos = defect.positions()[i];
        let j = match_site(pos, perfect, lattice, config)?;

        let new_species = &defect.species()[i];
        let old_species = &perfect.species()[j];
        if new_species == old_species {
            return None;
        }
        Some(Substitution {
            new_species: new_species.clone(),
            old_species: old_species.clone(),
            position: pos,
            defect_index: i + 1,
            perfect_index: j + 1,
        })
    });

    log::debug!("Substitution scan: {} of {} atoms", found.len(), defect.len());
    found
}

/// Atoms of `defect` with no reference site within the tolerance.
pub fn find_interstitials(
    perfect: &Structure,
    defect: &Structure,
    config: &DefectConfig,
) -> Vec<Interstitial> {
    let lattice = defect.lattice();

    let found = scan(defect.len(), config.parallel, |i| {
        let pos = defect.positions()[i];
        if has_site(pos, perfect, lattice, config) {
            return None;
        }
        Some(Interstitial {
            species: defect.species()[i].clone(),
            position: pos,
            defect_index: i + 1,
        })
    });

    log::debug!("Interstitial scan: {} of {} atoms unmatched", found.len(), defect.len());
    found
}
