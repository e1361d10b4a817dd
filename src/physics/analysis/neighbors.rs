// src/physics/analysis/neighbors.rs

use crate::config::{DefectConfig, SelfExclusion};
use crate::model::{Neighbor, Structure, Substitution, Vacancy};
use crate::utils::linalg::cartesian_distance;

/// Sorts ascending and keeps only the entries tied with the nearest one.
///
/// An entry belongs to the shell when its distance exceeds the minimum by no
/// more than `tolerance`. Second and farther shells are dropped. The sort is
/// stable, so ties keep their input (atom index) order.
pub fn nearest_shell(mut entries: Vec<Neighbor>, tolerance: f64) -> Vec<Neighbor> {
    entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let Some(d0) = entries.first().map(|n| n.distance) else {
        return entries;
    };
    entries.retain(|n| n.distance - d0 <= tolerance);
    entries
}

/// Nearest-neighbor shell of `target` among the atoms of `structure`.
///
/// The atom sitting on `target` itself is skipped; with
/// [`SelfExclusion::Exact`] that means an exact component-wise match of the
/// fractional coordinates, with [`SelfExclusion::Tolerance`] anything closer
/// than the tolerance. Indices in the result are 1-based indices into
/// `structure`.
pub fn closest_atoms(target: [f64; 3], structure: &Structure, config: &DefectConfig) -> Vec<Neighbor> {
    let lattice = structure.lattice();

    let candidates: Vec<Neighbor> = structure
        .atoms()
        .filter(|&(_, _, pos)| match config.self_exclusion {
            SelfExclusion::Exact => pos != target,
            SelfExclusion::Tolerance => true,
        })
        .map(|(i, sp, pos)| Neighbor {
            distance: cartesian_distance(target, pos, lattice, config.boundary),
            species: sp.to_string(),
            position: pos,
            index: i + 1,
        })
        .filter(|n| match config.self_exclusion {
            SelfExclusion::Exact => true,
            SelfExclusion::Tolerance => n.distance >= config.tolerance,
        })
        .collect();

    nearest_shell(candidates, config.tolerance)
}

/// Neighbor shell of a substitution site.
///
/// A vacancy lying on the substitution site has no atom in the defect
/// structure, so [`closest_atoms`] cannot see it. Such vacancies are added to
/// the candidates (keeping their perfect-structure index) and the shell is
/// recomputed from the combined list.
///
/// Under [`analyze`](super::analyze) the splice never fires: a vacancy that
/// close to a substituted atom would have been matched by that atom instead.
/// It only matters for hand-built defect lists.
pub fn substitution_shell(
    substitution: &Substitution,
    vacancies: &[Vacancy],
    defect: &Structure,
    config: &DefectConfig,
) -> Vec<Neighbor> {
    let lattice = defect.lattice();
    let site = substitution.position;

    let mut candidates = closest_atoms(site, defect, config);
    for vac in vacancies {
        let d = cartesian_distance(site, vac.position, lattice, config.boundary);
        if d < config.tolerance {
            log::debug!(
                "Vacancy V_{} (#{}) coincides with substitution {}_{}",
                vac.species,
                vac.perfect_index,
                substitution.new_species,
                substitution.old_species
            );
            candidates.push(Neighbor {
                distance: d,
                species: vac.species.clone(),
                position: vac.position,
                index: vac.perfect_index,
            });
        }
    }

    nearest_shell(candidates, config.tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBIC_10: [[f64; 3]; 3] = [[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]];

    fn structure(atoms: &[(&str, [f64; 3])]) -> Structure {
        Structure::new(
            CUBIC_10,
            atoms.iter().map(|a| a.1).collect(),
            atoms.iter().map(|a| a.0.to_string()).collect(),
        )
        .unwrap()
    }

    fn sequential() -> DefectConfig {
        DefectConfig {
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_tie_band_keeps_only_first_shell() {
        // Distances 2.0, 1.0005 and 1.0 from the origin.
        let s = structure(&[
            ("O", [0.0, 0.0, 0.2]),
            ("N", [0.0, 0.10005, 0.0]),
            ("C", [0.1, 0.0, 0.0]),
        ]);

        let shell = closest_atoms([0.0; 3], &s, &sequential());

        assert_eq!(shell.len(), 2);
        assert_eq!(shell[0].species, "C");
        assert_eq!(shell[0].index, 3);
        assert!((shell[0].distance - 1.0).abs() < 1e-10);
        assert_eq!(shell[1].species, "N");
        assert_eq!(shell[1].index, 2);
        assert!((shell[1].distance - 1.0005).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_neighbors_all_returned() {
        // Vacancy at the cube center, six face-centered neighbors.
        let s = structure(&[
            ("Ti", [0.25, 0.5, 0.5]),
            ("Ti", [0.75, 0.5, 0.5]),
            ("Ti", [0.5, 0.25, 0.5]),
            ("Ti", [0.5, 0.75, 0.5]),
            ("Ti", [0.5, 0.5, 0.25]),
            ("Ti", [0.5, 0.5, 0.75]),
            ("O", [0.0, 0.0, 0.0]),
        ]);

        let shell = closest_atoms([0.5; 3], &s, &sequential());
        assert_eq!(shell.len(), 6);
        assert!(shell.iter().all(|n| n.distance == 2.5));
        // Ties keep atom order.
        let idx: Vec<usize> = shell.iter().map(|n| n.index).collect();
        assert_eq!(idx, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_target_atom_is_excluded() {
        let s = structure(&[("Si", [0.0, 0.0, 0.0]), ("Si", [0.5, 0.5, 0.5])]);
        let shell = closest_atoms([0.5; 3], &s, &sequential());
        assert_eq!(shell.len(), 1);
        assert_eq!(shell[0].index, 1);
    }

    #[test]
    fn test_sole_atom_has_empty_shell() {
        let s = structure(&[("Si", [0.5, 0.5, 0.5])]);
        assert!(closest_atoms([0.5; 3], &s, &sequential()).is_empty());

        let empty = structure(&[]);
        assert!(closest_atoms([0.5; 3], &empty, &sequential()).is_empty());
    }

    #[test]
    fn test_exact_exclusion_misses_near_duplicate() {
        // Same site up to floating noise: exact exclusion keeps it,
        // tolerance exclusion drops it.
        let s = structure(&[("Si", [0.5 + 1e-12, 0.5, 0.5]), ("Si", [0.7, 0.5, 0.5])]);

        let exact = closest_atoms([0.5; 3], &s, &sequential());
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].index, 1);

        let tol = DefectConfig {
            self_exclusion: SelfExclusion::Tolerance,
            ..sequential()
        };
        let shell = closest_atoms([0.5; 3], &s, &tol);
        assert_eq!(shell.len(), 1);
        assert_eq!(shell[0].index, 2);
    }

    #[test]
    fn test_substitution_shell_splices_coincident_vacancy() {
        let defect = structure(&[("C", [0.5, 0.5, 0.5]), ("Si", [0.7, 0.5, 0.5])]);
        let sub = Substitution {
            new_species: "C".into(),
            old_species: "Si".into(),
            position: [0.5, 0.5, 0.5],
            defect_index: 1,
            perfect_index: 4,
        };
        let on_site = Vacancy {
            species: "Si".into(),
            position: [0.5, 0.5, 0.5],
            perfect_index: 7,
        };
        let far = Vacancy {
            species: "Si".into(),
            position: [0.1, 0.1, 0.1],
            perfect_index: 2,
        };

        let plain = substitution_shell(&sub, &[far.clone()], &defect, &sequential());
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].index, 2);

        let shell = substitution_shell(&sub, &[far, on_site], &defect, &sequential());
        assert_eq!(shell.len(), 1);
        assert_eq!(shell[0].index, 7);
        assert_eq!(shell[0].distance, 0.0);
    }

    #[test]
    fn test_minimum_image_shell_crosses_cell_face() {
        // Across the x face the O is 0.5 A away; inside the cell it is 9.5 A.
        let s = structure(&[("Si", [0.02, 0.5, 0.5]), ("O", [0.97, 0.5, 0.5]), ("C", [0.2, 0.5, 0.5])]);

        let open = closest_atoms([0.02, 0.5, 0.5], &s, &sequential());
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].species, "C");
        assert!((open[0].distance - 1.8).abs() < 1e-9);

        let periodic = DefectConfig {
            parallel: false,
            ..DefectConfig::periodic()
        };
        let shell = closest_atoms([0.02, 0.5, 0.5], &s, &periodic);
        assert_eq!(shell.len(), 1);
        assert_eq!(shell[0].species, "O");
        assert_eq!(shell[0].index, 2);
        assert!((shell[0].distance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_shell_of_nothing() {
        assert!(nearest_shell(Vec::new(), 0.001).is_empty());
    }
}
