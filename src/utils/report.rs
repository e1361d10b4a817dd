// src/utils/report.rs

use crate::model::{Defect, Neighbor};
use crate::physics::analysis::DefectAnalysis;

const RULE: &str = "##################################################################";

fn fmt_position(p: [f64; 3]) -> String {
    format!("[{:.6} {:.6} {:.6}]", p[0], p[1], p[2])
}

fn neighbor_table(out: &mut String, label: &str, folder_name: &str, neighbors: &[Neighbor]) {
    out.push_str(&format!(
        "\nClosest neighbors to the {} defect in {}/POSCAR:\n",
        label, folder_name
    ));
    out.push_str(&format!(
        "{:<10} {:<10} {:<30} {:<10}\n",
        "Index", "Atom", "Position", "Distance (A)"
    ));
    for n in neighbors {
        let pos = n
            .position
            .iter()
            .map(|c| format!("{:.6}", c))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "{:<10} {:<10} {:<30} {:<10.4}\n",
            n.index, n.species, pos, n.distance
        ));
    }
}

/// Full per-defect report in the `neighbor_atoms.dat` layout.
///
/// `folder_name` names the directory of the defect calculation; the perfect
/// structure is referred to as `../perfect/POSCAR`.
pub fn defect_report(analysis: &DefectAnalysis, folder_name: &str) -> String {
    let mut out = String::new();

    for shell in &analysis.shells {
        let label = shell.defect.label();
        match &shell.defect {
            Defect::Vacancy(v) => {
                out.push_str(&format!("\nVacancy: {}\n", label));
                out.push_str(&format!("Index in ../perfect/POSCAR: {}\n", v.perfect_index));
                out.push_str(&format!("Position: {}\n", fmt_position(v.position)));
            }
            Defect::Substitution(s) => {
                out.push_str(&format!("\n{}\n", RULE));
                out.push_str(&format!("\nSubstitutional: {}\n", label));
                out.push_str(&format!("Index in ../perfect/POSCAR: {}\n", s.perfect_index));
                out.push_str(&format!("Index in {}/POSCAR: {}\n", folder_name, s.defect_index));
                out.push_str(&format!("Position: {}\n", fmt_position(s.position)));
            }
            Defect::Interstitial(i) => {
                out.push_str(&format!("\n{}\n", RULE));
                out.push_str(&format!("Interstitial: {}\n", label));
                out.push_str(&format!("Index in {}/POSCAR: {}\n", folder_name, i.defect_index));
                out.push_str(&format!("Position: {}\n", fmt_position(i.position)));
            }
        }
        // A lone substituted atom gets no neighbor block at all
        if matches!(shell.defect, Defect::Substitution(_)) && shell.neighbors.is_empty() {
            continue;
        }
        neighbor_table(&mut out, &label, folder_name, &shell.neighbors);
    }

    out
}

/// One-line count of what was found.
pub fn summary(analysis: &DefectAnalysis) -> String {
    if analysis.is_pristine() {
        return "No defects found.".to_string();
    }
    let labels: Vec<String> = analysis.shells.iter().map(|s| s.defect.label()).collect();
    format!(
        "{} vacancies, {} substitutions, {} interstitials: {}",
        analysis.vacancies.len(),
        analysis.substitutions.len(),
        analysis.interstitials.len(),
        labels.join(", ")
    )
}

pub fn json_report(analysis: &DefectAnalysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}
