//! Burden scales: regimen-wide risk scores over the set of resolved drugs.
//!
//! Every scale is a property of the whole list, never of a pair, and is
//! computed over distinct canonical ids so the same drug entered twice is
//! counted once.

use super::knowledge::KnowledgeBase;
use super::types::{BurdenLevel, BurdenScale, BurdenScore, BurdenScores, ResolvedDrug};

pub const SEDATIVE_CLASSES: &[&str] = &[
    "benzodiazepine",
    "z_drug",
    "opioid",
    "antipsychotic",
    "tricyclic",
    "sedating",
    "cns_depressant",
];

pub const BLEEDING_CLASSES: &[&str] = &["anticoagulant", "antiplatelet", "nsaid", "ssri"];

pub const QT_CLASSES: &[&str] = &["qt_prolonging"];

pub const FALL_RISK_CLASSES: &[&str] = &[
    "benzodiazepine",
    "z_drug",
    "antipsychotic",
    "tricyclic",
    "opioid",
    "anticholinergic_high",
];

/// Anticholinergic burden weights, highest first.
pub const ANTICHOLINERGIC_WEIGHTS: &[(&str, u32)] = &[
    ("anticholinergic_high", 3),
    ("anticholinergic_moderate", 2),
    ("anticholinergic_low", 1),
];

/// Count drugs carrying any of `classes`.
fn count_scale(
    scale: BurdenScale,
    classes: &[&str],
    drugs: &[ResolvedDrug<'_>],
    kb: &KnowledgeBase,
) -> BurdenScore {
    let contributing: Vec<String> = drugs
        .iter()
        .filter(|d| classes.iter().any(|c| kb.has_class(d.canonical_id, c)))
        .map(|d| d.canonical_id.to_string())
        .collect();
    let score = contributing.len() as u32;

    BurdenScore {
        scale,
        level: BurdenLevel::from_count(score),
        score,
        contributing_drugs: contributing,
    }
}

/// Weight of one drug on the anticholinergic scale (its highest tier only).
pub fn anticholinergic_weight(canonical_id: &str, kb: &KnowledgeBase) -> u32 {
    ANTICHOLINERGIC_WEIGHTS
        .iter()
        .find(|(class, _)| kb.has_class(canonical_id, class))
        .map(|(_, weight)| *weight)
        .unwrap_or(0)
}

/// Weighted-sum thresholds: >=3 HIGH, >=2 MODERATE, >=1 LOW.
pub fn anticholinergic_level(total: u32) -> BurdenLevel {
    match total {
        0 => BurdenLevel::None,
        1 => BurdenLevel::Low,
        2 => BurdenLevel::Moderate,
        _ => BurdenLevel::High,
    }
}

fn anticholinergic_scale(drugs: &[ResolvedDrug<'_>], kb: &KnowledgeBase) -> BurdenScore {
    let mut score = 0;
    let mut contributing = Vec::new();
    for drug in drugs {
        let weight = anticholinergic_weight(drug.canonical_id, kb);
        if weight > 0 {
            score += weight;
            contributing.push(drug.canonical_id.to_string());
        }
    }

    BurdenScore {
        scale: BurdenScale::AnticholinergicLoad,
        level: anticholinergic_level(score),
        score,
        contributing_drugs: contributing,
    }
}

/// Compute all five scales. `drugs` must already be distinct by canonical id.
pub fn compute_burden_scores(drugs: &[ResolvedDrug<'_>], kb: &KnowledgeBase) -> BurdenScores {
    BurdenScores {
        sedative_load: count_scale(BurdenScale::SedativeLoad, SEDATIVE_CLASSES, drugs, kb),
        anticholinergic_load: anticholinergic_scale(drugs, kb),
        bleeding_risk: count_scale(BurdenScale::BleedingRisk, BLEEDING_CLASSES, drugs, kb),
        qt_risk: count_scale(BurdenScale::QtRisk, QT_CLASSES, drugs, kb),
        fall_risk: count_scale(BurdenScale::FallRisk, FALL_RISK_CLASSES, drugs, kb),
    }
}
