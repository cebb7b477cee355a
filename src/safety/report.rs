//! Report assembly. Everything here is derived from findings and burden
//! scores that were already computed; nothing re-evaluates risk.

use std::collections::HashMap;

use crate::config::POLYPHARMACY_THRESHOLD;

use super::messages::MessageTemplates;
use super::types::*;

/// One alert per CONTRAINDICATED finding, then one advisory per HIGH scale.
pub fn critical_alerts(findings: &[Finding], scores: &BurdenScores) -> Vec<CriticalAlert> {
    let contraindicated = findings
        .iter()
        .filter(|f| f.severity == Severity::Contraindicated)
        .map(|f| CriticalAlert {
            kind: CriticalAlertKind::ContraindicatedCombination,
            title: MessageTemplates::contraindicated_title(f),
            message: MessageTemplates::contraindicated_message(f),
            drugs: f.canonical_ids().into_iter().map(String::from).collect(),
            scale: None,
        });

    let burden = scores.high().map(|s| CriticalAlert {
        kind: CriticalAlertKind::HighBurden,
        title: MessageTemplates::high_burden_title(s),
        message: MessageTemplates::high_burden_message(s),
        drugs: s.contributing_drugs.clone(),
        scale: Some(s.scale),
    });

    contraindicated.chain(burden).collect()
}

/// Priority-ranked action list.
///
/// 1: resolve contraindications today. 2: review major interactions.
/// 3: one per HIGH burden scale. 4: polypharmacy review, where
/// `medication_total` is distinct resolved drugs plus unresolved entries.
pub fn recommendations(
    findings: &[Finding],
    scores: &BurdenScores,
    medication_total: usize,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    let contraindicated: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.severity == Severity::Contraindicated)
        .collect();
    if !contraindicated.is_empty() {
        recs.push(Recommendation {
            priority: 1,
            action: MessageTemplates::resolve_contraindicated_action(contraindicated.len()),
            rationale: MessageTemplates::resolve_contraindicated_rationale(&contraindicated),
            drugs: involved_ids(&contraindicated),
        });
    }

    let major: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.severity == Severity::Major)
        .collect();
    if !major.is_empty() {
        recs.push(Recommendation {
            priority: 2,
            action: MessageTemplates::review_major_action(major.len()),
            rationale: MessageTemplates::review_major_rationale(),
            drugs: involved_ids(&major),
        });
    }

    for score in scores.high() {
        recs.push(Recommendation {
            priority: 3,
            action: MessageTemplates::reduce_burden_action(score),
            rationale: MessageTemplates::reduce_burden_rationale(score),
            drugs: score.contributing_drugs.clone(),
        });
    }

    if medication_total > POLYPHARMACY_THRESHOLD {
        recs.push(Recommendation {
            priority: 4,
            action: MessageTemplates::polypharmacy_action(medication_total),
            rationale: MessageTemplates::polypharmacy_rationale(POLYPHARMACY_THRESHOLD),
            drugs: Vec::new(),
        });
    }

    recs
}

/// Canonical ids across findings, first appearance wins.
fn involved_ids(findings: &[&Finding]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in findings.iter().flat_map(|f| f.canonical_ids()) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Canonical ids entered more than once, in first-appearance order.
pub fn duplicates(input: &NormalizedInput) -> Vec<DuplicateEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut texts: HashMap<&str, Vec<String>> = HashMap::new();

    for entry in &input.entries {
        let Some(id) = entry.resolved_id.as_deref() else {
            continue;
        };
        texts
            .entry(id)
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(entry.original_text.clone());
    }

    order
        .into_iter()
        .filter_map(|id| {
            let original_texts = texts.remove(id)?;
            (original_texts.len() > 1).then(|| DuplicateEntry {
                canonical_id: id.to_string(),
                original_texts,
            })
        })
        .collect()
}

/// Assemble the immutable report.
pub fn assemble(
    input: NormalizedInput,
    findings: Vec<Finding>,
    burden_scores: BurdenScores,
    knowledge_base: KnowledgeBaseStamp,
) -> SafetyReport {
    // Unresolved entries are still medications the patient takes.
    let medication_total = input.distinct_resolved().len() + input.unresolved_count();
    let critical_alerts = critical_alerts(&findings, &burden_scores);
    let recommendations = recommendations(&findings, &burden_scores, medication_total);
    let duplicates = duplicates(&input);
    let counts = FindingCounts::from_findings(&findings);

    SafetyReport {
        input: input.entries.iter().map(|e| e.original_text.clone()).collect(),
        resolved_count: input.resolved_count(),
        unresolved_count: input.unresolved_count(),
        entries: input.entries,
        findings,
        counts,
        burden_scores,
        critical_alerts,
        recommendations,
        duplicates,
        knowledge_base,
    }
}
