use std::collections::HashSet;

use super::helpers::pair_label;
use super::knowledge::KnowledgeBase;
use super::rules::{ClassInteractionRule, CriticalPattern, InteractionRule};
use super::types::*;

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Findings in discovery order plus the `(sorted ids, severity)` keys seen so far.
#[derive(Default)]
struct FindingAccumulator {
    findings: Vec<Finding>,
    seen: HashSet<DedupKey>,
}

impl FindingAccumulator {
    /// Record unconditionally (patterns, specific pairs).
    fn push(&mut self, finding: Finding) {
        self.seen.insert(finding.dedup_key.clone());
        self.findings.push(finding);
    }

    /// Record unless an identical id-set + severity was already emitted.
    fn push_unique(&mut self, finding: Finding) -> bool {
        if !self.seen.insert(finding.dedup_key.clone()) {
            return false;
        }
        self.findings.push(finding);
        true
    }

    /// Stable sort by severity rank; equal severities keep discovery order.
    fn into_sorted(self) -> Vec<Finding> {
        let mut findings = self.findings;
        findings.sort_by_key(|f| f.severity.rank());
        findings
    }
}

fn involved(drugs: &[ResolvedDrug<'_>]) -> Vec<InvolvedDrug> {
    drugs
        .iter()
        .map(|d| InvolvedDrug {
            original_text: d.original_text.to_string(),
            canonical_id: d.canonical_id.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pass A: critical multi-drug patterns
// ---------------------------------------------------------------------------

/// Match one pattern against the distinct resolved drugs.
/// Returns the finding naming only the qualifying drugs, or `None`.
pub fn match_pattern(
    pattern: &CriticalPattern,
    drugs: &[ResolvedDrug<'_>],
    kb: &KnowledgeBase,
) -> Option<Finding> {
    let all_met = pattern.requirements.iter().all(|req| {
        let count = drugs
            .iter()
            .filter(|d| kb.has_class(d.canonical_id, &req.class))
            .count();
        count >= req.min_count
    });
    if !all_met {
        return None;
    }

    let qualifying: Vec<ResolvedDrug<'_>> = drugs
        .iter()
        .filter(|d| {
            pattern
                .requirements
                .iter()
                .any(|req| kb.has_class(d.canonical_id, &req.class))
        })
        .copied()
        .collect();

    let (severity, effect, management) = match &pattern.advisory {
        Some(advisory) if qualifying.len() < advisory.below_count => {
            (advisory.severity, &advisory.effect, &advisory.management)
        }
        _ => (pattern.severity, &pattern.effect, &pattern.management),
    };

    Some(Finding {
        severity,
        dedup_key: DedupKey::new(qualifying.iter().map(|d| d.canonical_id), severity),
        involved_drugs: involved(&qualifying),
        effect: effect.clone(),
        mechanism: None,
        management: management.clone(),
        monitoring: pattern.monitoring.clone(),
        source: FindingSource::CriticalPattern,
        rule_id: pattern.id.clone(),
        alert_text: if severity == pattern.severity {
            pattern.alert_text.clone()
        } else {
            None
        },
    })
}

fn detect_patterns(
    drugs: &[ResolvedDrug<'_>],
    kb: &KnowledgeBase,
    acc: &mut FindingAccumulator,
) {
    for pattern in kb.rules().patterns() {
        if let Some(finding) = match_pattern(pattern, drugs, kb) {
            acc.push(finding);
        }
    }
}

// ---------------------------------------------------------------------------
// Pass B: pairwise rules
// ---------------------------------------------------------------------------

fn drug_pair_finding(
    a: ResolvedDrug<'_>,
    b: ResolvedDrug<'_>,
    rule: &InteractionRule,
) -> Finding {
    Finding {
        severity: rule.severity,
        dedup_key: DedupKey::new([a.canonical_id, b.canonical_id], rule.severity),
        involved_drugs: involved(&[a, b]),
        effect: rule.effect.clone(),
        mechanism: Some(rule.mechanism.clone()),
        management: rule.management.clone(),
        monitoring: Some(rule.monitoring.clone()),
        source: FindingSource::DrugPair,
        rule_id: pair_label(a.canonical_id, b.canonical_id),
        alert_text: None,
    }
}

fn class_pair_finding(
    a: ResolvedDrug<'_>,
    b: ResolvedDrug<'_>,
    rule: &ClassInteractionRule,
) -> Finding {
    Finding {
        severity: rule.severity,
        dedup_key: DedupKey::new([a.canonical_id, b.canonical_id], rule.severity),
        involved_drugs: involved(&[a, b]),
        effect: rule.effect.clone(),
        mechanism: Some(rule.mechanism.clone()),
        management: rule.management.clone(),
        monitoring: Some(rule.monitoring.clone()),
        source: FindingSource::ClassPair,
        rule_id: pair_label(&rule.classes[0], &rule.classes[1]),
        alert_text: None,
    }
}

/// Evaluate one unordered pair. `a` precedes `b` in the input.
fn detect_pair(
    a: ResolvedDrug<'_>,
    b: ResolvedDrug<'_>,
    kb: &KnowledgeBase,
    acc: &mut FindingAccumulator,
) {
    let rules = kb.rules();

    if let Some(rule) = rules.drug_pair_rule(a.canonical_id, b.canonical_id) {
        acc.push(drug_pair_finding(a, b, rule));
    }

    // Iterate class combinations with the pair oriented by canonical id so the
    // winning rule under dedup does not depend on input order.
    let (first, second) = if a.canonical_id <= b.canonical_id {
        (a.canonical_id, b.canonical_id)
    } else {
        (b.canonical_id, a.canonical_id)
    };

    let mut matched_class_pairs: HashSet<(&str, &str)> = HashSet::new();
    for x in kb.classes_of(first) {
        for y in kb.classes_of(second) {
            let Some(rule) = rules.class_pair_rule(x, y) else {
                continue;
            };
            let class_pair = if x <= y {
                (x.as_str(), y.as_str())
            } else {
                (y.as_str(), x.as_str())
            };
            if !matched_class_pairs.insert(class_pair) {
                continue;
            }
            let finding = class_pair_finding(a, b, rule);
            if !acc.push_unique(finding) {
                tracing::trace!(
                    pair = %pair_label(a.canonical_id, b.canonical_id),
                    class_pair = %pair_label(x, y),
                    severity = rule.severity.as_str(),
                    "Class rule suppressed by dedup"
                );
            }
        }
    }
}

fn detect_pairs(drugs: &[ResolvedDrug<'_>], kb: &KnowledgeBase, acc: &mut FindingAccumulator) {
    for (i, a) in drugs.iter().enumerate() {
        for b in &drugs[i + 1..] {
            detect_pair(*a, *b, kb, acc);
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator entry point
// ---------------------------------------------------------------------------

/// Detect every pattern and pairwise interaction among the resolved subset
/// of `input`. Output is severity-ordered; ties keep discovery order
/// (patterns first, then pairs in ascending input position).
pub fn evaluate(input: &NormalizedInput, kb: &KnowledgeBase) -> Vec<Finding> {
    let drugs = input.distinct_resolved();
    let mut acc = FindingAccumulator::default();

    detect_patterns(&drugs, kb, &mut acc);
    detect_pairs(&drugs, kb, &mut acc);

    acc.into_sorted()
}
