use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::detection::evaluate;
use super::knowledge::KnowledgeBase;
use super::report::assemble;
use super::resolver::resolve;
use super::scoring::compute_burden_scores;
use super::types::{KnowledgeBaseStamp, SafetyEngine, SafetyReport};

/// Default engine: resolver, evaluator, scoring and report over one
/// published knowledge base. Cheap to construct per request.
pub struct DefaultSafetyEngine {
    kb: Arc<KnowledgeBase>,
    generation: u64,
}

impl DefaultSafetyEngine {
    pub fn new(kb: Arc<KnowledgeBase>, generation: u64) -> Self {
        Self { kb, generation }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn stamp(&self) -> KnowledgeBaseStamp {
        KnowledgeBaseStamp {
            version: self.kb.version().to_string(),
            generation: self.generation,
        }
    }
}

impl SafetyEngine for DefaultSafetyEngine {
    fn evaluate_safety(&self, medications: &[&str]) -> SafetyReport {
        let start = Instant::now();
        let evaluation_id = Uuid::new_v4();

        let input = resolve(&self.kb, medications);
        let findings = evaluate(&input, &self.kb);
        let scores = compute_burden_scores(&input.distinct_resolved(), &self.kb);
        let report = assemble(input, findings, scores, self.stamp());

        tracing::info!(
            evaluation_id = %evaluation_id,
            resolved = report.resolved_count,
            unresolved = report.unresolved_count,
            contraindicated = report.counts.contraindicated,
            major = report.counts.major,
            moderate = report.counts.moderate,
            minor = report.counts.minor,
            critical_alerts = report.critical_alerts.len(),
            kb_generation = self.generation,
            processing_ms = start.elapsed().as_millis() as u64,
            "Safety evaluation complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::types::{BurdenLevel, FindingSource, Severity};

    fn engine() -> DefaultSafetyEngine {
        DefaultSafetyEngine::new(Arc::new(KnowledgeBase::builtin().unwrap()), 0)
    }

    fn severities(report: &SafetyReport) -> Vec<Severity> {
        report.findings.iter().map(|f| f.severity).collect()
    }

    /// T-01: Opioid + benzodiazepine under a brand alias is one stop-order.
    #[test]
    fn scenario_opioid_benzodiazepine() {
        let r = engine().evaluate_safety(&["Tramadol", "Rivotril"]);
        assert_eq!(r.resolved_count, 2);
        assert_eq!(r.findings.len(), 1);
        let f = &r.findings[0];
        assert_eq!(f.severity, Severity::Contraindicated);
        assert!(f.effect.starts_with("Fatal respiratory depression"));
        assert_eq!(f.source, FindingSource::CriticalPattern);
        assert_eq!(r.burden_scores.sedative_load.level, BurdenLevel::Moderate);
        assert!(r.has_contraindications());
    }

    /// T-02: Two anticoagulants plus an antiplatelet.
    #[test]
    fn scenario_triple_anticoagulation() {
        let r = engine().evaluate_safety(&["Aspirin", "Eliquis", "Clexane"]);
        assert_eq!(r.findings[0].severity, Severity::Contraindicated);
        assert!(r.findings[0].effect.starts_with("Triple anticoagulation"));
        assert_eq!(r.findings[0].involved_drugs.len(), 3);
        assert_eq!(r.counts.contraindicated, 1);
        assert_eq!(r.counts.major, 3);
        assert_eq!(r.burden_scores.bleeding_risk.level, BurdenLevel::High);
    }

    /// T-03: Four QT-prolonging drugs.
    #[test]
    fn scenario_qt_prolongation() {
        let r = engine().evaluate_safety(&["Haldol", "Cipro", "Sotalol", "Zithromax"]);
        let f = &r.findings[0];
        assert_eq!(f.severity, Severity::Contraindicated);
        assert_eq!(f.rule_id, "qt_prolongation");
        let mut ids = f.canonical_ids();
        ids.sort();
        assert_eq!(
            ids,
            vec!["azithromycin", "ciprofloxacin", "haloperidol", "sotalol"]
        );
        assert_eq!(r.counts.contraindicated, 1);
        assert_eq!(r.counts.major, 6);
        assert_eq!(r.burden_scores.qt_risk.level, BurdenLevel::High);
    }

    /// T-04: Three serotonergic agents.
    #[test]
    fn scenario_serotonin_syndrome() {
        let r = engine().evaluate_safety(&["Tramadol", "Zoloft", "Effexor"]);
        assert_eq!(r.findings[0].severity, Severity::Contraindicated);
        assert_eq!(r.findings[0].rule_id, "serotonin_syndrome");
        assert_eq!(r.counts.contraindicated, 1);
        assert_eq!(r.counts.major, 3);
    }

    /// T-05: Single unrelated drug.
    #[test]
    fn scenario_single_drug() {
        let r = engine().evaluate_safety(&["Paracetamol"]);
        assert!(r.findings.is_empty());
        assert!(r.critical_alerts.is_empty());
        assert!(r
            .burden_scores
            .all()
            .iter()
            .all(|s| s.level == BurdenLevel::None));
    }

    /// T-06: Unknown drug is reported, not raised.
    #[test]
    fn scenario_unknown_drug() {
        let r = engine().evaluate_safety(&["Unknownium 500mg"]);
        assert_eq!(r.unresolved_count, 1);
        assert_eq!(r.resolved_count, 0);
        assert!(r.findings.is_empty());
        assert_eq!(r.entries[0].original_text, "Unknownium 500mg");
    }

    /// T-07: Empty input yields an empty report.
    #[test]
    fn empty_input() {
        let r = engine().evaluate_safety(&[]);
        assert!(r.input.is_empty());
        assert!(r.findings.is_empty());
        assert!(r.recommendations.is_empty());
    }

    /// T-08: Same input, same report.
    #[test]
    fn evaluation_is_deterministic() {
        let e = engine();
        let meds = ["Aspirin", "Eliquis", "Haldol", "Cipro", "Tramadol", "Rivotril", "Zoloft"];
        assert_eq!(e.evaluate_safety(&meds), e.evaluate_safety(&meds));
    }

    /// T-09: Input order changes nothing but the echo.
    #[test]
    fn permutation_invariant_findings() {
        let e = engine();
        let forward = e.evaluate_safety(&["Aspirin", "Eliquis", "Clexane", "Haldol", "Cipro"]);
        let reverse = e.evaluate_safety(&["Cipro", "Haldol", "Clexane", "Eliquis", "Aspirin"]);

        let keys = |r: &SafetyReport| {
            let mut k: Vec<_> = r.findings.iter().map(|f| f.dedup_key.clone()).collect();
            k.sort();
            k
        };
        assert_eq!(keys(&forward), keys(&reverse));
        assert_eq!(forward.counts, reverse.counts);
        for (a, b) in forward.burden_scores.all().iter().zip(reverse.burden_scores.all()) {
            assert_eq!(a.level, b.level);
            assert_eq!(a.score, b.score);
        }
    }

    /// T-10: Report carries the generation it was produced by.
    #[test]
    fn report_is_stamped() {
        let kb = Arc::new(KnowledgeBase::builtin().unwrap());
        let r = DefaultSafetyEngine::new(kb.clone(), 7).evaluate_safety(&["Paracetamol"]);
        assert_eq!(r.knowledge_base.generation, 7);
        assert_eq!(r.knowledge_base.version, kb.version());
    }

    /// T-11: Findings stay severity-sorted.
    #[test]
    fn findings_severity_sorted() {
        let r = engine().evaluate_safety(&[
            "Aspirin", "Advil", "Eliquis", "Zoloft", "Haldol", "Cipro", "Tramadol",
        ]);
        let ranks: Vec<u8> = severities(&r).iter().map(|s| s.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }
}
