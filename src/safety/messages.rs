use super::types::{BurdenScore, Finding};

/// Text templates for alerts and recommendations.
/// Clinician-facing: direct, imperative, no hedging on stop-orders.
pub struct MessageTemplates;

impl MessageTemplates {
    /// "a + b + c" from the caller's spellings.
    pub fn drug_list(finding: &Finding) -> String {
        finding
            .involved_drugs
            .iter()
            .map(|d| d.original_text.trim())
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Alert title for a CONTRAINDICATED finding. Patterns carry their own.
    pub fn contraindicated_title(finding: &Finding) -> String {
        match &finding.alert_text {
            Some(text) => format!("CONTRAINDICATED: {}", text),
            None => format!("CONTRAINDICATED: {}", Self::drug_list(finding)),
        }
    }

    /// Alert body: the effect, then the management instruction verbatim.
    pub fn contraindicated_message(finding: &Finding) -> String {
        format!(
            "{} ({}). {}",
            finding.effect.trim_end_matches('.'),
            Self::drug_list(finding),
            finding.management,
        )
    }

    pub fn high_burden_title(score: &BurdenScore) -> String {
        format!("HIGH {}", score.scale.label())
    }

    pub fn high_burden_message(score: &BurdenScore) -> String {
        format!(
            "Cumulative {} is HIGH (score {}) from {}. \
             Review whether every contributing medication is still needed.",
            score.scale.label(),
            score.score,
            score.contributing_drugs.join(", "),
        )
    }

    pub fn resolve_contraindicated_action(count: usize) -> String {
        if count == 1 {
            "Resolve the contraindicated combination today: stop or substitute one agent."
                .to_string()
        } else {
            format!(
                "Resolve {} contraindicated combinations today: stop or substitute the offending agents.",
                count
            )
        }
    }

    pub fn resolve_contraindicated_rationale(findings: &[&Finding]) -> String {
        let effects: Vec<&str> = findings
            .iter()
            .map(|f| f.effect.split(':').next().unwrap_or(&f.effect).trim())
            .collect();
        format!("Risk of {}.", effects.join("; "))
    }

    pub fn review_major_action(count: usize) -> String {
        format!(
            "Review {} major interaction{} within 24-48 hours and adjust dose or monitoring.",
            count,
            if count == 1 { "" } else { "s" },
        )
    }

    pub fn review_major_rationale() -> String {
        "Major interactions are clinically significant but may be managed with monitoring."
            .to_string()
    }

    pub fn reduce_burden_action(score: &BurdenScore) -> String {
        format!(
            "Reduce {}: deprescribe or taper at least one of {}.",
            score.scale.label(),
            score.contributing_drugs.join(", "),
        )
    }

    pub fn reduce_burden_rationale(score: &BurdenScore) -> String {
        format!(
            "{} is HIGH (score {}) across the regimen.",
            capitalize(score.scale.label()),
            score.score,
        )
    }

    pub fn polypharmacy_action(total: usize) -> String {
        format!(
            "Perform a structured medication review: {} medications on record, including unrecognized entries.",
            total
        )
    }

    pub fn polypharmacy_rationale(threshold: usize) -> String {
        format!(
            "More than {} concurrent medications raises the risk of unrecognized interactions and adverse events.",
            threshold
        )
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::types::{
        BurdenLevel, BurdenScale, DedupKey, FindingSource, InvolvedDrug, Severity,
    };

    fn finding(alert_text: Option<&str>) -> Finding {
        Finding {
            severity: Severity::Contraindicated,
            involved_drugs: vec![
                InvolvedDrug {
                    original_text: " Tramadol".into(),
                    canonical_id: "tramadol".into(),
                },
                InvolvedDrug {
                    original_text: "Rivotril".into(),
                    canonical_id: "clonazepam".into(),
                },
            ],
            effect: "Fatal respiratory depression.".into(),
            mechanism: None,
            management: "Avoid co-prescription.".into(),
            monitoring: None,
            source: FindingSource::CriticalPattern,
            rule_id: "opioid_benzodiazepine".into(),
            alert_text: alert_text.map(String::from),
            dedup_key: DedupKey::new(["tramadol", "clonazepam"], Severity::Contraindicated),
        }
    }

    #[test]
    fn title_prefers_pattern_alert_text() {
        assert_eq!(
            MessageTemplates::contraindicated_title(&finding(Some("Opioid + benzodiazepine"))),
            "CONTRAINDICATED: Opioid + benzodiazepine"
        );
        assert_eq!(
            MessageTemplates::contraindicated_title(&finding(None)),
            "CONTRAINDICATED: Tramadol + Rivotril"
        );
    }

    #[test]
    fn message_includes_effect_and_management() {
        let msg = MessageTemplates::contraindicated_message(&finding(None));
        assert_eq!(
            msg,
            "Fatal respiratory depression (Tramadol + Rivotril). Avoid co-prescription."
        );
    }

    #[test]
    fn burden_texts_name_contributors() {
        let score = BurdenScore {
            scale: BurdenScale::BleedingRisk,
            level: BurdenLevel::High,
            score: 3,
            contributing_drugs: vec!["aspirin".into(), "apixaban".into(), "enoxaparin".into()],
        };
        assert_eq!(MessageTemplates::high_burden_title(&score), "HIGH bleeding risk");
        assert!(MessageTemplates::high_burden_message(&score).contains("aspirin, apixaban, enoxaparin"));
        assert!(MessageTemplates::reduce_burden_rationale(&score).starts_with("Bleeding risk"));
    }

    #[test]
    fn action_plurals() {
        assert!(MessageTemplates::resolve_contraindicated_action(1).contains("the contraindicated combination"));
        assert!(MessageTemplates::resolve_contraindicated_action(2).contains("2 contraindicated"));
        assert!(MessageTemplates::review_major_action(1).contains("1 major interaction within"));
        assert!(MessageTemplates::review_major_action(6).contains("6 major interactions"));
    }
}
