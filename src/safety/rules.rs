use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::helpers::{pair_key, pair_label};
use super::types::{KnowledgeError, Severity};

// ---------------------------------------------------------------------------
// Rule shapes (as stored in the JSON sources)
// ---------------------------------------------------------------------------

/// Specific drug-pair rule, keyed by an unordered pair of canonical ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionRule {
    pub drugs: [String; 2],
    pub severity: Severity,
    pub effect: String,
    pub mechanism: String,
    pub management: String,
    pub monitoring: String,
}

/// Pharmacologic-class pair rule, keyed by an unordered pair of class tags.
/// Both tags may be equal ("two anticoagulants").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassInteractionRule {
    pub classes: [String; 2],
    pub severity: Severity,
    pub effect: String,
    pub mechanism: String,
    pub management: String,
    pub monitoring: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassRequirement {
    pub class: String,
    pub min_count: usize,
}

/// Lower-severity variant reported while the qualifying drug count is
/// below `below_count` (QT: two drugs is an advisory, three is a stop-order).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternAdvisory {
    pub below_count: usize,
    pub severity: Severity,
    pub effect: String,
    pub management: String,
}

/// Multi-drug rule not expressible as a single pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CriticalPattern {
    pub id: String,
    pub name: String,
    pub requirements: Vec<ClassRequirement>,
    pub severity: Severity,
    pub effect: String,
    pub management: String,
    #[serde(default)]
    pub monitoring: Option<String>,
    #[serde(default)]
    pub alert_text: Option<String>,
    #[serde(default)]
    pub advisory: Option<PatternAdvisory>,
}

impl CriticalPattern {
    fn validate(&self, vocabulary: &BTreeSet<String>) -> Result<(), KnowledgeError> {
        let invalid = |msg: &str| KnowledgeError::InvalidPattern(self.id.clone(), msg.to_string());

        if self.requirements.is_empty() {
            return Err(invalid("no class requirements"));
        }
        let mut tags = HashSet::new();
        for req in &self.requirements {
            if !vocabulary.contains(&req.class) {
                return Err(KnowledgeError::UnknownClass {
                    class: req.class.clone(),
                    owner: format!("pattern {}", self.id),
                });
            }
            if req.min_count == 0 {
                return Err(invalid("requirement with min_count 0"));
            }
            if !tags.insert(req.class.as_str()) {
                return Err(invalid("class tag repeated across requirements"));
            }
        }
        let total: usize = self.requirements.iter().map(|r| r.min_count).sum();
        if total < 2 {
            return Err(invalid("total multiplicity below 2"));
        }
        if let Some(advisory) = &self.advisory {
            if advisory.below_count <= total {
                return Err(invalid("advisory threshold does not exceed the trigger count"));
            }
            if advisory.severity.rank() <= self.severity.rank() {
                return Err(invalid("advisory severity is not below the pattern severity"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RuleRepository
// ---------------------------------------------------------------------------

/// The three rule families, validated and indexed for O(1) pair lookups.
#[derive(Debug, Clone)]
pub struct RuleRepository {
    drug_pairs: HashMap<(String, String), InteractionRule>,
    class_pairs: HashMap<(String, String), ClassInteractionRule>,
    patterns: Vec<CriticalPattern>,
}

impl RuleRepository {
    /// Validate and index rules. `is_drug` answers whether a canonical id is registered.
    pub fn build(
        interaction_rules: Vec<InteractionRule>,
        class_rules: Vec<ClassInteractionRule>,
        patterns: Vec<CriticalPattern>,
        vocabulary: &BTreeSet<String>,
        is_drug: impl Fn(&str) -> bool,
    ) -> Result<Self, KnowledgeError> {
        let mut drug_pairs = HashMap::new();
        for rule in interaction_rules {
            let [a, b] = &rule.drugs;
            let label = pair_label(a, b);
            for id in [a, b] {
                if !is_drug(id) {
                    return Err(KnowledgeError::DanglingRuleDrug {
                        rule: label,
                        drug_id: id.clone(),
                    });
                }
            }
            if a == b {
                return Err(KnowledgeError::SelfPairRule(label));
            }
            if drug_pairs.insert(pair_key(a, b), rule).is_some() {
                return Err(KnowledgeError::DuplicateRule(label));
            }
        }

        let mut class_pairs = HashMap::new();
        for rule in class_rules {
            let [x, y] = &rule.classes;
            let label = pair_label(x, y);
            for class in [x, y] {
                if !vocabulary.contains(class) {
                    return Err(KnowledgeError::UnknownClass {
                        class: class.clone(),
                        owner: format!("class rule {label}"),
                    });
                }
            }
            if class_pairs.insert(pair_key(x, y), rule).is_some() {
                return Err(KnowledgeError::DuplicateRule(label));
            }
        }

        let mut pattern_ids = HashSet::new();
        for pattern in &patterns {
            pattern.validate(vocabulary)?;
            if !pattern_ids.insert(pattern.id.as_str()) {
                return Err(KnowledgeError::InvalidPattern(
                    pattern.id.clone(),
                    "duplicate pattern id".into(),
                ));
            }
        }

        Ok(Self {
            drug_pairs,
            class_pairs,
            patterns,
        })
    }

    /// Specific-pair rule for two canonical ids, in either order.
    pub fn drug_pair_rule(&self, a: &str, b: &str) -> Option<&InteractionRule> {
        self.drug_pairs.get(&pair_key(a, b))
    }

    /// Class-pair rule for two class tags, in either order.
    pub fn class_pair_rule(&self, x: &str, y: &str) -> Option<&ClassInteractionRule> {
        self.class_pairs.get(&pair_key(x, y))
    }

    /// Critical patterns in source order; this order is the report order.
    pub fn patterns(&self) -> &[CriticalPattern] {
        &self.patterns
    }

    pub fn drug_pair_count(&self) -> usize {
        self.drug_pairs.len()
    }

    pub fn class_pair_count(&self) -> usize {
        self.class_pairs.len()
    }
}
