use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::helpers::{is_canonical_id, normalize_token};
use super::rules::{ClassInteractionRule, CriticalPattern, InteractionRule, RuleRepository};
use super::types::KnowledgeError;

const VOCABULARY_FILE: &str = "class_vocabulary.json";
const DRUGS_FILE: &str = "drugs.json";
const ALIASES_FILE: &str = "aliases.json";
const INTERACTION_RULES_FILE: &str = "interaction_rules.json";
const CLASS_RULES_FILE: &str = "class_rules.json";
const CRITICAL_PATTERNS_FILE: &str = "critical_patterns.json";

static EMPTY_CLASSES: BTreeSet<String> = BTreeSet::new();

// ---------------------------------------------------------------------------
// Source shapes
// ---------------------------------------------------------------------------

/// One canonical medication entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrugRecord {
    pub id: String,
    pub classes: BTreeSet<String>,
    /// Trade names, in catalog order. Matched only as the brand-name fallback.
    #[serde(default)]
    pub display_names: Vec<String>,
    #[serde(default)]
    pub localized_name: Option<String>,
    /// Display only, never matched.
    #[serde(default)]
    pub context_note: Option<String>,
}

/// Maps an input token to a canonical drug id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: String,
    pub drug_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassVocabulary {
    pub version: String,
    pub classes: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugCatalog {
    pub version: String,
    pub drugs: Vec<DrugRecord>,
}

/// Unvalidated knowledge-base inputs, as parsed from the six JSON sources.
#[derive(Debug, Clone)]
pub struct KnowledgeSources {
    pub vocabulary: ClassVocabulary,
    pub catalog: DrugCatalog,
    pub aliases: Vec<AliasEntry>,
    pub interaction_rules: Vec<InteractionRule>,
    pub class_rules: Vec<ClassInteractionRule>,
    pub critical_patterns: Vec<CriticalPattern>,
}

fn parse_source<T: DeserializeOwned>(name: &str, json: &str) -> Result<T, KnowledgeError> {
    serde_json::from_str(json)
        .map_err(|e| KnowledgeError::SourceParse(name.to_string(), e.to_string()))
}

impl KnowledgeSources {
    /// Sources compiled into the binary from `resources/`.
    pub fn embedded() -> Result<Self, KnowledgeError> {
        Ok(Self {
            vocabulary: parse_source(
                VOCABULARY_FILE,
                include_str!("../../resources/class_vocabulary.json"),
            )?,
            catalog: parse_source(DRUGS_FILE, include_str!("../../resources/drugs.json"))?,
            aliases: parse_source(ALIASES_FILE, include_str!("../../resources/aliases.json"))?,
            interaction_rules: parse_source(
                INTERACTION_RULES_FILE,
                include_str!("../../resources/interaction_rules.json"),
            )?,
            class_rules: parse_source(
                CLASS_RULES_FILE,
                include_str!("../../resources/class_rules.json"),
            )?,
            critical_patterns: parse_source(
                CRITICAL_PATTERNS_FILE,
                include_str!("../../resources/critical_patterns.json"),
            )?,
        })
    }

    /// Read the six JSON sources from a directory.
    pub fn load(dir: &Path) -> Result<Self, KnowledgeError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .map_err(|e| KnowledgeError::SourceLoad(path.display().to_string(), e.to_string()))
        };

        Ok(Self {
            vocabulary: parse_source(VOCABULARY_FILE, &read(VOCABULARY_FILE)?)?,
            catalog: parse_source(DRUGS_FILE, &read(DRUGS_FILE)?)?,
            aliases: parse_source(ALIASES_FILE, &read(ALIASES_FILE)?)?,
            interaction_rules: parse_source(
                INTERACTION_RULES_FILE,
                &read(INTERACTION_RULES_FILE)?,
            )?,
            class_rules: parse_source(CLASS_RULES_FILE, &read(CLASS_RULES_FILE)?)?,
            critical_patterns: parse_source(
                CRITICAL_PATTERNS_FILE,
                &read(CRITICAL_PATTERNS_FILE)?,
            )?,
        })
    }
}

// ---------------------------------------------------------------------------
// KnowledgeBase
// ---------------------------------------------------------------------------

/// Validated, immutable drug catalog + alias index + rule repository.
///
/// Constructed once (or per reload) and shared behind an `Arc`; nothing in
/// here is mutated after `build` returns.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    version: String,
    vocabulary_version: String,
    vocabulary: BTreeSet<String>,
    drugs: HashMap<String, DrugRecord>,
    /// Normalized alias -> canonical id. Includes ids and localized names.
    aliases: HashMap<String, String>,
    /// Normalized display name -> canonical id (brand-name fallback).
    display_names: HashMap<String, String>,
    rules: RuleRepository,
}

impl KnowledgeBase {
    /// Validate sources and build the indexes. Any inconsistency rejects the
    /// whole base; there is no partial load.
    pub fn build(sources: KnowledgeSources) -> Result<Self, KnowledgeError> {
        let KnowledgeSources {
            vocabulary,
            catalog,
            aliases: alias_entries,
            interaction_rules,
            class_rules,
            critical_patterns,
        } = sources;

        let mut drugs = HashMap::with_capacity(catalog.drugs.len());
        for drug in catalog.drugs {
            if !is_canonical_id(&drug.id) {
                return Err(KnowledgeError::NonCanonicalId(drug.id));
            }
            if drug.classes.is_empty() {
                return Err(KnowledgeError::EmptyClasses(drug.id));
            }
            if let Some(class) = drug
                .classes
                .iter()
                .find(|c| !vocabulary.classes.contains(*c))
            {
                return Err(KnowledgeError::UnknownClass {
                    class: class.clone(),
                    owner: format!("drug {}", drug.id),
                });
            }
            if drugs.contains_key(&drug.id) {
                return Err(KnowledgeError::DuplicateDrug(drug.id));
            }
            drugs.insert(drug.id.clone(), drug);
        }

        let mut ids: Vec<&String> = drugs.keys().collect();
        ids.sort();

        let mut aliases: HashMap<String, String> = HashMap::new();
        let mut register = |alias: String, drug_id: &str| -> Result<(), KnowledgeError> {
            match aliases.get(&alias) {
                Some(existing) if existing != drug_id => Err(KnowledgeError::AmbiguousAlias {
                    alias,
                    first: existing.clone(),
                    second: drug_id.to_string(),
                }),
                Some(_) => Ok(()),
                None => {
                    aliases.insert(alias, drug_id.to_string());
                    Ok(())
                }
            }
        };

        // Implicit aliases first, in id order, so errors are reproducible.
        for id in &ids {
            register(id.to_string(), id)?;
            if let Some(localized) = &drugs[*id].localized_name {
                register(normalize_token(localized), id)?;
            }
        }
        for entry in alias_entries {
            if !drugs.contains_key(&entry.drug_id) {
                return Err(KnowledgeError::DanglingAlias {
                    alias: entry.alias,
                    drug_id: entry.drug_id,
                });
            }
            let key = normalize_token(&entry.alias);
            if key.is_empty() {
                return Err(KnowledgeError::BlankAlias {
                    drug_id: entry.drug_id,
                });
            }
            register(key, &entry.drug_id)?;
        }

        let mut display_names: HashMap<String, String> = HashMap::new();
        for id in &ids {
            for name in &drugs[*id].display_names {
                let key = normalize_token(name);
                let clash = display_names
                    .get(&key)
                    .or_else(|| aliases.get(&key))
                    .filter(|other| other != id);
                if let Some(other) = clash {
                    return Err(KnowledgeError::AmbiguousDisplayName {
                        name: name.clone(),
                        first: other.clone(),
                        second: id.to_string(),
                    });
                }
                display_names.insert(key, id.to_string());
            }
        }

        let rules = RuleRepository::build(
            interaction_rules,
            class_rules,
            critical_patterns,
            &vocabulary.classes,
            |id| drugs.contains_key(id),
        )?;

        Ok(Self {
            version: catalog.version,
            vocabulary_version: vocabulary.version,
            vocabulary: vocabulary.classes,
            drugs,
            aliases,
            display_names,
            rules,
        })
    }

    /// Built-in base from the embedded `resources/` sources.
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::build(KnowledgeSources::embedded()?)
    }

    /// Base from a directory holding the six JSON sources.
    pub fn load(dir: &Path) -> Result<Self, KnowledgeError> {
        Self::build(KnowledgeSources::load(dir)?)
    }

    pub fn lookup(&self, canonical_id: &str) -> Option<&DrugRecord> {
        self.drugs.get(canonical_id)
    }

    /// Class tags of a drug; empty (not an error) for unknown ids.
    pub fn classes_of(&self, canonical_id: &str) -> &BTreeSet<String> {
        self.drugs
            .get(canonical_id)
            .map(|d| &d.classes)
            .unwrap_or(&EMPTY_CLASSES)
    }

    pub fn has_class(&self, canonical_id: &str, class: &str) -> bool {
        self.classes_of(canonical_id).contains(class)
    }

    /// Exact alias-index match on an already normalized token.
    pub fn resolve_alias(&self, token: &str) -> Option<&str> {
        self.aliases.get(token).map(String::as_str)
    }

    /// Brand-name fallback: exact, case-insensitive match against display names.
    pub fn resolve_display_name(&self, token: &str) -> Option<&str> {
        self.display_names.get(token).map(String::as_str)
    }

    pub fn rules(&self) -> &RuleRepository {
        &self.rules
    }

    pub fn is_known_class(&self, class: &str) -> bool {
        self.vocabulary.contains(class)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn vocabulary_version(&self) -> &str {
        &self.vocabulary_version
    }

    pub fn drug_count(&self) -> usize {
        self.drugs.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}
