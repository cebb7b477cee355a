//! Shared service state: the published knowledge base.
//!
//! Readers clone an `Arc` under a short read lock and evaluate without
//! holding it. A reload builds the new base outside the lock and swaps it
//! in one write, so every evaluation sees exactly one generation.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::KnowledgeSource;
use crate::safety::{DefaultSafetyEngine, KnowledgeBase, KnowledgeError};

/// A knowledge base plus its publication metadata.
#[derive(Clone)]
pub struct PublishedKnowledge {
    pub base: Arc<KnowledgeBase>,
    /// Starts at 0; +1 per successful reload.
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
}

/// Summary returned to callers after a reload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KnowledgeStatus {
    pub version: String,
    pub vocabulary_version: String,
    pub generation: u64,
    pub drugs: usize,
    pub aliases: usize,
    pub drug_pair_rules: usize,
    pub class_pair_rules: usize,
    pub critical_patterns: usize,
    pub loaded_at: DateTime<Utc>,
}

impl PublishedKnowledge {
    pub fn status(&self) -> KnowledgeStatus {
        let rules = self.base.rules();
        KnowledgeStatus {
            version: self.base.version().to_string(),
            vocabulary_version: self.base.vocabulary_version().to_string(),
            generation: self.generation,
            drugs: self.base.drug_count(),
            aliases: self.base.alias_count(),
            drug_pair_rules: rules.drug_pair_count(),
            class_pair_rules: rules.class_pair_count(),
            critical_patterns: rules.patterns().len(),
            loaded_at: self.loaded_at,
        }
    }
}

pub struct CoreState {
    knowledge: RwLock<PublishedKnowledge>,
    /// Source used by `reload_from_source`.
    pub source: KnowledgeSource,
}

impl CoreState {
    /// Wrap an already-validated base as generation 0.
    pub fn new(base: KnowledgeBase, source: KnowledgeSource) -> Self {
        Self {
            knowledge: RwLock::new(PublishedKnowledge {
                base: Arc::new(base),
                generation: 0,
                loaded_at: Utc::now(),
            }),
            source,
        }
    }

    /// Load generation 0 from `source`. Startup fails on any configuration error.
    pub fn load(source: KnowledgeSource) -> Result<Self, CoreError> {
        let base = build_from(&source)?;
        Ok(Self::new(base, source))
    }

    /// Snapshot of the current publication.
    pub fn knowledge(&self) -> Result<PublishedKnowledge, CoreError> {
        let guard = self.knowledge.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(guard.clone())
    }

    /// Engine bound to the current generation.
    pub fn engine(&self) -> Result<DefaultSafetyEngine, CoreError> {
        let published = self.knowledge()?;
        Ok(DefaultSafetyEngine::new(published.base, published.generation))
    }

    /// Rebuild from the configured source and publish it.
    pub fn reload_from_source(&self) -> Result<KnowledgeStatus, CoreError> {
        self.reload(&self.source)
    }

    /// Rebuild from `source` and publish atomically. On error the previous
    /// base stays published.
    pub fn reload(&self, source: &KnowledgeSource) -> Result<KnowledgeStatus, CoreError> {
        let base = match build_from(source) {
            Ok(base) => base,
            Err(e) => {
                tracing::error!(error = %e, "Knowledge base reload rejected, keeping current base");
                return Err(e);
            }
        };
        self.publish(base)
    }

    fn publish(&self, base: KnowledgeBase) -> Result<KnowledgeStatus, CoreError> {
        let mut guard = self.knowledge.write().map_err(|_| CoreError::LockPoisoned)?;
        let next = PublishedKnowledge {
            base: Arc::new(base),
            generation: guard.generation + 1,
            loaded_at: Utc::now(),
        };
        *guard = next;
        let status = guard.status();
        drop(guard);

        tracing::info!(
            generation = status.generation,
            version = %status.version,
            drugs = status.drugs,
            drug_pair_rules = status.drug_pair_rules,
            class_pair_rules = status.class_pair_rules,
            critical_patterns = status.critical_patterns,
            "Knowledge base reloaded"
        );
        Ok(status)
    }
}

fn build_from(source: &KnowledgeSource) -> Result<KnowledgeBase, CoreError> {
    let base = match source {
        KnowledgeSource::Embedded => KnowledgeBase::builtin()?,
        KnowledgeSource::Directory(dir) => KnowledgeBase::load(dir)?,
    };
    Ok(base)
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
}
