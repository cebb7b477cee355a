//! Medication-interaction and clinical-risk engine.
//!
//! Flow per evaluation: resolver -> detection -> scoring -> report.
//! The knowledge base is read-only; everything else lives for one call.

pub mod types;
pub mod helpers;
pub mod rules;
pub mod knowledge; // Drug catalog, alias index, rule repository
pub mod resolver;
pub mod detection; // Critical patterns + pairwise pass
pub mod scoring; // Burden scales
pub mod messages;
pub mod report;
pub mod engine;

pub use engine::DefaultSafetyEngine;
pub use knowledge::KnowledgeBase;
pub use types::{KnowledgeError, SafetyEngine, SafetyReport, Severity};
