//! bandscore-core - Rule-based band scoring, feedback and course engine.
//!
//! This crate defines the data model, the scoring pipeline
//! (features → criteria → assessment → course), the provider trait, and the
//! batch evaluation machinery that the rest of bandscore builds on.

pub mod course;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod features;
pub mod lexicon;
pub mod model;
pub mod parser;
pub mod report;
pub mod service;
pub mod statistics;
pub mod synthesis;
pub mod traits;

pub use error::{ProviderError, ValidationError};
pub use model::{EvaluationResult, ScoreSet, ScoredWork, WorkSample, WorkType};
pub use service::{ScoringService, ServiceConfig};
