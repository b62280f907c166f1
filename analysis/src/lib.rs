//! Client for the remote generative-model service that backs the three
//! verification collaborators.
//!
//! One [`GeminiClient`] implements [`LivenessClassifier`], [`AttributeAnalyzer`],
//! and [`Reconciler`]: each call sends the stills inline with a task prompt and a
//! JSON response schema, then parses the model's JSON answer.
//!
//! [`LivenessClassifier`]: ageverify_verification::LivenessClassifier
//! [`AttributeAnalyzer`]: ageverify_verification::AttributeAnalyzer
//! [`Reconciler`]: ageverify_verification::Reconciler

pub mod client;
pub mod config;
pub mod error;
pub mod prompts;
pub mod wire;

pub use client::GeminiClient;
pub use config::AnalysisConfig;
pub use error::AnalysisError;
