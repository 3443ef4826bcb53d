pub mod analytics;
pub mod classifier;
pub mod normalizer;
pub mod reconciler;
pub mod resolver;
pub mod stored;
pub mod validator;

pub use classifier::DiscrepancyClassifier;
pub use reconciler::Reconciler;
pub use resolver::{CandidatePair, Resolution, Resolved, ResolvedMemo};
pub use validator::{MatchValidator, Rule, ValidationOutcome};
