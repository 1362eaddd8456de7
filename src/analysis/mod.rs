// =============================================================================
// Analysis Module
// =============================================================================
//
// Turns an IndicatorSet into the caller-facing assessment:
// - Confidence tier / success probability / risk score
// - Ordered-rule trading signal
// - Candidate buy and sell levels (jittered through an injected source)
// - The engine that validates inputs and assembles everything

pub mod confidence;
pub mod engine;
pub mod error;
pub mod levels;
pub mod signal;

pub use engine::{analyze, analyze_request, AnalysisRequest, AnalysisResult};
pub use error::AnalysisError;
pub use levels::{JitterSource, RandomJitter};
