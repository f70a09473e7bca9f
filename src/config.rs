//! Pipeline configuration
//!
//! Explicit, constructor-injected configuration instead of process-wide
//! singletons, so tests can run multiple isolated pipelines.

use crate::models::Level;
use chrono::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Inactivity window after which a dialogue session is treated as expired
    pub session_timeout: Duration,
    /// Stress level at or above which the sentiment reply overrides dialogue context
    pub stress_override_threshold: Level,
    /// Minimum similarity for lexicon term suggestions
    pub term_suggestion_threshold: f64,
    /// Minimum similarity for dialect/slang token suggestions
    pub dialect_suggestion_threshold: f64,
    /// Maximum suggestions returned per unknown token
    pub suggestion_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::minutes(5),
            stress_override_threshold: Level::Medium,
            term_suggestion_threshold: 0.3,
            dialect_suggestion_threshold: 0.6,
            suggestion_limit: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.session_timeout, Duration::minutes(5));
        assert_eq!(config.stress_override_threshold, Level::Medium);
        assert!((config.term_suggestion_threshold - 0.3).abs() < f64::EPSILON);
        assert!((config.dialect_suggestion_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.suggestion_limit, 3);
    }
}
