//! Planner configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::{Epoch, FIRST_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Epoch assigned to newly added elementary operators.
    pub first_epoch: Epoch,

    /// Upper bound on composite nesting walked by a single traversal. Exceeding it
    /// means the container back-references form a cycle.
    pub max_nesting_depth: usize,

    /// Run the full consistency check after every wrap/replace.
    pub verify_rewrites: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            first_epoch: FIRST_EPOCH,
            max_nesting_depth: 64,
            verify_rewrites: false,
        }
    }
}

impl PlannerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `POLYPLAN_FIRST_EPOCH`: epoch for new operators
    /// - `POLYPLAN_MAX_NESTING_DEPTH`: traversal nesting bound
    /// - `POLYPLAN_VERIFY_REWRITES`: `1`/`true` to verify after rewrites
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("POLYPLAN_FIRST_EPOCH") {
            if let Ok(v) = s.parse::<Epoch>() {
                cfg.first_epoch = v;
            }
        }

        if let Ok(s) = std::env::var("POLYPLAN_MAX_NESTING_DEPTH") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_nesting_depth = v;
            }
        }

        if let Ok(s) = std::env::var("POLYPLAN_VERIFY_REWRITES") {
            if let Some(v) = parse_flag(&s) {
                cfg.verify_rewrites = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_nesting_depth == 0 {
            return Err(Error::Config(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PlannerConfig::default();
        assert_eq!(cfg.first_epoch, FIRST_EPOCH);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_depth_is_rejected() {
        let cfg = PlannerConfig {
            max_nesting_depth: 0,
            ..PlannerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn flags_parse_loosely() {
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = PlannerConfig {
            first_epoch: 3,
            max_nesting_depth: 8,
            verify_rewrites: true,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PlannerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
