//! Scene configuration.

use serde::{Deserialize, Serialize};

/// Settings applied to a new [`Scene`](crate::Scene).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Multiplier for lengths read from a file; lengths written are divided
    /// by it.
    pub linear_scale: f64,
    /// Spaces added per nesting level in exported text.
    pub indent_step: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            linear_scale: 1.0,
            indent_step: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SceneConfig = serde_json::from_str(r#"{ "linear_scale": 0.001 }"#).unwrap();
        assert_eq!(config.linear_scale, 0.001);
        assert_eq!(config.indent_step, 2);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SceneConfig {
            linear_scale: 25.4,
            indent_step: 4,
        };
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<SceneConfig>(&text).unwrap(), config);
    }
}
