//! Workflow evaluation on the automation / cognitive-load matrix

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest score on the evaluation scale
pub const SCORE_MIN: f64 = 1.0;
/// Highest score on the evaluation scale
pub const SCORE_MAX: f64 = 5.0;
/// Scores at or above the midpoint count as "high"
pub const SCORE_MIDPOINT: f64 = 3.0;

/// Scores the user assigned to a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub workflow_id: String,
    pub automation_potential: f64,
    pub cognitive_load: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Quadrant of the 2×2 matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quadrant {
    /// High automation potential, low cognitive load
    QuickWin,
    /// High automation potential, high cognitive load
    Strategic,
    /// Low automation potential, low cognitive load
    Delegate,
    /// Low automation potential, high cognitive load
    Maintain,
}

impl Quadrant {
    /// Classify a pair of scores; values outside the scale are clamped
    pub fn classify(automation_potential: f64, cognitive_load: f64) -> Self {
        let high = |score: f64| score.clamp(SCORE_MIN, SCORE_MAX) >= SCORE_MIDPOINT;
        match (high(automation_potential), high(cognitive_load)) {
            (true, false) => Self::QuickWin,
            (true, true) => Self::Strategic,
            (false, false) => Self::Delegate,
            (false, true) => Self::Maintain,
        }
    }

    pub const fn all() -> [Self; 4] {
        [Self::QuickWin, Self::Strategic, Self::Delegate, Self::Maintain]
    }

    /// Italian label shown in reports and prompts
    pub const fn label(self) -> &'static str {
        match self {
            Self::QuickWin => "Quick win (automatizzare subito)",
            Self::Strategic => "Progetto strategico (automazione assistita)",
            Self::Delegate => "Da semplificare o delegare",
            Self::Maintain => "Competenza umana da preservare",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Evaluation {
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::classify(self.automation_potential, self.cognitive_load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_corners() {
        assert_eq!(Quadrant::classify(5.0, 1.0), Quadrant::QuickWin);
        assert_eq!(Quadrant::classify(5.0, 5.0), Quadrant::Strategic);
        assert_eq!(Quadrant::classify(1.0, 1.0), Quadrant::Delegate);
        assert_eq!(Quadrant::classify(1.0, 5.0), Quadrant::Maintain);
    }

    #[test]
    fn midpoint_counts_as_high() {
        assert_eq!(Quadrant::classify(3.0, 2.9), Quadrant::QuickWin);
        assert_eq!(Quadrant::classify(2.9, 3.0), Quadrant::Maintain);
    }

    #[test]
    fn out_of_scale_scores_are_clamped() {
        assert_eq!(Quadrant::classify(42.0, -3.0), Quadrant::QuickWin);
    }

    #[test]
    fn evaluation_deserializes_camel_case() {
        let eval: Evaluation = serde_json::from_value(serde_json::json!({
            "workflowId": "W001",
            "automationPotential": 4,
            "cognitiveLoad": 2
        }))
        .unwrap();
        assert_eq!(eval.quadrant(), Quadrant::QuickWin);
    }
}
