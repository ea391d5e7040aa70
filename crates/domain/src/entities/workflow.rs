//! Workflow entity as mapped on the canvas

use serde::{Deserialize, Serialize};

use crate::{serde_null::null_as_default, value_objects::WorkflowId};

/// A business process step described by the user
///
/// Field names follow the canvas JSON contract (Italian, camelCase).
/// Every attribute is optional at this level; endpoints declare which ones
/// they require.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub titolo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub descrizione: String,
    /// Process phase the step belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Average minutes per execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_medio: Option<f64>,
    /// Executions per month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequenza: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_points: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Workflow {
    pub fn new(titolo: impl Into<String>, descrizione: impl Into<String>) -> Self {
        Self {
            titolo: titolo.into(),
            descrizione: descrizione.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: WorkflowId) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Minutes spent on this workflow per month, when both timing figures are known
    pub fn monthly_minutes(&self) -> Option<f64> {
        match (self.tempo_medio, self.frequenza) {
            (Some(minutes), Some(per_month)) if minutes >= 0.0 && per_month >= 0.0 => {
                Some(minutes * per_month)
            },
            _ => None,
        }
    }

    /// Monthly cost at the given hourly rate
    pub fn monthly_cost(&self, hourly_rate: f64) -> Option<f64> {
        self.monthly_minutes().map(|m| m / 60.0 * hourly_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_canvas_payload() {
        let json = serde_json::json!({
            "titolo": "Fatturazione",
            "descrizione": "Emissione fatture mensili",
            "tool": "Excel",
            "painPoints": "copia-incolla manuale",
            "tempoMedio": 30,
            "frequenza": 20
        });
        let wf: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(wf.titolo, "Fatturazione");
        assert_eq!(wf.pain_points.as_deref(), Some("copia-incolla manuale"));
        assert_eq!(wf.monthly_minutes(), Some(600.0));
    }

    #[test]
    fn null_text_fields_read_as_empty() {
        let json = serde_json::json!({"titolo": "Archivio", "descrizione": null, "tool": null});
        let wf: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(wf.descrizione, "");
        assert!(wf.tool.is_none());
    }

    #[test]
    fn monthly_cost_uses_hourly_rate() {
        let wf = Workflow {
            tempo_medio: Some(15.0),
            frequenza: Some(8.0),
            ..Workflow::new("Report", "")
        };
        assert_eq!(wf.monthly_cost(40.0), Some(80.0));
    }

    #[test]
    fn missing_timing_yields_no_cost() {
        let wf = Workflow::new("Report", "");
        assert_eq!(wf.monthly_cost(40.0), None);
    }

    #[test]
    fn with_id_formats_identifier() {
        let wf = Workflow::new("A", "B").with_id(WorkflowId::from_position(2));
        assert_eq!(wf.id.as_deref(), Some("W003"));
        let json = serde_json::to_value(&wf).unwrap();
        assert_eq!(json["id"], "W003");
        assert!(json.get("tool").is_none());
    }
}
