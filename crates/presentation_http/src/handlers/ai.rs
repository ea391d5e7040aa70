//! BPMN and VBA generation handlers

use application::ArtifactRequest;
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use domain::{Workflow, null_as_default};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::ApiError,
    middleware::{FieldRule, ItemKind, ValidatedJson, ValidationSchema},
    state::AppState,
};

const MAX_RELATED: usize = 50;

/// Body shared by both generators
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub workflow: Workflow,
    #[serde(default, deserialize_with = "null_as_default")]
    pub related_workflows: Vec<Workflow>,
}

impl From<GenerateRequest> for ArtifactRequest {
    fn from(request: GenerateRequest) -> Self {
        Self {
            workflow: request.workflow,
            related: request.related_workflows,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BpmnResponse {
    pub bpmn_xml: String,
    pub timestamp: DateTime<Utc>,
    /// Present (and true) only when the local template produced the diagram
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    pub source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VbaResponse {
    pub vba_code: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    pub source: String,
}

pub fn schema() -> ValidationSchema {
    let text = |max| FieldRule::string().length(None, Some(max));
    ValidationSchema::new()
        .field("workflow", FieldRule::object().required())
        .field(
            "workflow.titolo",
            FieldRule::string().required().length(Some(1), Some(200)),
        )
        .field("workflow.descrizione", text(5000))
        .field("workflow.tool", text(1000))
        .field("workflow.input", text(1000))
        .field("workflow.output", text(1000))
        .field("workflow.painPoints", text(2000))
        .field("workflow.owner", text(200))
        .field(
            "relatedWorkflows",
            FieldRule::array()
                .items(ItemKind::Object)
                .length(None, Some(MAX_RELATED)),
        )
}

#[instrument(skip(state, request), fields(related = request.related_workflows.len()))]
pub async fn generate_bpmn(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<GenerateRequest>,
) -> Result<Json<BpmnResponse>, ApiError> {
    let artifact = state.bpmn.generate(&request.into()).await?;
    Ok(Json(BpmnResponse {
        bpmn_xml: artifact.content,
        timestamp: artifact.generated_at,
        fallback: artifact.fallback.then_some(true),
        source: artifact.source,
    }))
}

#[instrument(skip(state, request), fields(related = request.related_workflows.len()))]
pub async fn generate_vba(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<GenerateRequest>,
) -> Result<Json<VbaResponse>, ApiError> {
    let artifact = state.vba.generate(&request.into()).await?;
    Ok(Json(VbaResponse {
        vba_code: artifact.content,
        timestamp: artifact.generated_at,
        fallback: artifact.fallback.then_some(true),
        source: artifact.source,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::middleware::validation::validate;

    #[test]
    fn request_accepts_camel_case_related_list() {
        let request: GenerateRequest = serde_json::from_value(json!({
            "workflow": {"titolo": "Fatture", "painPoints": "copia-incolla"},
            "relatedWorkflows": [{"titolo": "Solleciti"}]
        }))
        .unwrap();
        assert_eq!(request.workflow.pain_points.as_deref(), Some("copia-incolla"));
        assert_eq!(request.related_workflows.len(), 1);
    }

    #[test]
    fn schema_requires_workflow_title() {
        let violations = validate(&json!({"workflow": {"descrizione": "x"}}), &schema());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "workflow.titolo");

        let violations = validate(&json!({}), &schema());
        assert!(violations.iter().any(|v| v.field == "workflow"));
    }

    #[test]
    fn schema_limits_related_workflows() {
        let related: Vec<_> = (0..=MAX_RELATED).map(|i| json!({"titolo": i.to_string()})).collect();
        let violations = validate(
            &json!({"workflow": {"titolo": "A"}, "relatedWorkflows": related}),
            &schema(),
        );
        assert_eq!(violations[0].field, "relatedWorkflows");
    }

    #[test]
    fn fallback_flag_is_omitted_when_false() {
        let body = serde_json::to_value(VbaResponse {
            vba_code: "Sub A()\nEnd Sub".to_string(),
            timestamp: Utc::now(),
            fallback: None,
            source: "groq/llama".to_string(),
        })
        .unwrap();
        assert!(body.get("fallback").is_none());
        assert_eq!(body["vbaCode"], "Sub A()\nEnd Sub");
    }
}
