//! AI suggestions over the evaluated workflow portfolio

use application::{SuggestionKind, SuggestionRequest};
use axum::{Json, extract::State};
use domain::{Evaluation, Workflow};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::ApiError,
    middleware::{FieldRule, ItemKind, ValidatedJson, ValidationSchema},
    state::AppState,
};

const MAX_ITEMS: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    /// Hourly labour cost in EUR
    #[serde(default)]
    pub costo_orario: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub suggestion: String,
    pub model: String,
}

pub fn schema() -> ValidationSchema {
    ValidationSchema::new()
        .field("type", FieldRule::string().required().length(Some(1), Some(32)))
        .field(
            "workflows",
            FieldRule::array()
                .required()
                .items(ItemKind::Object)
                .length(None, Some(MAX_ITEMS)),
        )
        .field(
            "evaluations",
            FieldRule::array()
                .required()
                .items(ItemKind::Object)
                .length(None, Some(MAX_ITEMS)),
        )
        .field("costoOrario", FieldRule::number().range(Some(0.0), Some(10_000.0)))
}

#[instrument(
    skip(state, request),
    fields(kind = %request.kind, workflows = request.workflows.len())
)]
pub async fn suggestions(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SuggestionsRequest>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let kind: SuggestionKind = request.kind.parse()?;
    let suggestion = state
        .suggestions
        .suggest(&SuggestionRequest {
            kind,
            workflows: request.workflows,
            evaluations: request.evaluations,
            hourly_cost: request.costo_orario,
        })
        .await?;

    Ok(Json(SuggestionsResponse {
        success: true,
        suggestion: suggestion.text,
        model: suggestion.model,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::middleware::validation::validate;

    #[test]
    fn request_maps_type_and_hourly_cost() {
        let request: SuggestionsRequest = serde_json::from_value(json!({
            "type": "roi",
            "workflows": [{"id": "W001", "titolo": "Fatture"}],
            "evaluations": [],
            "costoOrario": 35.5
        }))
        .unwrap();
        assert_eq!(request.kind, "roi");
        assert_eq!(request.costo_orario, Some(35.5));
    }

    #[test]
    fn hourly_cost_is_range_checked() {
        let body = json!({"type": "general", "workflows": [], "evaluations": [], "costoOrario": -1});
        let violations = validate(&body, &schema());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "costoOrario");
    }

    #[test]
    fn arrays_are_required_and_bounded() {
        let violations = validate(&json!({"type": "general"}), &schema());
        assert_eq!(violations.len(), 2);

        let many: Vec<_> = (0..=MAX_ITEMS).map(|_| json!({})).collect();
        let body = json!({"type": "general", "workflows": many, "evaluations": []});
        assert_eq!(validate(&body, &schema())[0].field, "workflows");
    }
}
