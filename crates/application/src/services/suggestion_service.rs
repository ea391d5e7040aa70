//! Improvement suggestions from the evaluation matrix

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use domain::{Evaluation, Quadrant, Workflow};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{
    ai_output::preview,
    fallback_chain::{FallbackChain, llm_chain},
};
use crate::{
    error::ApplicationError,
    ports::{InferencePort, Prompt},
};

/// Hourly cost assumed when the client does not send one (EUR)
pub const DEFAULT_HOURLY_COST: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    General,
    Automation,
    Prioritization,
    Roi,
}

impl SuggestionKind {
    const fn instructions(self) -> &'static str {
        match self {
            Self::General => {
                "Fornisci una panoramica dello stato dei processi e i tre prossimi passi più utili."
            },
            Self::Automation => {
                "Per i processi quick win e strategici proponi come automatizzarli, indicando \
                 strumenti concreti (macro VBA, Power Automate, integrazioni API) e i rischi."
            },
            Self::Prioritization => {
                "Proponi un ordine di priorità motivato, bilanciando impatto economico, \
                 facilità di automazione e carico cognitivo."
            },
            Self::Roi => {
                "Stima il ritorno dell'investimento dell'automazione usando i costi mensili \
                 indicati, con ipotesi esplicite sui tempi di implementazione."
            },
        }
    }
}

impl FromStr for SuggestionKind {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "automation" => Ok(Self::Automation),
            "prioritization" => Ok(Self::Prioritization),
            "roi" => Ok(Self::Roi),
            _ => Err(ApplicationError::InvalidInput(
                "Tipo di suggerimento non valido".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub kind: SuggestionKind,
    pub workflows: Vec<Workflow>,
    pub evaluations: Vec<Evaluation>,
    /// Hourly labour cost in EUR
    pub hourly_cost: Option<f64>,
}

/// One evaluated workflow placed on the matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixEntry {
    pub workflow_id: String,
    pub titolo: String,
    pub quadrant: Quadrant,
    pub monthly_cost: Option<f64>,
}

/// Evaluations grouped by quadrant
#[derive(Debug, Clone, Default)]
pub struct MatrixReport {
    pub entries: Vec<MatrixEntry>,
    /// Workflows without an evaluation
    pub unevaluated: Vec<String>,
}

impl MatrixReport {
    pub fn build(workflows: &[Workflow], evaluations: &[Evaluation], hourly_cost: f64) -> Self {
        let by_id: HashMap<&str, &Workflow> = workflows
            .iter()
            .filter_map(|w| w.id.as_deref().map(|id| (id, w)))
            .collect();

        let entries: Vec<MatrixEntry> = evaluations
            .iter()
            .map(|eval| {
                let workflow = by_id.get(eval.workflow_id.as_str());
                MatrixEntry {
                    workflow_id: eval.workflow_id.clone(),
                    titolo: workflow.map_or_else(|| eval.workflow_id.clone(), |w| w.titolo.clone()),
                    quadrant: eval.quadrant(),
                    monthly_cost: workflow.and_then(|w| w.monthly_cost(hourly_cost)),
                }
            })
            .collect();

        let unevaluated = workflows
            .iter()
            .filter(|w| {
                w.id.as_deref()
                    .is_none_or(|id| !evaluations.iter().any(|e| e.workflow_id == id))
            })
            .map(|w| w.titolo.clone())
            .collect();

        Self {
            entries,
            unevaluated,
        }
    }

    pub fn in_quadrant(&self, quadrant: Quadrant) -> impl Iterator<Item = &MatrixEntry> {
        self.entries.iter().filter(move |e| e.quadrant == quadrant)
    }

    pub fn total_monthly_cost(&self) -> f64 {
        self.entries.iter().filter_map(|e| e.monthly_cost).sum()
    }

    /// Plain-text rendering for the prompt
    pub fn render(&self) -> String {
        let mut out = String::new();
        for quadrant in Quadrant::all() {
            let items: Vec<String> = self
                .in_quadrant(quadrant)
                .map(|e| match e.monthly_cost {
                    Some(cost) => format!("  - {} ({}): {cost:.0} €/mese", e.titolo, e.workflow_id),
                    None => format!("  - {} ({})", e.titolo, e.workflow_id),
                })
                .collect();
            if items.is_empty() {
                continue;
            }
            out.push_str(quadrant.label());
            out.push_str(":\n");
            out.push_str(&items.join("\n"));
            out.push('\n');
        }
        if !self.unevaluated.is_empty() {
            out.push_str("Non ancora valutati: ");
            out.push_str(&self.unevaluated.join(", "));
            out.push('\n');
        }
        out.push_str(&format!(
            "Costo mensile complessivo stimato: {:.0} €\n",
            self.total_monthly_cost()
        ));
        out
    }
}

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub text: String,
    /// Label of the route that answered
    pub model: String,
}

pub struct SuggestionService {
    chain: FallbackChain<SuggestionRequest, String>,
}

impl fmt::Debug for SuggestionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestionService")
            .field("strategies", &self.chain.labels())
            .finish()
    }
}

impl SuggestionService {
    pub fn new(routes: &[Arc<dyn InferencePort>]) -> Self {
        Self {
            chain: llm_chain(routes, build_prompt, parse_suggestion),
        }
    }

    #[instrument(skip(self, request), fields(kind = ?request.kind, workflows = request.workflows.len()))]
    pub async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion, ApplicationError> {
        let outcome = self.chain.run(request).await?;
        info!(source = %outcome.strategy, "Suggestion generated");
        Ok(Suggestion {
            text: outcome.value,
            model: outcome.strategy,
        })
    }
}

fn build_prompt(request: &SuggestionRequest) -> Prompt {
    let hourly_cost = request.hourly_cost.unwrap_or(DEFAULT_HOURLY_COST);
    let report = MatrixReport::build(&request.workflows, &request.evaluations, hourly_cost);
    let system = format!(
        "Sei un consulente di process automation. Analizzi una matrice 2×2 \
         (potenziale di automazione / carico cognitivo). Rispondi in italiano con elenchi puntati. {}",
        request.kind.instructions()
    );
    let user = format!(
        "Processi mappati: {}. Costo orario: {hourly_cost:.2} €.\n\n{}",
        request.workflows.len(),
        report.render()
    );
    Prompt::new(system, user).with_temperature(0.5).with_max_tokens(2048)
}

fn parse_suggestion(raw: &str) -> Result<String, ApplicationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ApplicationError::InvalidAiResponse {
            reason: "empty suggestion".to_string(),
            preview: preview(raw),
        });
    }
    Ok(text.to_string())
}
