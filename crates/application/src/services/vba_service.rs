//! VBA macro generation

use std::{fmt, sync::Arc};

use chrono::Utc;
use tracing::{info, instrument};

use super::{
    ai_output::{preview, strip_code_fences},
    bpmn_service::{ArtifactRequest, GeneratedArtifact},
    fallback_chain::{FallbackChain, LocalStrategy, llm_chain},
    prompts::{describe_workflow, related_titles},
    vba_template::render_vba,
};
use crate::{
    error::ApplicationError,
    ports::{InferencePort, Prompt},
};

const LOCAL_LABEL: &str = "local-template";

const SYSTEM_PROMPT: &str = "Sei un esperto sviluppatore VBA per Microsoft Excel. Rispondi solo con \
codice VBA completo e commentato in italiano, con Option Explicit e gestione degli errori. \
Non aggiungere spiegazioni fuori dal codice.";

pub struct VbaService {
    chain: FallbackChain<ArtifactRequest, String>,
}

impl fmt::Debug for VbaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VbaService")
            .field("strategies", &self.chain.labels())
            .finish()
    }
}

impl VbaService {
    pub fn new(routes: &[Arc<dyn InferencePort>]) -> Self {
        let chain = llm_chain(routes, build_prompt, parse_vba)
            .then(LocalStrategy::new(LOCAL_LABEL, |r: &ArtifactRequest| render_vba(&r.workflow)));
        Self { chain }
    }

    #[instrument(skip(self, request), fields(titolo = %request.workflow.titolo))]
    pub async fn generate(
        &self,
        request: &ArtifactRequest,
    ) -> Result<GeneratedArtifact, ApplicationError> {
        let outcome = self.chain.run(request).await?;
        info!(source = %outcome.strategy, fallback = outcome.fallback, "VBA generated");
        Ok(GeneratedArtifact {
            content: outcome.value,
            source: outcome.strategy,
            fallback: outcome.fallback,
            generated_at: Utc::now(),
        })
    }
}

fn build_prompt(request: &ArtifactRequest) -> Prompt {
    let mut user = format!(
        "Scrivi una macro VBA che automatizzi il seguente processo.\n\n{}",
        describe_workflow(&request.workflow)
    );
    let related = related_titles(&request.related);
    if !related.is_empty() {
        user.push_str("\nProcessi collegati:\n");
        user.push_str(&related);
    }
    Prompt::new(SYSTEM_PROMPT, user).with_temperature(0.2)
}

/// Extract VBA code from model output
///
/// The code must contain at least one `Sub`/`Function` with its matching
/// `End Sub`/`End Function`.
pub fn parse_vba(raw: &str) -> Result<String, ApplicationError> {
    let code = strip_code_fences(raw);

    let mut opened = 0_usize;
    let mut closed = 0_usize;
    for line in code.lines() {
        let lower = line.trim().to_ascii_lowercase();
        let decl = lower
            .strip_prefix("public ")
            .or_else(|| lower.strip_prefix("private "))
            .unwrap_or(&lower);
        if decl.starts_with("sub ") || decl.starts_with("function ") {
            opened += 1;
        } else if lower.starts_with("end sub") || lower.starts_with("end function") {
            closed += 1;
        }
    }

    if opened == 0 || opened != closed {
        return Err(ApplicationError::InvalidAiResponse {
            reason: format!("expected matching Sub/End Sub blocks, found {opened} open and {closed} closed"),
            preview: preview(raw),
        });
    }
    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use domain::Workflow;

    use super::*;
    use crate::ports::{InferenceResult, MockInferencePort};

    fn route(content: &'static str) -> Arc<dyn InferencePort> {
        let mut mock = MockInferencePort::new();
        mock.expect_label().return_const("groq/primary".to_string());
        mock.expect_complete().returning(move |_| {
            Ok(InferenceResult {
                content: content.to_string(),
                model: "primary".to_string(),
                tokens_used: None,
                latency_ms: 3,
            })
        });
        Arc::new(mock)
    }

    #[test]
    fn parse_accepts_fenced_macro() {
        let raw = "```vba\nOption Explicit\nPublic Sub Test()\n    MsgBox \"ok\"\nEnd Sub\n```";
        let code = parse_vba(raw).unwrap();
        assert!(code.starts_with("Option Explicit"));
        assert!(code.ends_with("End Sub"));
    }

    #[test]
    fn parse_counts_functions() {
        let raw = "Private Function Somma(a, b)\nSomma = a + b\nEnd Function\nSub Main()\nEnd Sub";
        assert!(parse_vba(raw).is_ok());
    }

    #[test]
    fn parse_rejects_unterminated_sub() {
        assert!(parse_vba("Sub Main()\n    x = 1\n").is_err());
        assert!(parse_vba("Ecco una spiegazione senza codice").is_err());
    }

    #[tokio::test]
    async fn valid_output_is_returned() {
        let service = VbaService::new(&[route("Sub A()\nEnd Sub")]);
        let request = ArtifactRequest {
            workflow: Workflow::new("A", ""),
            related: Vec::new(),
        };
        let artifact = service.generate(&request).await.unwrap();
        assert_eq!(artifact.content, "Sub A()\nEnd Sub");
        assert!(!artifact.fallback);
    }

    #[tokio::test]
    async fn invalid_output_uses_template() {
        let service = VbaService::new(&[route("Non posso generare codice.")]);
        let request = ArtifactRequest {
            workflow: Workflow::new("Export clienti", ""),
            related: Vec::new(),
        };
        let artifact = service.generate(&request).await.unwrap();
        assert!(artifact.fallback);
        assert!(artifact.content.contains("Public Sub ExportClienti()"));
    }
}
