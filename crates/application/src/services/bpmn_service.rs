//! BPMN diagram generation

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use domain::Workflow;
use quick_xml::{events::Event, reader::Reader};
use tracing::{info, instrument};

use super::{
    ai_output::{extract_xml_document, preview},
    bpmn_template::render_bpmn,
    fallback_chain::{FallbackChain, LocalStrategy, llm_chain},
    prompts::{describe_workflow, related_titles},
};
use crate::{
    error::ApplicationError,
    ports::{InferencePort, Prompt},
};

/// Input shared by the BPMN and VBA generators
#[derive(Debug, Clone, Default)]
pub struct ArtifactRequest {
    pub workflow: Workflow,
    pub related: Vec<Workflow>,
}

/// A generated document and how it was produced
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub content: String,
    /// Label of the strategy that produced the content
    pub source: String,
    pub fallback: bool,
    pub generated_at: DateTime<Utc>,
}

const LOCAL_LABEL: &str = "local-template";

const SYSTEM_PROMPT: &str = "Sei un esperto di modellazione BPMN 2.0. Rispondi esclusivamente \
con un documento XML BPMN 2.0 valido, compatibile con bpmn.io, comprensivo di sezione BPMNDiagram. \
Non aggiungere spiegazioni.";

pub struct BpmnService {
    chain: FallbackChain<ArtifactRequest, String>,
}

impl fmt::Debug for BpmnService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BpmnService")
            .field("strategies", &self.chain.labels())
            .finish()
    }
}

impl BpmnService {
    /// Try the given routes in order, then the local template
    pub fn new(routes: &[Arc<dyn InferencePort>]) -> Self {
        let chain = llm_chain(routes, build_prompt, parse_bpmn)
            .then(LocalStrategy::new(LOCAL_LABEL, |r: &ArtifactRequest| render_bpmn(&r.workflow)));
        Self { chain }
    }

    #[instrument(skip(self, request), fields(titolo = %request.workflow.titolo))]
    pub async fn generate(
        &self,
        request: &ArtifactRequest,
    ) -> Result<GeneratedArtifact, ApplicationError> {
        let outcome = self.chain.run(request).await?;
        info!(source = %outcome.strategy, fallback = outcome.fallback, "BPMN generated");
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
        "Genera il diagramma BPMN 2.0 per il seguente processo.\n\n{}",
        describe_workflow(&request.workflow)
    );
    let related = related_titles(&request.related);
    if !related.is_empty() {
        user.push_str("\nProcessi collegati (da rappresentare come riferimenti):\n");
        user.push_str(&related);
    }
    Prompt::new(SYSTEM_PROMPT, user).with_temperature(0.2)
}

/// Extract and check a BPMN document from model output
///
/// The document must be well-formed, rooted at `definitions` and contain at
/// least one `process` element.
pub fn parse_bpmn(raw: &str) -> Result<String, ApplicationError> {
    let invalid = |reason: String| ApplicationError::InvalidAiResponse {
        reason,
        preview: preview(raw),
    };

    let xml = extract_xml_document(raw).ok_or_else(|| invalid("no BPMN document".to_string()))?;

    let mut reader = Reader::from_str(xml);
    let mut depth: usize = 0;
    let mut root_seen = false;
    let mut has_process = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if depth == 0 {
                    if root_seen || name.as_ref() != b"definitions" {
                        return Err(invalid("root element is not definitions".to_string()));
                    }
                    root_seen = true;
                }
                has_process |= name.as_ref() == b"process";
                depth += 1;
            },
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    return Err(invalid("empty root element".to_string()));
                }
                has_process |= e.local_name().as_ref() == b"process";
            },
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid("unbalanced closing tag".to_string()))?;
            },
            Ok(Event::Eof) => break,
            Ok(_) => {},
            Err(e) => return Err(invalid(format!("malformed XML: {e}"))),
        }
    }

    if depth != 0 || !root_seen {
        return Err(invalid("unclosed elements".to_string()));
    }
    if !has_process {
        return Err(invalid("no process element".to_string()));
    }
    Ok(xml.to_string())
}
