//! Audio note → transcription → workflow extraction

use std::{fmt, sync::Arc};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use domain::{Workflow, WorkflowId};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{
    ai_output::{extract_json_array, preview},
    fallback_chain::{FallbackChain, llm_chain},
};
use crate::{
    error::ApplicationError,
    ports::{InferencePort, Prompt, TranscriptionPort},
};

/// Largest decoded upload accepted by the transcription provider
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

pub const DEFAULT_AUDIO_FILENAME: &str = "audio.webm";

const SUPPORTED_EXTENSIONS: &[&str] = &["webm", "mp3", "mp4", "m4a", "wav", "ogg", "flac"];

const SYSTEM_PROMPT: &str = "Estrai i processi aziendali descritti nella trascrizione. Rispondi \
esclusivamente con un array JSON; ogni elemento ha i campi titolo, descrizione, fase, tool, input, \
output, tempoMedio (minuti, numero), frequenza (volte al mese, numero), owner, painPoints. \
Ometti i campi sconosciuti. Se non ci sono processi rispondi con [].";

/// Decode a base64 upload, accepting an optional `data:` URL prefix
pub fn decode_audio_payload(payload: &str) -> Result<Vec<u8>, ApplicationError> {
    let encoded = payload
        .split_once(";base64,")
        .map_or(payload, |(_, data)| data);
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| ApplicationError::InvalidInput("Formato audio non valido".to_string()))?;

    if bytes.is_empty() {
        return Err(ApplicationError::InvalidInput("File audio vuoto".to_string()));
    }
    if bytes.len() > MAX_AUDIO_BYTES {
        return Err(ApplicationError::InvalidInput(
            "File audio troppo grande (massimo 25 MB)".to_string(),
        ));
    }
    Ok(bytes)
}

/// Normalise the client filename, rejecting unsupported formats
pub fn audio_filename(filename: Option<&str>) -> Result<String, ApplicationError> {
    let name = filename
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_AUDIO_FILENAME);
    // Drop any client-side directory components
    let name = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);

    let supported = name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if !supported {
        return Err(ApplicationError::InvalidInput(
            "Formato audio non supportato".to_string(),
        ));
    }
    Ok(name.to_string())
}

#[derive(Debug, Clone)]
pub struct AudioExtraction {
    pub transcription: String,
    pub workflows: Vec<Workflow>,
    pub source: String,
}

pub struct AudioWorkflowService {
    transcriber: Arc<dyn TranscriptionPort>,
    chain: FallbackChain<String, Vec<Workflow>>,
}

impl fmt::Debug for AudioWorkflowService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioWorkflowService")
            .field("strategies", &self.chain.labels())
            .finish_non_exhaustive()
    }
}

impl AudioWorkflowService {
    pub fn new(transcriber: Arc<dyn TranscriptionPort>, routes: &[Arc<dyn InferencePort>]) -> Self {
        Self {
            transcriber,
            chain: llm_chain(routes, build_prompt, parse_workflows),
        }
    }

    /// Transcribe a base64 upload and extract the workflows it describes
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn process(
        &self,
        payload: &str,
        filename: Option<&str>,
    ) -> Result<AudioExtraction, ApplicationError> {
        let filename = audio_filename(filename)?;
        let audio = decode_audio_payload(payload)?;
        let size_bytes = audio.len();

        let transcription = self.transcriber.transcribe(audio, filename).await?;
        let transcription = transcription.trim().to_string();
        if transcription.is_empty() {
            warn!(size_bytes, "Empty transcription");
            return Err(ApplicationError::InvalidInput(
                "Nessun contenuto rilevato nell'audio".to_string(),
            ));
        }

        let outcome = self.chain.run(&transcription).await?;
        info!(
            size_bytes,
            workflows = outcome.value.len(),
            source = %outcome.strategy,
            "Workflows extracted from audio"
        );

        Ok(AudioExtraction {
            transcription,
            workflows: outcome.value,
            source: outcome.strategy,
        })
    }
}

// Signature fixed by the chain input type
#[allow(clippy::ptr_arg)]
fn build_prompt(transcription: &String) -> Prompt {
    Prompt::new(SYSTEM_PROMPT, format!("Trascrizione:\n\"\"\"\n{transcription}\n\"\"\""))
        .with_temperature(0.1)
        .with_max_tokens(4096)
}

/// Parse the model's JSON array into workflows with sequential ids
///
/// Items that are not objects or have no title are skipped.
pub fn parse_workflows(raw: &str) -> Result<Vec<Workflow>, ApplicationError> {
    let invalid = |reason: String| ApplicationError::InvalidAiResponse {
        reason,
        preview: preview(raw),
    };

    let array = extract_json_array(raw).ok_or_else(|| invalid("no JSON array".to_string()))?;
    let items: Vec<Value> =
        serde_json::from_str(array).map_err(|e| invalid(format!("malformed JSON: {e}")))?;

    let workflows = items
        .into_iter()
        .filter_map(|item| item.as_object().map(|o| Value::Object(lenient_numbers(o.clone()))))
        .filter_map(|item| serde_json::from_value::<Workflow>(item).ok())
        .filter(|w| !w.titolo.trim().is_empty())
        .enumerate()
        .map(|(position, workflow)| workflow.with_id(WorkflowId::from_position(position)))
        .collect();

    Ok(workflows)
}

/// Models often quote numbers (`"tempoMedio": "30"`); coerce those fields
fn lenient_numbers(mut object: serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
    for key in ["tempoMedio", "frequenza"] {
        let coerced = match object.get(key) {
            Some(Value::String(s)) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            Some(Value::Number(_)) | None => continue,
            Some(_) => None,
        };
        match coerced {
            Some(value) => {
                object.insert(key.to_string(), value);
            },
            None => {
                object.remove(key);
            },
        }
    }
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InferenceResult, MockInferencePort, MockTranscriptionPort};

    fn route(content: &'static str) -> Arc<dyn InferencePort> {
        let mut mock = MockInferencePort::new();
        mock.expect_label().return_const("groq/primary".to_string());
        mock.expect_complete().returning(move |_| {
            Ok(InferenceResult {
                content: content.to_string(),
                model: "primary".to_string(),
                tokens_used: None,
                latency_ms: 1,
            })
        });
        Arc::new(mock)
    }

    fn transcriber(text: &'static str) -> Arc<dyn TranscriptionPort> {
        let mut mock = MockTranscriptionPort::new();
        mock.expect_transcribe()
            .returning(move |_, _| Ok(text.to_string()));
        Arc::new(mock)
    }

    #[test]
    fn decode_accepts_data_url() {
        let bytes = decode_audio_payload("data:audio/webm;base64,AAEC").unwrap();
        assert_eq!(bytes, vec![0, 1, 2]);
    }

    #[test]
    fn decode_rejects_garbage_and_empty() {
        assert!(matches!(
            decode_audio_payload("%%%"),
            Err(ApplicationError::InvalidInput(m)) if m == "Formato audio non valido"
        ));
        assert!(matches!(
            decode_audio_payload(""),
            Err(ApplicationError::InvalidInput(m)) if m == "File audio vuoto"
        ));
    }

    #[test]
    fn filename_defaults_and_whitelist() {
        assert_eq!(audio_filename(None).unwrap(), DEFAULT_AUDIO_FILENAME);
        assert_eq!(audio_filename(Some("C:\\note\\call.MP3")).unwrap(), "call.MP3");
        assert!(audio_filename(Some("virus.exe")).is_err());
        assert!(audio_filename(Some("senza_estensione")).is_err());
    }

    #[test]
    fn workflows_get_sequential_ids() {
        let raw = r#"```json
[
  {"titolo": "Ordini", "descrizione": "Inserimento ordini", "tempoMedio": "15", "frequenza": 40},
  {"descrizione": "senza titolo"},
  "non un oggetto",
  {"titolo": "Spedizioni", "id": "X9", "frequenza": "tante"}
]
```"#;
        let workflows = parse_workflows(raw).unwrap();
        assert_eq!(workflows.len(), 2);
        assert_eq!(workflows[0].id.as_deref(), Some("W001"));
        assert_eq!(workflows[0].tempo_medio, Some(15.0));
        assert_eq!(workflows[1].id.as_deref(), Some("W002"));
        assert_eq!(workflows[1].frequenza, None);
    }

    #[test]
    fn malformed_json_reports_preview() {
        match parse_workflows("[{\"titolo\": \"A\",]") {
            Err(ApplicationError::InvalidAiResponse { reason, preview }) => {
                assert!(reason.starts_with("malformed JSON"));
                assert_eq!(preview, "[{\"titolo\": \"A\",]");
            },
            other => unreachable!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_workflows("[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn process_runs_full_pipeline() {
        let service = AudioWorkflowService::new(
            transcriber("Ogni mese preparo le buste paga."),
            &[route(r#"[{"titolo": "Buste paga", "frequenza": 1}]"#)],
        );
        let extraction = service.process("AAEC", Some("nota.wav")).await.unwrap();
        assert_eq!(extraction.transcription, "Ogni mese preparo le buste paga.");
        assert_eq!(extraction.workflows.len(), 1);
        assert_eq!(extraction.workflows[0].id.as_deref(), Some("W001"));
    }

    #[tokio::test]
    async fn silent_audio_is_rejected() {
        let service = AudioWorkflowService::new(transcriber("   "), &[route("[]")]);
        let err = service.process("AAEC", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidInput(m) if m == "Nessun contenuto rilevato nell'audio"));
    }
}
