//! Shared prompt fragments

use std::fmt::Write;

use domain::Workflow;

/// Multi-line description of a workflow for inclusion in a prompt
pub fn describe_workflow(workflow: &Workflow) -> String {
    let mut out = format!("Titolo: {}\n", workflow.titolo);
    if !workflow.descrizione.is_empty() {
        let _ = writeln!(out, "Descrizione: {}", workflow.descrizione);
    }
    let optional = [
        ("Fase", workflow.fase.as_deref()),
        ("Strumenti", workflow.tool.as_deref()),
        ("Input", workflow.input.as_deref()),
        ("Output", workflow.output.as_deref()),
        ("Responsabile", workflow.owner.as_deref()),
        ("Criticità", workflow.pain_points.as_deref()),
        ("Note", workflow.note.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    if let Some(minutes) = workflow.tempo_medio {
        let _ = writeln!(out, "Tempo medio: {minutes} minuti");
    }
    if let Some(per_month) = workflow.frequenza {
        let _ = writeln!(out, "Frequenza: {per_month} volte al mese");
    }
    out
}

/// Bullet list of related workflow titles
pub fn related_titles(related: &[Workflow]) -> String {
    related
        .iter()
        .filter(|w| !w.titolo.trim().is_empty())
        .map(|w| format!("- {}", w.titolo))
        .collect::<Vec<_>>()
        .join("\n")
}
