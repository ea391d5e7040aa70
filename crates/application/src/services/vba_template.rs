//! Deterministic VBA macro skeleton

use std::fmt::Write;

use domain::Workflow;

/// VBA identifier derived from a title: `"Report vendite mensile"` → `ReportVenditeMensile`
pub fn macro_name(title: &str) -> String {
    let mut name: String = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect();

    if name.is_empty() {
        return "Automazione".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Macro");
    }
    name.truncate(60);
    name
}

/// Render a commented macro with error handling around the workflow steps
pub fn render_vba(workflow: &Workflow) -> String {
    let name = macro_name(&workflow.titolo);
    let mut code = String::from("Option Explicit\n\n");

    let _ = writeln!(code, "' {}", comment(&workflow.titolo));
    for line in workflow.descrizione.lines().filter(|l| !l.trim().is_empty()) {
        let _ = writeln!(code, "' {}", comment(line));
    }
    if let Some(tool) = workflow.tool.as_deref().filter(|t| !t.trim().is_empty()) {
        let _ = writeln!(code, "' Strumenti: {}", comment(tool));
    }

    let _ = writeln!(code, "Public Sub {name}()");
    code.push_str("    On Error GoTo GestioneErrore\n");
    code.push_str("    Application.ScreenUpdating = False\n\n");

    let mut step = 1;
    if let Some(input) = workflow.input.as_deref().filter(|t| !t.trim().is_empty()) {
        let _ = writeln!(code, "    ' Passo {step}: acquisizione input ({})", comment(input));
        code.push_str("    Dim wsInput As Worksheet\n");
        code.push_str("    Set wsInput = ThisWorkbook.Worksheets(1)\n\n");
        step += 1;
    }
    let _ = writeln!(code, "    ' Passo {step}: elaborazione");
    code.push_str("    Dim ultimaRiga As Long\n");
    code.push_str("    ultimaRiga = ActiveSheet.Cells(ActiveSheet.Rows.Count, 1).End(xlUp).Row\n\n");
    step += 1;
    if let Some(output) = workflow.output.as_deref().filter(|t| !t.trim().is_empty()) {
        let _ = writeln!(code, "    ' Passo {step}: produzione output ({})", comment(output));
        code.push('\n');
    }

    code.push_str("    Application.ScreenUpdating = True\n");
    let _ = writeln!(
        code,
        "    MsgBox \"{} completato\", vbInformation",
        workflow.titolo.replace('"', "\"\"").lines().next().unwrap_or_default()
    );
    code.push_str("    Exit Sub\n\n");
    code.push_str("GestioneErrore:\n");
    code.push_str("    Application.ScreenUpdating = True\n");
    code.push_str("    MsgBox \"Errore: \" & Err.Description, vbCritical\n");
    code.push_str("End Sub\n");
    code
}

/// Keep comments on a single line
fn comment(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vba_service::parse_vba;

    #[test]
    fn macro_names_are_identifiers() {
        assert_eq!(macro_name("Report vendite mensile"), "ReportVenditeMensile");
        assert_eq!(macro_name("2024 chiusura"), "Macro2024Chiusura");
        assert_eq!(macro_name("àèì"), "Automazione");
        assert_eq!(macro_name(""), "Automazione");
    }

    #[test]
    fn template_is_a_complete_sub() {
        let wf = Workflow {
            input: Some("Estratto conto".to_string()),
            output: Some("Riepilogo".to_string()),
            ..Workflow::new("Riconciliazione bancaria", "Confronto movimenti\ncon registrazioni")
        };
        let code = render_vba(&wf);
        assert!(code.starts_with("Option Explicit"));
        assert!(code.contains("Public Sub RiconciliazioneBancaria()"));
        assert!(code.contains("' con registrazioni"));
        assert!(code.contains("Passo 3: produzione output"));
        assert!(code.trim_end().ends_with("End Sub"));
        assert!(parse_vba(&code).is_ok());
    }

    #[test]
    fn quotes_in_title_are_doubled() {
        let code = render_vba(&Workflow::new("Report \"Q1\"", ""));
        assert!(code.contains("MsgBox \"Report \"\"Q1\"\" completato\""));
    }
}
