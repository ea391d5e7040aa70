//! Deterministic BPMN 2.0 generator used when no model output is usable

use std::fmt::Write;

use domain::Workflow;
use quick_xml::escape::escape;

const TASK_WIDTH: u32 = 100;
const TASK_HEIGHT: u32 = 80;
const EVENT_SIZE: u32 = 36;
const STEP_X: u32 = 160;
const ORIGIN_X: u32 = 152;
const LANE_Y: u32 = 100;

/// Render a linear process: start → input → main activity → output → end
pub fn render_bpmn(workflow: &Workflow) -> String {
    let title = if workflow.titolo.trim().is_empty() {
        "Processo"
    } else {
        workflow.titolo.trim()
    };

    let mut tasks: Vec<String> = Vec::new();
    if let Some(input) = non_blank(workflow.input.as_deref()) {
        tasks.push(format!("Ricezione input: {input}"));
    }
    tasks.push(match non_blank(workflow.tool.as_deref()) {
        Some(tool) => format!("{title} ({tool})"),
        None => title.to_string(),
    });
    if let Some(output) = non_blank(workflow.output.as_deref()) {
        tasks.push(format!("Produzione output: {output}"));
    }

    // Node ids in flow order
    let mut nodes = vec!["StartEvent_1".to_string()];
    nodes.extend((1..=tasks.len()).map(|i| format!("Activity_{i}")));
    nodes.push("EndEvent_1".to_string());

    let mut xml = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<bpmn:definitions xmlns:bpmn=\"http://www.omg.org/spec/BPMN/20100524/MODEL\" ",
        "xmlns:bpmndi=\"http://www.omg.org/spec/BPMN/20100524/DI\" ",
        "xmlns:dc=\"http://www.omg.org/spec/DD/20100524/DC\" ",
        "xmlns:di=\"http://www.omg.org/spec/DD/20100524/DI\" ",
        "id=\"Definitions_1\" targetNamespace=\"http://bpmn.io/schema/bpmn\">\n"
    ));

    let _ = writeln!(
        xml,
        "  <bpmn:process id=\"Process_1\" name=\"{}\" isExecutable=\"false\">",
        escape(title)
    );
    if let Some(description) = non_blank(Some(&workflow.descrizione)) {
        let _ = writeln!(
            xml,
            "    <bpmn:documentation>{}</bpmn:documentation>",
            escape(description)
        );
    }

    let flow_count = nodes.len() - 1;
    let _ = writeln!(
        xml,
        "    <bpmn:startEvent id=\"StartEvent_1\" name=\"Inizio\">\n      <bpmn:outgoing>Flow_1</bpmn:outgoing>\n    </bpmn:startEvent>"
    );
    for (i, name) in tasks.iter().enumerate() {
        let n = i + 1;
        let _ = writeln!(
            xml,
            "    <bpmn:task id=\"Activity_{n}\" name=\"{}\">\n      <bpmn:incoming>Flow_{n}</bpmn:incoming>\n      <bpmn:outgoing>Flow_{}</bpmn:outgoing>\n    </bpmn:task>",
            escape(name.as_str()),
            n + 1
        );
    }
    let _ = writeln!(
        xml,
        "    <bpmn:endEvent id=\"EndEvent_1\" name=\"Fine\">\n      <bpmn:incoming>Flow_{flow_count}</bpmn:incoming>\n    </bpmn:endEvent>"
    );
    for (i, pair) in nodes.windows(2).enumerate() {
        let _ = writeln!(
            xml,
            "    <bpmn:sequenceFlow id=\"Flow_{}\" sourceRef=\"{}\" targetRef=\"{}\" />",
            i + 1,
            pair[0],
            pair[1]
        );
    }
    xml.push_str("  </bpmn:process>\n");

    render_diagram(&mut xml, &nodes);
    xml.push_str("</bpmn:definitions>\n");
    xml
}

fn render_diagram(xml: &mut String, nodes: &[String]) {
    xml.push_str("  <bpmndi:BPMNDiagram id=\"BPMNDiagram_1\">\n");
    xml.push_str("    <bpmndi:BPMNPlane id=\"BPMNPlane_1\" bpmnElement=\"Process_1\">\n");

    let bounds: Vec<(u32, u32, u32, u32)> = (0..nodes.len())
        .map(|i| {
            let x = ORIGIN_X + STEP_X * u32::try_from(i).unwrap_or(u32::MAX / STEP_X);
            if i == 0 || i == nodes.len() - 1 {
                (x, LANE_Y + (TASK_HEIGHT - EVENT_SIZE) / 2, EVENT_SIZE, EVENT_SIZE)
            } else {
                (x, LANE_Y, TASK_WIDTH, TASK_HEIGHT)
            }
        })
        .collect();

    for (node, (x, y, w, h)) in nodes.iter().zip(&bounds) {
        let _ = writeln!(
            xml,
            "      <bpmndi:BPMNShape id=\"{node}_di\" bpmnElement=\"{node}\">\n        <dc:Bounds x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" />\n      </bpmndi:BPMNShape>"
        );
    }

    let mid_y = LANE_Y + TASK_HEIGHT / 2;
    for (i, pair) in bounds.windows(2).enumerate() {
        let (x0, _, w0, _) = pair[0];
        let (x1, _, _, _) = pair[1];
        let _ = writeln!(
            xml,
            "      <bpmndi:BPMNEdge id=\"Flow_{n}_di\" bpmnElement=\"Flow_{n}\">\n        <di:waypoint x=\"{}\" y=\"{mid_y}\" />\n        <di:waypoint x=\"{x1}\" y=\"{mid_y}\" />\n      </bpmndi:BPMNEdge>",
            x0 + w0,
            n = i + 1
        );
    }

    xml.push_str("    </bpmndi:BPMNPlane>\n");
    xml.push_str("  </bpmndi:BPMNDiagram>\n");
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
