use crate::config::Direction;
use crate::ir::Scene;
use crate::layout::LayoutOutcome;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub scope: String,
    pub direction: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub moved: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub choice: Option<String>,
}

impl LayoutDump {
    pub fn from_outcome(
        outcome: &LayoutOutcome,
        scene: &Scene,
        scope: &str,
        direction: Direction,
    ) -> Self {
        let nodes = outcome
            .result
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: match scene.get(&node.id) {
                    Some(graph_node) if graph_node.payload.is_choice() => "choice".to_string(),
                    Some(_) => "text".to_string(),
                    None => "unknown".to_string(),
                },
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                moved: outcome.applied.contains(&node.id),
            })
            .collect();

        let edges = outcome
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.source.clone(),
                to: edge.target.clone(),
                choice: edge.label.clone(),
            })
            .collect();

        LayoutDump {
            scope: scope.to_string(),
            direction: format!("{direction:?}"),
            width: outcome.result.bounds.width(),
            height: outcome.result.bounds.height(),
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, dump: &LayoutDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DialogueNode, GraphEdge, GraphNode};
    use crate::layout::{LayoutResult, NodeBox, bounds_of};

    #[test]
    fn dump_marks_moved_nodes_and_kinds() {
        let scene = Scene::from_nodes([
            GraphNode::new("a", DialogueNode::text("Hi", Some("b"))),
            GraphNode::new("b", DialogueNode::choice("Pick", Vec::new())),
        ]);
        let nodes = vec![
            NodeBox {
                id: "a".into(),
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 50.0,
            },
            NodeBox {
                id: "b".into(),
                x: 180.0,
                y: 0.0,
                width: 100.0,
                height: 80.0,
            },
        ];
        let bounds = bounds_of(&nodes);
        let outcome = LayoutOutcome {
            result: LayoutResult { nodes, bounds },
            applied: vec!["b".to_string()],
            edges: vec![GraphEdge::new("a", "b", None)],
        };
        let dump = LayoutDump::from_outcome(&outcome, &scene, "canvas", Direction::LeftRight);
        assert_eq!(dump.width, 280.0);
        assert_eq!(dump.height, 80.0);
        assert!(!dump.nodes[0].moved);
        assert!(dump.nodes[1].moved);
        assert_eq!(dump.nodes[1].kind, "choice");

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["edges"][0]["from"], "a");
        assert_eq!(json["direction"], "LeftRight");
    }
}
