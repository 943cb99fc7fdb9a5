use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::layout::{Position, Size};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl Choice {
    pub fn new(key: &str, text: &str, next: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            text: text.to_string(),
            next: next.map(str::to_string),
        }
    }

    /// Successor id, treating an empty string as unconnected.
    pub fn successor(&self) -> Option<&str> {
        self.next.as_deref().filter(|next| !next.is_empty())
    }
}

/// Dialogue payload carried by a scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DialogueNode {
    Text {
        #[serde(default)]
        text: String,
        #[serde(default, rename = "nextNodeKey")]
        next: Option<String>,
    },
    Choice {
        #[serde(default)]
        text: String,
        #[serde(default)]
        choices: Vec<Choice>,
    },
}

impl DialogueNode {
    pub fn text(text: &str, next: Option<&str>) -> Self {
        Self::Text {
            text: text.to_string(),
            next: next.map(str::to_string),
        }
    }

    pub fn choice(text: &str, choices: Vec<Choice>) -> Self {
        Self::Choice {
            text: text.to_string(),
            choices,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Choice { .. })
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Text { text, .. } | Self::Choice { text, .. } => text,
        }
    }

    pub fn choices(&self) -> &[Choice] {
        match self {
            Self::Text { .. } => &[],
            Self::Choice { choices, .. } => choices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// Last rendered width; `0.0` until the render layer reports one.
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub position: Position,
    pub payload: DialogueNode,
}

impl GraphNode {
    pub fn new(id: &str, payload: DialogueNode) -> Self {
        Self {
            id: id.to_string(),
            width: 0.0,
            height: 0.0,
            position: Position::default(),
            payload,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn rendered_size(&self) -> Option<Size> {
        if self.width > 0.0 && self.height > 0.0 {
            Some(Size::new(self.width, self.height))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(source: &str, target: &str, label: Option<&str>) -> Self {
        let id = match label {
            Some(key) => format!("{source}:{key}->{target}"),
            None => format!("{source}->{target}"),
        };
        Self {
            id,
            source: source.to_string(),
            target: target.to_string(),
            label: label.map(str::to_string),
        }
    }
}

/// All nodes on one canvas, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene {
    pub nodes: BTreeMap<String, GraphNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = GraphNode>) -> Self {
        let mut scene = Self::new();
        for node in nodes {
            scene.insert(node);
        }
        scene
    }

    pub fn insert(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn get(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.nodes.get(id).map(|node| node.position)
    }

    /// Returns `false` when the node is not on the canvas.
    pub fn set_position(&mut self, id: &str, position: Position) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Records a footprint reported by the render layer.
    pub fn set_rendered_size(&mut self, id: &str, size: Size) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.width = size.width;
                node.height = size.height;
                true
            }
            None => false,
        }
    }
}
