use serde::{Deserialize, Serialize};

use crate::config::{Direction, LayoutConfig};
use crate::ir::GraphEdge;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn approx_eq(self, other: Position, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(position: Position, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Traversal depth below the root. `Limited(1)` means direct successors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Depth {
    Limited(usize),
    Unbounded,
}

impl Depth {
    pub fn allows_descent(self, level: usize) -> bool {
        match self {
            Depth::Limited(max) => level < max,
            Depth::Unbounded => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest {
    pub root_id: String,
    pub depth: Depth,
    pub include_root: bool,
    pub anchor_id: Option<String>,
    pub direction: Direction,
    pub node_spacing: f32,
    pub rank_spacing: f32,
}

impl LayoutRequest {
    /// Direct successors of `node_id`, anchored on it.
    pub fn children(node_id: &str, config: &LayoutConfig) -> Self {
        Self::anchored(node_id, Depth::Limited(1), config)
    }

    /// Everything reachable from `node_id`, anchored on it.
    pub fn descendants(node_id: &str, config: &LayoutConfig) -> Self {
        Self::anchored(node_id, Depth::Unbounded, config)
    }

    fn anchored(node_id: &str, depth: Depth, config: &LayoutConfig) -> Self {
        Self {
            root_id: node_id.to_string(),
            depth,
            include_root: true,
            anchor_id: Some(node_id.to_string()),
            direction: config.direction,
            node_spacing: config.node_spacing,
            rank_spacing: config.rank_spacing,
        }
    }
}

/// Final top-left box of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBox {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeBox {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.width(), self.height())
    }

    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

/// Ordered node boxes plus the box enclosing all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub nodes: Vec<NodeBox>,
    pub bounds: Bounds,
}

impl LayoutResult {
    pub fn get(&self, id: &str) -> Option<&NodeBox> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        for node in &mut self.nodes {
            node.x += dx;
            node.y += dy;
        }
        self.bounds = self.bounds.translate(dx, dy);
    }

    pub fn extend(&mut self, other: LayoutResult) {
        self.nodes.extend(other.nodes);
        self.bounds = super::geometry::bounds_of(&self.nodes);
    }
}

/// Nodes and edges gathered for one layout run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

impl Collected {
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
