use std::collections::{HashMap, HashSet};

use crate::config::{Direction, LayoutConfig, RankAlign};
use crate::ir::GraphEdge;

use super::error::LayoutError;
use super::geometry::bounds_of;
use super::ranking::{compute_ranks, order_rank_nodes};
use super::types::{LayoutResult, NodeBox};

/// A node handed to the layered layout, already measured.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedNode {
    pub id: String,
    pub width: f32,
    pub height: f32,
}

impl SizedNode {
    pub fn new(id: &str, width: f32, height: f32) -> Self {
        Self {
            id: id.to_string(),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayeredOptions {
    pub direction: Direction,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub align: RankAlign,
    pub order_passes: usize,
}

impl LayeredOptions {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            direction: config.direction,
            node_spacing: config.node_spacing,
            rank_spacing: config.rank_spacing,
            align: config.align,
            order_passes: config.order_passes,
        }
    }
}

/// Rank/order layered graph drawing. Implementations return top-left boxes
/// in input order together with their bounding box.
pub trait LayeredLayout {
    fn layout(
        &self,
        nodes: &[SizedNode],
        edges: &[GraphEdge],
        options: &LayeredOptions,
    ) -> Result<LayoutResult, LayoutError>;
}

pub fn validate_input(nodes: &[SizedNode], edges: &[GraphEdge]) -> Result<(), LayoutError> {
    let mut ids: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if node.id.is_empty() {
            return Err(LayoutError::MalformedInput("node with empty id".to_string()));
        }
        if !ids.insert(node.id.as_str()) {
            return Err(LayoutError::DuplicateNode {
                id: node.id.clone(),
            });
        }
        let valid = |v: f32| v.is_finite() && v >= 0.0;
        if !valid(node.width) || !valid(node.height) {
            return Err(LayoutError::InvalidSize {
                id: node.id.clone(),
            });
        }
    }
    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !ids.contains(endpoint.as_str()) {
                return Err(LayoutError::UnknownEdgeEndpoint {
                    edge: edge.id.clone(),
                    id: endpoint.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Layered algorithms report node centers; the rest of the engine works with
/// top-left corners.
fn from_centers(
    nodes: &[SizedNode],
    centers: &HashMap<&str, (f32, f32)>,
) -> Result<LayoutResult, LayoutError> {
    let mut boxes = Vec::with_capacity(nodes.len());
    for node in nodes {
        let Some(&(cx, cy)) = centers.get(node.id.as_str()) else {
            return Err(LayoutError::MissingPosition {
                id: node.id.clone(),
            });
        };
        boxes.push(NodeBox {
            id: node.id.clone(),
            x: cx - node.width / 2.0,
            y: cy - node.height / 2.0,
            width: node.width,
            height: node.height,
        });
    }
    let bounds = bounds_of(&boxes);
    Ok(LayoutResult {
        nodes: boxes,
        bounds,
    })
}

/// Built-in longest-path layering with median ordering. Deterministic: equal
/// input always yields equal coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedLayout;

impl LayeredLayout for RankedLayout {
    fn layout(
        &self,
        nodes: &[SizedNode],
        edges: &[GraphEdge],
        options: &LayeredOptions,
    ) -> Result<LayoutResult, LayoutError> {
        validate_input(nodes, edges)?;
        if nodes.is_empty() {
            return Ok(LayoutResult::default());
        }

        let node_ids: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
        let node_order: HashMap<String, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        let ranks = compute_ranks(&node_ids, edges);
        let max_rank = ranks.values().copied().max().unwrap_or(0);

        let mut rank_nodes: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
        for id in &node_ids {
            let rank = ranks.get(id).copied().unwrap_or(0);
            rank_nodes[rank].push(id.clone());
        }
        order_rank_nodes(&mut rank_nodes, edges, &node_order, options.order_passes);

        let horizontal = options.direction.is_horizontal();
        let sizes: HashMap<&str, &SizedNode> =
            nodes.iter().map(|node| (node.id.as_str(), node)).collect();
        // extent along the rank axis and across it
        let extents = |id: &str| -> (f32, f32) {
            match sizes.get(id) {
                Some(node) if horizontal => (node.width, node.height),
                Some(node) => (node.height, node.width),
                None => (0.0, 0.0),
            }
        };

        let mut centers: HashMap<&str, (f32, f32)> = HashMap::with_capacity(nodes.len());
        let mut rank_start = 0.0f32;
        for bucket in &rank_nodes {
            let thickness = bucket
                .iter()
                .map(|id| extents(id.as_str()).0)
                .fold(0.0f32, f32::max);
            let span: f32 = bucket.iter().map(|id| extents(id.as_str()).1).sum::<f32>()
                + options.node_spacing * bucket.len().saturating_sub(1) as f32;
            let mut cursor = -span / 2.0;
            for id in bucket {
                let (along, across) = extents(id.as_str());
                let rank_center = match options.align {
                    RankAlign::Start => rank_start + along / 2.0,
                    RankAlign::Center => rank_start + thickness / 2.0,
                };
                let cross_center = cursor + across / 2.0;
                cursor += across + options.node_spacing;
                let Some(node) = sizes.get(id.as_str()) else {
                    continue;
                };
                let center = if horizontal {
                    (rank_center, cross_center)
                } else {
                    (cross_center, rank_center)
                };
                centers.insert(node.id.as_str(), center);
            }
            if !bucket.is_empty() {
                rank_start += thickness + options.rank_spacing;
            }
        }

        from_centers(nodes, &centers)
    }
}
