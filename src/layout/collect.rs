use std::collections::{HashMap, HashSet};

use crate::ir::{DialogueNode, GraphEdge, Scene};

use super::types::{Collected, Depth};

/// Outgoing links of a dialogue node: `(target, choice key)`.
pub fn successors(node: &DialogueNode) -> Vec<(&str, Option<&str>)> {
    match node {
        DialogueNode::Text { next, .. } => next
            .as_deref()
            .filter(|next| !next.is_empty())
            .map(|next| vec![(next, None)])
            .unwrap_or_default(),
        DialogueNode::Choice { choices, .. } => choices
            .iter()
            .filter_map(|choice| {
                choice
                    .successor()
                    .map(|next| (next, Some(choice.key.as_str())))
            })
            .collect(),
    }
}

/// Depth-first walk from `root_id`. Each node is expanded once; a second path
/// into an already visited node still contributes its edge. Successors missing
/// from the scene are skipped.
pub fn collect(scene: &Scene, root_id: &str, depth: Depth, include_root: bool) -> Collected {
    let mut out = Collected::default();
    if !scene.contains(root_id) {
        return out;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut edge_ids: HashSet<String> = HashSet::new();
    let mut stack: Vec<(&str, usize)> = vec![(root_id, 0)];

    while let Some((id, level)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = scene.get(id) else {
            continue;
        };
        let in_set = level > 0 || include_root;
        if in_set {
            out.nodes.push(id.to_string());
        }
        if !depth.allows_descent(level) {
            continue;
        }

        let nexts = successors(&node.payload);
        for &(target, _) in nexts.iter().rev() {
            if scene.contains(target) {
                stack.push((target, level + 1));
            }
        }
        if !in_set {
            continue;
        }
        for (target, label) in nexts {
            if !scene.contains(target) || (target == root_id && !include_root) {
                continue;
            }
            let edge = GraphEdge::new(id, target, label);
            if edge_ids.insert(edge.id.clone()) {
                out.edges.push(edge);
            }
        }
    }

    tracing::trace!(
        root = root_id,
        nodes = out.nodes.len(),
        edges = out.edges.len(),
        "collected subgraph"
    );
    out
}

/// Nodes that no other node links to, in id order.
pub fn find_all_roots(scene: &Scene) -> Vec<String> {
    let mut targeted: HashSet<&str> = HashSet::new();
    for (id, node) in &scene.nodes {
        for (target, _) in successors(&node.payload) {
            if target != id.as_str() {
                targeted.insert(target);
            }
        }
    }
    scene
        .nodes
        .keys()
        .filter(|id| !targeted.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Union of full-depth collections from every root. Nodes reachable from
/// several roots are kept once; all of their edges are preserved.
pub fn collect_forest(scene: &Scene, roots: &[String]) -> Collected {
    let mut out = Collected::default();
    let mut seen_nodes: HashSet<String> = HashSet::new();
    let mut seen_edges: HashSet<String> = HashSet::new();
    for root in roots {
        merge_into(
            &mut out,
            &mut seen_nodes,
            &mut seen_edges,
            collect(scene, root, Depth::Unbounded, true),
        );
    }
    out
}

/// Every node on the canvas: the forest under `find_all_roots`, then any node
/// only reachable through a cycle, seeded in id order.
pub fn collect_canvas(scene: &Scene) -> Collected {
    let roots = find_all_roots(scene);
    let mut out = collect_forest(scene, &roots);
    let mut seen_nodes: HashSet<String> = out.nodes.iter().cloned().collect();
    let mut seen_edges: HashSet<String> = out.edges.iter().map(|edge| edge.id.clone()).collect();
    for id in scene.nodes.keys() {
        if seen_nodes.contains(id) {
            continue;
        }
        tracing::debug!(node = id.as_str(), "seeding layout from node inside a rootless cycle");
        merge_into(
            &mut out,
            &mut seen_nodes,
            &mut seen_edges,
            collect(scene, id, Depth::Unbounded, true),
        );
    }
    out
}

fn merge_into(
    out: &mut Collected,
    seen_nodes: &mut HashSet<String>,
    seen_edges: &mut HashSet<String>,
    part: Collected,
) {
    for node in part.nodes {
        if seen_nodes.insert(node.clone()) {
            out.nodes.push(node);
        }
    }
    for edge in part.edges {
        if seen_edges.insert(edge.id.clone()) {
            out.edges.push(edge);
        }
    }
}

/// Splits a collection into weakly connected components, keeping the
/// discovery order of nodes and edges inside each one.
pub fn split_components(collected: &Collected) -> Vec<Collected> {
    let index: HashMap<&str, usize> = collected
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();
    let mut parent: Vec<usize> = (0..collected.nodes.len()).collect();

    for edge in &collected.edges {
        let (Some(&a), Some(&b)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        else {
            continue;
        };
        let root_a = find(&mut parent, a);
        let root_b = find(&mut parent, b);
        if root_a != root_b {
            // keep the earlier-discovered node as representative
            let (keep, merge) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            parent[merge] = keep;
        }
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Collected> = Vec::new();
    for idx in 0..collected.nodes.len() {
        let root = find(&mut parent, idx);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            components.push(Collected::default());
            components.len() - 1
        });
        components[slot].nodes.push(collected.nodes[idx].clone());
    }
    for edge in &collected.edges {
        let Some(&source) = index.get(edge.source.as_str()) else {
            continue;
        };
        let root = find(&mut parent, source);
        if let Some(&slot) = slot_of_root.get(&root) {
            components[slot].edges.push(edge.clone());
        }
    }
    components
}

fn find(parent: &mut [usize], mut idx: usize) -> usize {
    while parent[idx] != idx {
        parent[idx] = parent[parent[idx]];
        idx = parent[idx];
    }
    idx
}
