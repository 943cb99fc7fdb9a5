use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::ir::GraphEdge;

/// Longest-path layering. Back-edges found while breaking cycles are ignored,
/// so every edge either points to a later rank or is dropped from ranking.
pub(super) fn compute_ranks(node_ids: &[String], edges: &[GraphEdge]) -> HashMap<String, usize> {
    let order_key: HashMap<&str, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = node_ids.iter().map(|id| (id.as_str(), 0)).collect();

    for edge in edges {
        if edge.source == edge.target {
            continue;
        }
        let (Some(_), Some(deg)) = (
            order_key.get(edge.source.as_str()),
            indeg.get_mut(edge.target.as_str()),
        ) else {
            continue;
        };
        *deg += 1;
        adj.entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    let key_of = |id: &str| order_key.get(id).copied().unwrap_or(usize::MAX);

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in node_ids {
        if indeg.get(id.as_str()).copied().unwrap_or(0) == 0 {
            ready.push(Reverse((key_of(id.as_str()), id.as_str())));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(node_ids.len());
    let mut processed: HashSet<&str> = HashSet::new();
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            if let Some(nexts) = adj.get(id) {
                for &next in nexts {
                    if processed.contains(next) {
                        continue;
                    }
                    if let Some(deg) = indeg.get_mut(next) {
                        *deg = deg.saturating_sub(1);
                        if *deg == 0 {
                            ready.push(Reverse((key_of(next), next)));
                        }
                    }
                }
            }
        }

        if processed.len() >= node_ids.len() {
            break;
        }

        // Cycle: restart from the earliest-discovered unprocessed node and
        // treat its remaining incoming edges as back-edges.
        match node_ids
            .iter()
            .map(String::as_str)
            .find(|id| !processed.contains(id))
        {
            Some(id) => ready.push(Reverse((key_of(id), id))),
            None => break,
        }
    }

    let order_index: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (*id, idx))
        .collect();

    let mut ranks: HashMap<String, usize> = HashMap::new();
    for node in &order {
        let rank = ranks.get(*node).copied().unwrap_or(0);
        ranks.entry(node.to_string()).or_insert(rank);
        let Some(nexts) = adj.get(node) else {
            continue;
        };
        let from_idx = order_index.get(node).copied().unwrap_or(0);
        for next in nexts {
            let to_idx = order_index.get(next).copied().unwrap_or(from_idx);
            if to_idx <= from_idx {
                continue;
            }
            let entry = ranks.entry(next.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }

    ranks
}

/// An edge as seen by the ordering sweeps. `port` is where the edge leaves
/// its source, as a fraction of the source's slot: the k-th of n outgoing
/// edges sits at `(k + 1) / (n + 1)`, so choice edges fan out in choice order.
struct Link<'a> {
    source: &'a str,
    target: &'a str,
    port: f32,
}

fn fan_out_links(edges: &[GraphEdge]) -> Vec<Link<'_>> {
    let mut out_degree: HashMap<&str, usize> = HashMap::new();
    for edge in edges.iter().filter(|edge| edge.source != edge.target) {
        *out_degree.entry(edge.source.as_str()).or_default() += 1;
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    edges
        .iter()
        .filter(|edge| edge.source != edge.target)
        .map(|edge| {
            let index = seen.entry(edge.source.as_str()).or_default();
            let degree = out_degree.get(edge.source.as_str()).copied().unwrap_or(1);
            let port = (*index + 1) as f32 / (degree + 1) as f32;
            *index += 1;
            Link {
                source: edge.source.as_str(),
                target: edge.target.as_str(),
                port,
            }
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Sweep {
    Down,
    Up,
}

/// Reorders ranks to reduce edge crossings with barycenter sweeps, down then
/// up. Ties fall back to discovery order. The ordering with the fewest
/// crossings seen, discovery order included, is kept.
pub(super) fn order_rank_nodes(
    rank_nodes: &mut [Vec<String>],
    edges: &[GraphEdge],
    node_order: &HashMap<String, usize>,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let links = fan_out_links(edges);
    let mut best_crossings = count_crossings(rank_nodes, &links);
    if best_crossings == 0 {
        return;
    }
    let mut best = rank_nodes.to_vec();

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            sweep_rank(rank_nodes, rank, &links, node_order, Sweep::Down);
        }
        for rank in (0..rank_nodes.len() - 1).rev() {
            sweep_rank(rank_nodes, rank, &links, node_order, Sweep::Up);
        }
        let crossings = count_crossings(rank_nodes, &links);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = rank_nodes.to_vec();
            if crossings == 0 {
                break;
            }
        }
    }
    rank_nodes.clone_from_slice(&best);
}

/// Rank and index of every placed node.
fn slots(rank_nodes: &[Vec<String>]) -> HashMap<&str, (usize, usize)> {
    rank_nodes
        .iter()
        .enumerate()
        .flat_map(|(rank, bucket)| {
            bucket
                .iter()
                .enumerate()
                .map(move |(idx, id)| (id.as_str(), (rank, idx)))
        })
        .collect()
}

fn sweep_rank(
    rank_nodes: &mut [Vec<String>],
    rank: usize,
    links: &[Link<'_>],
    node_order: &HashMap<String, usize>,
    sweep: Sweep,
) {
    if rank_nodes[rank].len() <= 1 {
        return;
    }
    let keys: Vec<(f32, usize, usize)> = {
        let slots = slots(rank_nodes);
        rank_nodes[rank]
            .iter()
            .enumerate()
            .map(|(idx, id)| {
                let score = barycenter(id, links, &slots, sweep).unwrap_or(idx as f32);
                let discovered = node_order.get(id).copied().unwrap_or(usize::MAX);
                (score, discovered, idx)
            })
            .collect()
    };
    let bucket = std::mem::take(&mut rank_nodes[rank]);
    let mut keyed: Vec<((f32, usize, usize), String)> = keys.into_iter().zip(bucket).collect();
    keyed.sort_by(|(a, _), (b, _)| {
        a.0.total_cmp(&b.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });
    rank_nodes[rank] = keyed.into_iter().map(|(_, id)| id).collect();
}

/// Mean slot of the node's neighbours on the side the sweep comes from.
/// `None` when it has none there.
fn barycenter(
    node_id: &str,
    links: &[Link<'_>],
    slots: &HashMap<&str, (usize, usize)>,
    sweep: Sweep,
) -> Option<f32> {
    let &(own_rank, _) = slots.get(node_id)?;
    let mut total = 0.0f32;
    let mut count = 0usize;
    for link in links {
        let value = match sweep {
            Sweep::Down if link.target == node_id => slots
                .get(link.source)
                .filter(|(rank, _)| *rank < own_rank)
                .map(|(_, idx)| *idx as f32 + link.port),
            Sweep::Up if link.source == node_id => slots
                .get(link.target)
                .filter(|(rank, _)| *rank > own_rank)
                .map(|(_, idx)| *idx as f32 + 0.5),
            _ => None,
        };
        if let Some(value) = value {
            total += value;
            count += 1;
        }
    }
    (count > 0).then(|| total / count as f32)
}

/// Crossings between edges joining adjacent ranks. Two edges out of the same
/// node cross when their targets are in the opposite order of their ports.
fn count_crossings(rank_nodes: &[Vec<String>], links: &[Link<'_>]) -> usize {
    let slots = slots(rank_nodes);
    let mut segments: Vec<Vec<(f32, usize)>> = vec![Vec::new(); rank_nodes.len()];
    for link in links {
        let (Some(&(from_rank, from_idx)), Some(&(to_rank, to_idx))) =
            (slots.get(link.source), slots.get(link.target))
        else {
            continue;
        };
        if to_rank == from_rank + 1 {
            segments[from_rank].push((from_idx as f32 + link.port, to_idx));
        }
    }
    segments
        .iter()
        .map(|between| {
            let mut crossings = 0;
            for (i, &(upper_a, lower_a)) in between.iter().enumerate() {
                for &(upper_b, lower_b) in &between[i + 1..] {
                    if (upper_a < upper_b && lower_a > lower_b)
                        || (upper_a > upper_b && lower_a < lower_b)
                    {
                        crossings += 1;
                    }
                }
            }
            crossings
        })
        .sum()
}
