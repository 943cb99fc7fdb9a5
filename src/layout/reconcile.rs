use std::collections::HashMap;

use super::types::{LayoutResult, Position};

/// Moves a layered result into scene coordinates. With an anchor, the whole
/// result is shifted so the anchor lands on its pre-run position; without one
/// (or when the anchor is unknown to either side) it passes through unchanged.
pub fn reconcile(
    result: LayoutResult,
    anchor_id: Option<&str>,
    original_positions: &HashMap<String, Position>,
) -> LayoutResult {
    let Some(anchor_id) = anchor_id else {
        return result;
    };
    let (Some(laid_out), Some(original)) =
        (result.get(anchor_id), original_positions.get(anchor_id))
    else {
        tracing::warn!(anchor = anchor_id, "anchor missing from layout run, keeping raw positions");
        return result;
    };

    let dx = original.x - laid_out.x;
    let dy = original.y - laid_out.y;
    let mut result = result;
    result.translate(dx, dy);
    // translation can drift by an ulp; pin the anchor exactly
    if let Some(anchor) = result.nodes.iter_mut().find(|node| node.id == anchor_id) {
        anchor.x = original.x;
        anchor.y = original.y;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::geometry::bounds_of;
    use crate::layout::types::NodeBox;

    fn result() -> LayoutResult {
        let nodes = vec![
            NodeBox {
                id: "root".into(),
                x: -60.0,
                y: -30.0,
                width: 120.0,
                height: 60.0,
            },
            NodeBox {
                id: "child".into(),
                x: 140.0,
                y: -20.0,
                width: 100.0,
                height: 40.0,
            },
        ];
        let bounds = bounds_of(&nodes);
        LayoutResult { nodes, bounds }
    }

    #[test]
    fn anchor_keeps_its_position() {
        let originals: HashMap<String, Position> =
            [("root".to_string(), Position::new(1000.3, -250.7))].into_iter().collect();
        let out = reconcile(result(), Some("root"), &originals);
        let root = out.get("root").unwrap();
        assert_eq!(root.position(), Position::new(1000.3, -250.7));
        let child = out.get("child").unwrap();
        assert!((child.x - root.x - 200.0).abs() < 1e-3);
        assert!((child.y - root.y - 10.0).abs() < 1e-3);
        assert!((out.bounds.min_x - 1000.3).abs() < 1e-3);
    }

    #[test]
    fn no_anchor_passes_through() {
        let out = reconcile(result(), None, &HashMap::new());
        assert_eq!(out, result());
    }

    #[test]
    fn unknown_anchor_passes_through() {
        let originals: HashMap<String, Position> =
            [("root".to_string(), Position::new(5.0, 5.0))].into_iter().collect();
        assert_eq!(reconcile(result(), Some("ghost"), &originals), result());
        assert_eq!(reconcile(result(), Some("child"), &originals), result());
    }
}
