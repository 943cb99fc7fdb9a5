use super::types::{Bounds, NodeBox, Rect};

/// Checks whether two boxes, each grown by half the margin on every side,
/// intersect. Boxes separated by exactly the margin do not overlap.
pub fn overlaps(a: Rect, b: Rect, margin_x: f32, margin_y: f32) -> bool {
    let half_x = margin_x / 2.0;
    let half_y = margin_y / 2.0;

    let left_a = a.x - half_x;
    let right_a = a.x + a.width + half_x;
    let top_a = a.y - half_y;
    let bottom_a = a.y + a.height + half_y;

    let left_b = b.x - half_x;
    let right_b = b.x + b.width + half_x;
    let top_b = b.y - half_y;
    let bottom_b = b.y + b.height + half_y;

    !(right_a <= left_b || right_b <= left_a || bottom_a <= top_b || bottom_b <= top_a)
}

pub fn overlaps_any<I>(candidate: Rect, existing: I, margin_x: f32, margin_y: f32) -> bool
where
    I: IntoIterator<Item = Rect>,
{
    existing
        .into_iter()
        .any(|rect| overlaps(candidate, rect, margin_x, margin_y))
}

pub fn bounds_of(nodes: &[NodeBox]) -> Bounds {
    if nodes.is_empty() {
        return Bounds::default();
    }
    let mut bounds = Bounds {
        min_x: f32::MAX,
        min_y: f32::MAX,
        max_x: f32::MIN,
        max_y: f32::MIN,
    };
    for node in nodes {
        bounds.min_x = bounds.min_x.min(node.x);
        bounds.min_y = bounds.min_y.min(node.y);
        bounds.max_x = bounds.max_x.max(node.x + node.width);
        bounds.max_y = bounds.max_y.max(node.y + node.height);
    }
    bounds
}

/// First pair of ids whose margin-expanded boxes intersect.
pub fn first_overlap(nodes: &[NodeBox], margin_x: f32, margin_y: f32) -> Option<(&str, &str)> {
    for (idx, a) in nodes.iter().enumerate() {
        for b in &nodes[idx + 1..] {
            if overlaps(a.rect(), b.rect(), margin_x, margin_y) {
                return Some((a.id.as_str(), b.id.as_str()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_boxes_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(130.0, 0.0, 100.0, 50.0);
        assert!(!overlaps(a, b, 20.0, 20.0));
        assert!(overlaps(a, b, 40.0, 20.0));
    }

    #[test]
    fn gap_equal_to_margin_is_clear() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(0.0, 70.0, 100.0, 50.0);
        assert!(!overlaps(a, b, 20.0, 20.0));
        assert!(overlaps(a, b, 20.0, 20.5));
    }

    #[test]
    fn contained_box_overlaps() {
        let outer = Rect::new(0.0, 0.0, 200.0, 200.0);
        let inner = Rect::new(50.0, 50.0, 10.0, 10.0);
        assert!(overlaps(outer, inner, 0.0, 0.0));
        assert!(overlaps(inner, outer, 0.0, 0.0));
    }

    #[test]
    fn overlap_is_symmetric_on_each_side() {
        let center = Rect::new(100.0, 100.0, 50.0, 50.0);
        for (x, y) in [(40.0, 100.0), (160.0, 100.0), (100.0, 40.0), (100.0, 160.0)] {
            let other = Rect::new(x, y, 50.0, 50.0);
            assert!(!overlaps(center, other, 5.0, 5.0), "{x},{y}");
            assert!(overlaps(center, other, 30.0, 30.0), "{x},{y}");
            assert_eq!(
                overlaps(center, other, 12.0, 12.0),
                overlaps(other, center, 12.0, 12.0)
            );
        }
    }

    #[test]
    fn bounds_cover_all_boxes() {
        let nodes = vec![
            NodeBox {
                id: "a".into(),
                x: -10.0,
                y: 5.0,
                width: 20.0,
                height: 10.0,
            },
            NodeBox {
                id: "b".into(),
                x: 30.0,
                y: -5.0,
                width: 10.0,
                height: 40.0,
            },
        ];
        let bounds = bounds_of(&nodes);
        assert_eq!(bounds.min_x, -10.0);
        assert_eq!(bounds.min_y, -5.0);
        assert_eq!(bounds.max_x, 40.0);
        assert_eq!(bounds.max_y, 35.0);
        assert!(first_overlap(&nodes, 0.0, 0.0).is_none());
    }
}
