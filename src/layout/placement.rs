use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Config, PlacementConfig, sanitize};
use crate::ir::{DialogueNode, Scene};

use super::geometry::overlaps_any;
use super::measure::Measurer;
use super::types::{Position, Rect, Size};

/// Positions single new or pasted nodes without running a full layout.
///
/// Candidates are tried in columns to the right of the last placed node:
/// each column is scanned downward for `max_rows` rows before wrapping to the
/// next column at the starting row. After `max_attempts` candidates a seeded
/// random slot near the start is returned instead, which may overlap; the
/// next full layout run resolves it.
pub struct IncrementalPlacer {
    config: PlacementConfig,
    margin_x: f32,
    margin_y: f32,
    rng: StdRng,
}

impl IncrementalPlacer {
    pub fn new(config: PlacementConfig, margin_x: f32, margin_y: f32) -> Self {
        let config = config.normalized();
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            margin_x: sanitize(margin_x, 0.0),
            margin_y: sanitize(margin_y, 0.0),
            rng,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.placement.clone(),
            config.layout.margin_x,
            config.layout.margin_y,
        )
    }

    /// Next free slot after `last` (the previously placed node's box).
    pub fn place_next(
        &mut self,
        scene: &Scene,
        measurer: &Measurer<'_>,
        last: Option<Rect>,
        new_size: Size,
    ) -> Position {
        let occupied = occupied_rects(scene, measurer);
        self.place_among(&occupied, last, new_size)
    }

    /// Places a pasted batch one after another; earlier batch members count
    /// as occupied for later ones.
    pub fn place_pasted(
        &mut self,
        scene: &Scene,
        measurer: &Measurer<'_>,
        last: Option<Rect>,
        sizes: &[Size],
    ) -> Vec<Position> {
        let mut occupied = occupied_rects(scene, measurer);
        let mut last = last;
        let mut placed = Vec::with_capacity(sizes.len());
        for size in sizes {
            let position = self.place_among(&occupied, last, *size);
            let rect = Rect::from_parts(position, *size);
            occupied.push(rect);
            last = Some(rect);
            placed.push(position);
        }
        placed
    }

    /// Slot for a new successor of `parent_id`. Text parents get the child
    /// centered on their right edge. Choice parents center the first connected
    /// child and stack later ones below the lowest connected sibling.
    /// `choice_key` defaults to the first unconnected choice.
    pub fn place_child(
        &self,
        scene: &Scene,
        measurer: &Measurer<'_>,
        parent_id: &str,
        choice_key: Option<&str>,
        child_size: Size,
    ) -> Option<Position> {
        let parent = scene.get(parent_id)?;
        let parent_rect = Rect::from_parts(parent.position, measurer.measure(scene, parent_id)?);
        let x = parent_rect.right() + self.config.spacing_x;
        let centered = parent_rect.center_y() - child_size.height / 2.0;

        let DialogueNode::Choice { choices, .. } = &parent.payload else {
            return Some(Position::new(x, centered));
        };

        let key = choice_key.or_else(|| {
            choices
                .iter()
                .find(|choice| choice.successor().is_none())
                .map(|choice| choice.key.as_str())
        });
        let lowest_sibling = choices
            .iter()
            .filter(|choice| Some(choice.key.as_str()) != key)
            .filter_map(|choice| choice.successor())
            .filter_map(|id| {
                let size = measurer.measure(scene, id)?;
                Some(Rect::from_parts(scene.position(id)?, size).bottom())
            })
            .fold(None, |lowest: Option<f32>, bottom| {
                Some(lowest.map_or(bottom, |current| current.max(bottom)))
            });

        let y = match lowest_sibling {
            Some(bottom) => bottom + self.config.choice_gap,
            None => centered,
        };
        Some(Position::new(x, y))
    }

    fn start_for(&self, last: Option<Rect>) -> Position {
        match last {
            Some(rect) => Position::new(rect.right() + self.config.spacing_x, rect.y),
            None => Position::new(self.config.origin_x, self.config.origin_y),
        }
    }

    fn place_among(&mut self, occupied: &[Rect], last: Option<Rect>, size: Size) -> Position {
        let start = self.start_for(last);
        let col_step = size.width + self.config.spacing_x;
        let row_step = size.height + self.config.spacing_y;
        let rows = self.config.max_rows.max(1);
        let columns = self.config.max_attempts.div_ceil(rows);

        let mut attempts = 0usize;
        for col in 0..columns {
            for row in 0..rows {
                if attempts >= self.config.max_attempts {
                    break;
                }
                attempts += 1;
                let candidate = Rect::new(
                    start.x + col as f32 * col_step,
                    start.y + row as f32 * row_step,
                    size.width,
                    size.height,
                );
                if !overlaps_any(
                    candidate,
                    occupied.iter().copied(),
                    self.margin_x,
                    self.margin_y,
                ) {
                    return candidate.position();
                }
            }
        }

        let dx = self.rng.random_range(0.0..=self.config.fallback_width);
        let dy = self.rng.random_range(0.0..=self.config.fallback_height);
        tracing::warn!(attempts, "no free slot found, using a random fallback position");
        start.offset(dx, dy)
    }
}

fn occupied_rects(scene: &Scene, measurer: &Measurer<'_>) -> Vec<Rect> {
    scene
        .nodes
        .values()
        .filter_map(|node| {
            let size = measurer.measure(scene, &node.id)?;
            Some(Rect::from_parts(node.position, size))
        })
        .collect()
}
