use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::MeasureConfig;
use crate::ir::{DialogueNode, Scene};

use super::types::Size;

/// Where rendered footprints come from. Returns `None` while a node has not
/// been mounted by the render layer yet.
pub trait MeasurementSource {
    fn rendered_size(&self, scene: &Scene, node_id: &str) -> Option<Size>;
}

/// Reads the width/height the render layer recorded on each scene node.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneSizes;

impl MeasurementSource for SceneSizes {
    fn rendered_size(&self, scene: &Scene, node_id: &str) -> Option<Size> {
        scene.get(node_id).and_then(|node| node.rendered_size())
    }
}

/// Never rendered: every node is estimated from its text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRender;

impl MeasurementSource for NoRender {
    fn rendered_size(&self, _scene: &Scene, _node_id: &str) -> Option<Size> {
        None
    }
}

/// Footprints pushed by a host that keeps its own size table.
#[derive(Debug, Clone, Default)]
pub struct FixedSizes {
    sizes: HashMap<String, Size>,
}

impl FixedSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_id: &str, size: Size) {
        self.sizes.insert(node_id.to_string(), size);
    }
}

impl MeasurementSource for FixedSizes {
    fn rendered_size(&self, _scene: &Scene, node_id: &str) -> Option<Size> {
        self.sizes
            .get(node_id)
            .copied()
            .filter(|size| size.width > 0.0 && size.height > 0.0)
    }
}

/// Size table the render layer keeps writing to while a run waits for the
/// render pass to settle. Reported sizes win over the scene's own record.
#[derive(Debug, Clone, Default)]
pub struct SharedSizes {
    sizes: Rc<RefCell<HashMap<String, Size>>>,
}

/// Render-layer end of a [`SharedSizes`] table.
#[derive(Debug, Clone)]
pub struct SizeReporter {
    sizes: Rc<RefCell<HashMap<String, Size>>>,
}

impl SharedSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporter(&self) -> SizeReporter {
        SizeReporter {
            sizes: Rc::clone(&self.sizes),
        }
    }
}

impl SizeReporter {
    pub fn report(&self, node_id: &str, size: Size) {
        self.sizes.borrow_mut().insert(node_id.to_string(), size);
    }

    pub fn forget(&self, node_id: &str) {
        self.sizes.borrow_mut().remove(node_id);
    }
}

impl MeasurementSource for SharedSizes {
    fn rendered_size(&self, scene: &Scene, node_id: &str) -> Option<Size> {
        let reported = self
            .sizes
            .borrow()
            .get(node_id)
            .copied()
            .filter(|size| size.width > 0.0 && size.height > 0.0);
        reported.or_else(|| SceneSizes.rendered_size(scene, node_id))
    }
}

/// Rendered footprint when available, text-length estimate otherwise.
pub struct Measurer<'a> {
    source: &'a dyn MeasurementSource,
    config: &'a MeasureConfig,
}

impl<'a> Measurer<'a> {
    pub fn new(source: &'a dyn MeasurementSource, config: &'a MeasureConfig) -> Self {
        Self { source, config }
    }

    /// `None` only when the node is not on the canvas.
    pub fn measure(&self, scene: &Scene, node_id: &str) -> Option<Size> {
        let node = scene.get(node_id)?;
        Some(
            self.source
                .rendered_size(scene, node_id)
                .unwrap_or_else(|| estimate_footprint(&node.payload, self.config)),
        )
    }
}

pub fn estimate_footprint(node: &DialogueNode, config: &MeasureConfig) -> Size {
    let min_width = config.min_width.max(1.0);
    let max_width = config.max_width.max(min_width);

    let mut lines: Vec<&str> = node.body().lines().collect();
    if lines.is_empty() {
        lines.push("");
    }
    let longest = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let width = (longest as f32 * config.char_width + config.padding_x).clamp(min_width, max_width);

    let usable = (width - config.padding_x).max(config.char_width.max(1.0));
    let body_lines: usize = lines
        .iter()
        .map(|line| wrapped_line_count(line, usable, config.char_width))
        .sum();

    let mut height = config.header_height + body_lines as f32 * config.line_height + config.padding_y;
    for choice in node.choices() {
        let rows = wrapped_line_count(&choice.text, usable, config.char_width);
        height += config.choice_row_height + rows.saturating_sub(1) as f32 * config.line_height;
    }

    Size::new(width, height)
}

fn wrapped_line_count(line: &str, usable_width: f32, char_width: f32) -> usize {
    let text_width = line.chars().count() as f32 * char_width;
    ((text_width / usable_width).ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Choice, GraphNode};

    #[test]
    fn estimate_is_clamped_and_grows_in_line_steps() {
        let config = MeasureConfig::default();
        let short = estimate_footprint(&DialogueNode::text("Hi", None), &config);
        assert_eq!(short.width, config.min_width);

        let long_text = "word ".repeat(60);
        let long = estimate_footprint(&DialogueNode::text(&long_text, None), &config);
        assert_eq!(long.width, config.max_width);
        let extra = long.height - short.height;
        assert!(extra > 0.0);
        assert_eq!(extra % config.line_height, 0.0);
    }

    #[test]
    fn estimate_is_monotonic_in_length() {
        let config = MeasureConfig::default();
        let mut previous = Size::default();
        for len in 0..200 {
            let text = "x".repeat(len);
            let size = estimate_footprint(&DialogueNode::text(&text, None), &config);
            assert!(size.width >= previous.width, "width shrank at {len}");
            assert!(size.height >= previous.height, "height shrank at {len}");
            previous = size;
        }
    }

    #[test]
    fn choices_add_rows() {
        let config = MeasureConfig::default();
        let plain = estimate_footprint(&DialogueNode::choice("Pick", Vec::new()), &config);
        let two = estimate_footprint(
            &DialogueNode::choice(
                "Pick",
                vec![Choice::new("a", "Yes", None), Choice::new("b", "No", None)],
            ),
            &config,
        );
        assert_eq!(two.height - plain.height, config.choice_row_height * 2.0);
    }

    #[test]
    fn rendered_size_wins_over_estimate() {
        let scene = Scene::from_nodes([
            GraphNode::new("a", DialogueNode::text("Hello", None)).sized(222.0, 99.0),
            GraphNode::new("b", DialogueNode::text("Hello", None)),
        ]);
        let config = MeasureConfig::default();
        let measurer = Measurer::new(&SceneSizes, &config);
        assert_eq!(measurer.measure(&scene, "a"), Some(Size::new(222.0, 99.0)));
        assert_eq!(
            measurer.measure(&scene, "b"),
            Some(estimate_footprint(&DialogueNode::text("Hello", None), &config))
        );
        assert_eq!(measurer.measure(&scene, "missing"), None);

        let estimate_only = Measurer::new(&NoRender, &config);
        assert_ne!(estimate_only.measure(&scene, "a"), Some(Size::new(222.0, 99.0)));
    }

    #[test]
    fn shared_sizes_see_later_reports() {
        let scene = Scene::from_nodes([
            GraphNode::new("a", DialogueNode::text("Hello", None)).sized(100.0, 50.0),
        ]);
        let config = MeasureConfig::default();
        let shared = SharedSizes::new();
        let reporter = shared.reporter();
        let measurer = Measurer::new(&shared, &config);
        assert_eq!(measurer.measure(&scene, "a"), Some(Size::new(100.0, 50.0)));

        reporter.report("a", Size::new(250.0, 75.0));
        assert_eq!(measurer.measure(&scene, "a"), Some(Size::new(250.0, 75.0)));

        reporter.forget("a");
        assert_eq!(measurer.measure(&scene, "a"), Some(Size::new(100.0, 50.0)));
    }
}
