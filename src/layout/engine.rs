use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::{Config, LayoutConfig};
use crate::ir::{GraphEdge, Scene};

use super::collect::{collect, collect_canvas, split_components};
use super::error::LayoutError;
use super::layered::{LayeredLayout, LayeredOptions, RankedLayout, SizedNode};
use super::measure::{MeasurementSource, Measurer, SceneSizes};
use super::placement::IncrementalPlacer;
use super::reconcile::reconcile;
use super::settle::{ImmediateSettle, RenderSettle};
use super::types::{Collected, LayoutRequest, LayoutResult, Position};

/// Positions within this distance of the pre-run value are not re-applied.
const APPLY_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPhase {
    Idle,
    Collecting,
    Measuring,
    Computing,
    Reconciling,
    Applying,
}

/// "Operation in progress" flag shared with the other mutating commands of
/// the editor (node creation, undo/redo).
pub trait OperationLock {
    fn try_acquire(&self, label: &str) -> bool;
    fn release(&self);
}

/// Single-threaded [`OperationLock`] that remembers who holds it.
#[derive(Debug, Default)]
pub struct FlagLock {
    holder: RefCell<Option<String>>,
}

impl FlagLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_label(&self) -> Option<String> {
        self.holder.borrow().clone()
    }

    pub fn is_held(&self) -> bool {
        self.holder.borrow().is_some()
    }
}

impl OperationLock for FlagLock {
    fn try_acquire(&self, label: &str) -> bool {
        let mut holder = self.holder.borrow_mut();
        if holder.is_some() {
            return false;
        }
        *holder = Some(label.to_string());
        true
    }

    fn release(&self) {
        self.holder.borrow_mut().take();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The operation lock is held by another command.
    Busy,
    /// Another run on this engine has not finished.
    NotIdle,
    MissingRoot,
    EmptyNodeSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutcome {
    /// Reconciled boxes for every node of the run, in collection order.
    pub result: LayoutResult,
    /// Ids handed to the apply callback, in the order they were applied.
    pub applied: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

impl LayoutOutcome {
    pub fn position(&self, id: &str) -> Option<Position> {
        self.result.get(id).map(|node| node.position())
    }

    /// Writes every reconciled position into `scene`.
    pub fn apply_to(&self, scene: &mut Scene) {
        for node in &self.result.nodes {
            scene.set_position(&node.id, node.position());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed(LayoutOutcome),
    Skipped(SkipReason),
}

impl RunStatus {
    pub fn outcome(&self) -> Option<&LayoutOutcome> {
        match self {
            RunStatus::Completed(outcome) => Some(outcome),
            RunStatus::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RunStatus::Skipped(_))
    }
}

/// Resets the phase and releases the lock however the run ends, including
/// when the run future is dropped mid-wait.
struct RunGuard<'a> {
    phase: &'a Cell<LayoutPhase>,
    lock: &'a dyn OperationLock,
}

impl RunGuard<'_> {
    fn enter(&self, phase: LayoutPhase) {
        tracing::trace!(from = ?self.phase.get(), to = ?phase, "layout phase");
        self.phase.set(phase);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.phase.set(LayoutPhase::Idle);
        self.lock.release();
    }
}

/// Sequences one layout run: collect, wait for sizes, measure, lay out,
/// reconcile, apply. One value per scene or document.
pub struct LayoutEngine {
    config: Config,
    source: Box<dyn MeasurementSource>,
    settle: Box<dyn RenderSettle>,
    backend: Box<dyn LayeredLayout>,
    lock: Rc<dyn OperationLock>,
    phase: Cell<LayoutPhase>,
}

impl LayoutEngine {
    /// Reads rendered sizes off the scene, does not wait for a render pass and
    /// lays out with [`RankedLayout`].
    ///
    /// A run borrows the scene for its whole duration, so [`SceneSizes`] only
    /// sees sizes recorded before the run started. Hosts whose render pass
    /// reports sizes during the settle wait should install a
    /// [`SharedSizes`](super::measure::SharedSizes) table with
    /// [`with_measurement`](Self::with_measurement).
    pub fn new(mut config: Config, lock: Rc<dyn OperationLock>) -> Self {
        config.layout = config.layout.normalized();
        config.placement = config.placement.normalized();
        Self {
            config,
            source: Box::new(SceneSizes),
            settle: Box::new(ImmediateSettle),
            backend: Box::new(RankedLayout),
            lock,
            phase: Cell::new(LayoutPhase::Idle),
        }
    }

    pub fn with_measurement(mut self, source: Box<dyn MeasurementSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_settle(mut self, settle: Box<dyn RenderSettle>) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_backend(mut self, backend: Box<dyn LayeredLayout>) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase.get()
    }

    pub fn measurer(&self) -> Measurer<'_> {
        Measurer::new(self.source.as_ref(), &self.config.measure)
    }

    pub fn placer(&self) -> IncrementalPlacer {
        IncrementalPlacer::from_config(&self.config)
    }

    /// Lays out every node on the canvas. Each weakly connected component is
    /// laid out on its own and the components are stacked from the layout
    /// origin.
    pub async fn run_whole_canvas<F>(&self, scene: &Scene, apply: F) -> Result<RunStatus, LayoutError>
    where
        F: FnMut(&str, Position),
    {
        let guard = match self.begin("auto-layout: canvas") {
            Ok(guard) => guard,
            Err(reason) => return Ok(RunStatus::Skipped(reason)),
        };

        let collected = collect_canvas(scene);
        if collected.is_empty() {
            tracing::debug!("canvas is empty, nothing to lay out");
            return Ok(RunStatus::Skipped(SkipReason::EmptyNodeSet));
        }
        tracing::debug!(
            nodes = collected.nodes.len(),
            edges = collected.edges.len(),
            "collected canvas"
        );

        guard.enter(LayoutPhase::Measuring);
        let sized = self.measure_nodes(scene, &collected).await?;

        guard.enter(LayoutPhase::Computing);
        let options = LayeredOptions::from_config(&self.config.layout);
        let result = self.layout_components(&collected, &sized, &options)?;

        guard.enter(LayoutPhase::Reconciling);
        let originals = original_positions(scene, &collected);
        let result = reconcile(result, None, &originals);

        guard.enter(LayoutPhase::Applying);
        let applied = apply_moved(&result, &originals, apply);
        tracing::debug!(applied = applied.len(), "canvas layout applied");
        Ok(RunStatus::Completed(LayoutOutcome {
            result,
            applied,
            edges: collected.edges,
        }))
    }

    /// Lays out `node_id` and its direct successors, keeping `node_id` in place.
    pub async fn run_children<F>(
        &self,
        scene: &Scene,
        node_id: &str,
        apply: F,
    ) -> Result<RunStatus, LayoutError>
    where
        F: FnMut(&str, Position),
    {
        let request = LayoutRequest::children(node_id, &self.config.layout);
        self.run_scoped("auto-layout: children", scene, &request, apply)
            .await
    }

    /// Lays out everything reachable from `node_id`, keeping `node_id` in place.
    pub async fn run_descendants<F>(
        &self,
        scene: &Scene,
        node_id: &str,
        apply: F,
    ) -> Result<RunStatus, LayoutError>
    where
        F: FnMut(&str, Position),
    {
        let request = LayoutRequest::descendants(node_id, &self.config.layout);
        self.run_scoped("auto-layout: descendants", scene, &request, apply)
            .await
    }

    pub async fn run_request<F>(
        &self,
        scene: &Scene,
        request: &LayoutRequest,
        apply: F,
    ) -> Result<RunStatus, LayoutError>
    where
        F: FnMut(&str, Position),
    {
        self.run_scoped("auto-layout", scene, request, apply).await
    }

    async fn run_scoped<F>(
        &self,
        label: &str,
        scene: &Scene,
        request: &LayoutRequest,
        apply: F,
    ) -> Result<RunStatus, LayoutError>
    where
        F: FnMut(&str, Position),
    {
        let guard = match self.begin(label) {
            Ok(guard) => guard,
            Err(reason) => return Ok(RunStatus::Skipped(reason)),
        };

        if !scene.contains(&request.root_id) {
            tracing::debug!(root = request.root_id.as_str(), "layout root is not on the canvas");
            return Ok(RunStatus::Skipped(SkipReason::MissingRoot));
        }
        let collected = collect(scene, &request.root_id, request.depth, request.include_root);
        if collected.is_empty() {
            return Ok(RunStatus::Skipped(SkipReason::EmptyNodeSet));
        }
        tracing::debug!(
            root = request.root_id.as_str(),
            nodes = collected.nodes.len(),
            edges = collected.edges.len(),
            "collected subtree"
        );

        guard.enter(LayoutPhase::Measuring);
        let sized = self.measure_nodes(scene, &collected).await?;

        guard.enter(LayoutPhase::Computing);
        let scoped = LayoutConfig {
            direction: request.direction,
            node_spacing: request.node_spacing,
            rank_spacing: request.rank_spacing,
            ..self.config.layout.clone()
        }
        .normalized();
        let options = LayeredOptions::from_config(&scoped);
        let result = self.backend.layout(&sized, &collected.edges, &options)?;

        guard.enter(LayoutPhase::Reconciling);
        let originals = original_positions(scene, &collected);
        let result = reconcile(result, request.anchor_id.as_deref(), &originals);

        guard.enter(LayoutPhase::Applying);
        let applied = apply_moved(&result, &originals, apply);
        tracing::debug!(
            root = request.root_id.as_str(),
            applied = applied.len(),
            "subtree layout applied"
        );
        Ok(RunStatus::Completed(LayoutOutcome {
            result,
            applied,
            edges: collected.edges,
        }))
    }

    fn begin(&self, label: &str) -> Result<RunGuard<'_>, SkipReason> {
        if self.phase.get() != LayoutPhase::Idle {
            tracing::info!(label, phase = ?self.phase.get(), "layout run already in flight");
            return Err(SkipReason::NotIdle);
        }
        if !self.lock.try_acquire(label) {
            tracing::info!(label, "another operation is in progress, layout skipped");
            return Err(SkipReason::Busy);
        }
        let guard = RunGuard {
            phase: &self.phase,
            lock: self.lock.as_ref(),
        };
        guard.enter(LayoutPhase::Collecting);
        Ok(guard)
    }

    async fn measure_nodes(
        &self,
        scene: &Scene,
        collected: &Collected,
    ) -> Result<Vec<SizedNode>, LayoutError> {
        self.settle.wait(self.config.layout.settle_timeout()).await;
        let measurer = self.measurer();
        collected
            .nodes
            .iter()
            .map(|id| {
                let size = measurer.measure(scene, id).ok_or_else(|| {
                    LayoutError::MalformedInput(format!("node `{id}` is not on the canvas"))
                })?;
                Ok(SizedNode::new(id, size.width, size.height))
            })
            .collect()
    }

    fn layout_components(
        &self,
        collected: &Collected,
        sized: &[SizedNode],
        options: &LayeredOptions,
    ) -> Result<LayoutResult, LayoutError> {
        let by_id: HashMap<&str, &SizedNode> =
            sized.iter().map(|node| (node.id.as_str(), node)).collect();
        let layout = &self.config.layout;
        let mut cursor = Position::new(layout.origin_x, layout.origin_y);
        let mut combined = LayoutResult::default();

        for component in split_components(collected) {
            let nodes: Vec<SizedNode> = component
                .nodes
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|node| (*node).clone()))
                .collect();
            let mut part = self.backend.layout(&nodes, &component.edges, options)?;
            part.translate(cursor.x - part.bounds.min_x, cursor.y - part.bounds.min_y);
            if layout.direction.is_horizontal() {
                cursor.y += part.bounds.height() + layout.component_spacing;
            } else {
                cursor.x += part.bounds.width() + layout.component_spacing;
            }
            combined.extend(part);
        }
        Ok(combined)
    }
}

fn original_positions(scene: &Scene, collected: &Collected) -> HashMap<String, Position> {
    collected
        .nodes
        .iter()
        .filter_map(|id| scene.position(id).map(|position| (id.clone(), position)))
        .collect()
}

fn apply_moved<F>(
    result: &LayoutResult,
    originals: &HashMap<String, Position>,
    mut apply: F,
) -> Vec<String>
where
    F: FnMut(&str, Position),
{
    let mut applied = Vec::new();
    for node in &result.nodes {
        let target = node.position();
        let unchanged = originals
            .get(&node.id)
            .is_some_and(|original| original.approx_eq(target, APPLY_TOLERANCE));
        if unchanged {
            continue;
        }
        apply(&node.id, target);
        applied.push(node.id.clone());
    }
    applied
}
