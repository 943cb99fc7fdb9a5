mod collect;
mod engine;
mod error;
mod geometry;
mod layered;
mod measure;
mod placement;
mod ranking;
mod reconcile;
mod settle;
pub(crate) mod types;

pub use collect::{collect, collect_canvas, collect_forest, find_all_roots, split_components, successors};
pub use engine::{
    FlagLock, LayoutEngine, LayoutOutcome, LayoutPhase, OperationLock, RunStatus, SkipReason,
};
pub use error::LayoutError;
pub use geometry::{bounds_of, first_overlap, overlaps, overlaps_any};
pub use layered::{LayeredLayout, LayeredOptions, RankedLayout, SizedNode, validate_input};
pub use measure::{
    FixedSizes, MeasurementSource, Measurer, NoRender, SceneSizes, SharedSizes, SizeReporter,
    estimate_footprint,
};
pub use placement::IncrementalPlacer;
pub use reconcile::reconcile;
pub use settle::{
    ImmediateSettle, RenderSettle, SettleNotifier, SignalSettle, TimeoutSettle, TimerFn,
    host_timer,
};
pub use types::*;
