//! Property tests for the layout engine and the incremental placer.

use std::rc::Rc;

use dialogue_layout::config::Config;
use dialogue_layout::ir::{Choice, DialogueNode, GraphNode, Scene};
use dialogue_layout::layout::{
    FlagLock, IncrementalPlacer, LayoutEngine, Measurer, OperationLock, Position, Rect,
    RunStatus, SceneSizes, Size, first_overlap,
};
use futures::executor::block_on;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Shape {
    Text(Option<usize>),
    Choice(Vec<Option<usize>>),
}

fn shape_strategy(count: usize) -> impl Strategy<Value = Shape> {
    prop_oneof![
        3 => proptest::option::of(0..count).prop_map(Shape::Text),
        1 => proptest::collection::vec(proptest::option::of(0..count), 0..4)
            .prop_map(Shape::Choice),
    ]
}

fn size_strategy() -> impl Strategy<Value = (f32, f32)> {
    ((40u32..300).prop_map(|w| w as f32), (30u32..200).prop_map(|h| h as f32))
}

/// Random dialogue graphs, cycles and self-links included.
fn scene_strategy() -> impl Strategy<Value = Scene> {
    (1usize..16).prop_flat_map(|count| {
        proptest::collection::vec((shape_strategy(count), size_strategy()), count).prop_map(
            |nodes| {
                let id = |idx: usize| format!("n{idx}");
                Scene::from_nodes(nodes.into_iter().enumerate().map(|(idx, (shape, (w, h)))| {
                    let payload = match shape {
                        Shape::Text(next) => {
                            DialogueNode::text("line", next.map(id).as_deref())
                        }
                        Shape::Choice(targets) => DialogueNode::choice(
                            "pick",
                            targets
                                .into_iter()
                                .enumerate()
                                .map(|(key, next)| {
                                    Choice::new(&format!("c{key}"), "option", next.map(id).as_deref())
                                })
                                .collect(),
                        ),
                    };
                    GraphNode::new(&id(idx), payload).sized(w, h)
                }))
            },
        )
    })
}

fn engine() -> LayoutEngine {
    let lock: Rc<dyn OperationLock> = Rc::new(FlagLock::new());
    LayoutEngine::new(Config::default(), lock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn whole_canvas_never_overlaps(scene in scene_strategy()) {
        let engine = engine();
        let status = block_on(engine.run_whole_canvas(&scene, |_, _| {})).unwrap();
        let RunStatus::Completed(outcome) = status else {
            return Err(TestCaseError::fail("whole-canvas run was skipped"));
        };
        prop_assert_eq!(outcome.result.nodes.len(), scene.len());
        let layout = &engine.config().layout;
        prop_assert_eq!(
            first_overlap(&outcome.result.nodes, layout.margin_x, layout.margin_y),
            None
        );
    }

    #[test]
    fn descendants_keep_anchor_in_place(
        scene in scene_strategy(),
        pick in any::<prop::sample::Index>(),
        x in -5000i32..5000,
        y in -5000i32..5000,
    ) {
        let mut scene = scene;
        let ids: Vec<String> = scene.nodes.keys().cloned().collect();
        let anchor = pick.get(&ids).clone();
        let original = Position::new(x as f32 * 0.5, y as f32 * 0.25);
        scene.set_position(&anchor, original);

        let engine = engine();
        let status = block_on(engine.run_descendants(&scene, &anchor, |_, _| {})).unwrap();
        let RunStatus::Completed(outcome) = status else {
            return Err(TestCaseError::fail("descendants run was skipped"));
        };
        prop_assert_eq!(outcome.position(&anchor), Some(original));
        prop_assert!(!outcome.applied.contains(&anchor));
        let layout = &engine.config().layout;
        prop_assert_eq!(
            first_overlap(&outcome.result.nodes, layout.margin_x, layout.margin_y),
            None
        );
    }

    #[test]
    fn place_next_always_answers(
        blockers in proptest::collection::vec(
            ((-20i32..40), (-20i32..40), size_strategy()),
            0..40,
        ),
        new_size in size_strategy(),
    ) {
        let scene = Scene::from_nodes(blockers.into_iter().enumerate().map(|(idx, (x, y, (w, h)))| {
            GraphNode::new(&format!("b{idx}"), DialogueNode::text("x", None))
                .at(x as f32 * 25.0, y as f32 * 25.0)
                .sized(w, h)
        }));
        let config = Config::default();
        let measurer = Measurer::new(&SceneSizes, &config.measure);
        let mut placer = IncrementalPlacer::from_config(&config);
        let last = Rect::new(0.0, 0.0, 120.0, 60.0);
        let pos = placer.place_next(&scene, &measurer, Some(last), Size::new(new_size.0, new_size.1));
        prop_assert!(pos.x.is_finite() && pos.y.is_finite());
        prop_assert!(pos.x >= last.right() + config.placement.spacing_x);
        prop_assert!(pos.y >= last.y);
    }
}
