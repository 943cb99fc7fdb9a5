use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dialogue_layout::config::{Config, LayoutConfig};
use dialogue_layout::ir::{Choice, DialogueNode, GraphNode, Scene};
use dialogue_layout::layout::{
    FlagLock, IncrementalPlacer, LayeredLayout, LayeredOptions, LayoutEngine, Measurer,
    OperationLock, RankedLayout, SceneSizes, SizedNode, Size, collect_canvas,
};
use futures::executor::block_on;
use std::hint::black_box;
use std::rc::Rc;

/// Branching story: every third node is a two-way choice, the rest are text
/// nodes; both branches of a choice rejoin two steps later.
fn branching_scene(nodes: usize) -> Scene {
    let mut scene = Scene::new();
    for i in 0..nodes {
        let id = format!("n{i}");
        let next = (i + 1 < nodes).then(|| format!("n{}", i + 1));
        let skip = format!("n{}", i + 2);
        let payload = if i % 3 == 0 && i + 2 < nodes {
            DialogueNode::choice(
                &format!("Decision {i}"),
                vec![
                    Choice::new("a", "Go on", next.as_deref()),
                    Choice::new("b", "Skip ahead", Some(skip.as_str())),
                ],
            )
        } else {
            DialogueNode::text(&format!("Line {i} of the story"), next.as_deref())
        };
        let width = 160.0 + (i % 5) as f32 * 20.0;
        scene.insert(GraphNode::new(&id, payload).sized(width, 80.0));
    }
    scene
}

fn sized_input(scene: &Scene) -> (Vec<SizedNode>, Vec<dialogue_layout::ir::GraphEdge>) {
    let collected = collect_canvas(scene);
    let nodes = collected
        .nodes
        .iter()
        .filter_map(|id| scene.get(id))
        .map(|node| SizedNode::new(&node.id, node.width, node.height))
        .collect();
    (nodes, collected.edges)
}

fn bench_layered(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered");
    let options = LayeredOptions::from_config(&LayoutConfig::default());
    for size in [20usize, 100, 400] {
        let scene = branching_scene(size);
        let input = sized_input(&scene);
        group.bench_with_input(BenchmarkId::new("ranked", size), &input, |b, (nodes, edges)| {
            b.iter(|| {
                let result = RankedLayout.layout(black_box(nodes), black_box(edges), &options);
                black_box(result.map(|r| r.nodes.len()).unwrap_or(0));
            });
        });
    }
    group.finish();
}

fn bench_whole_canvas(c: &mut Criterion) {
    let mut group = c.benchmark_group("whole_canvas");
    for size in [20usize, 100, 400] {
        let scene = branching_scene(size);
        let lock: Rc<dyn OperationLock> = Rc::new(FlagLock::new());
        let engine = LayoutEngine::new(Config::default(), lock);
        group.bench_with_input(BenchmarkId::from_parameter(size), &scene, |b, scene| {
            b.iter(|| {
                let status = block_on(engine.run_whole_canvas(black_box(scene), |_, _| {}));
                black_box(status.is_ok());
            });
        });
    }
    group.finish();
}

fn bench_place_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_next");
    let config = Config::default();
    for size in [20usize, 100] {
        let mut scene = branching_scene(size);
        // crowd everything into one strip so the slot scan has to work
        for (idx, node) in scene.nodes.values_mut().enumerate() {
            node.position.x = (idx % 10) as f32 * 200.0;
            node.position.y = (idx / 10) as f32 * 100.0;
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), &scene, |b, scene| {
            let measurer = Measurer::new(&SceneSizes, &config.measure);
            b.iter(|| {
                let mut placer = IncrementalPlacer::from_config(&config);
                let pos = placer.place_next(
                    black_box(scene),
                    &measurer,
                    None,
                    Size::new(180.0, 80.0),
                );
                black_box(pos);
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_layered, bench_whole_canvas, bench_place_next
);
criterion_main!(benches);
