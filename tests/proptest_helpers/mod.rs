#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use seglabel::dataset::{Dataset, Dimensions, ImageRecord};
use seglabel::geometry::{Point, Polygon};
use seglabel::label::{LabelClass, LabelState};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// One operator action on the labeling state.
#[derive(Clone, Debug)]
pub enum Op {
    Add(LabelClass, Point),
    Commit,
    Undo,
}

pub fn apply(state: &mut LabelState, op: &Op) {
    match op {
        Op::Add(class, point) => {
            state.add_point(*class, *point);
        }
        Op::Commit => {
            state.commit();
        }
        Op::Undo => {
            state.undo();
        }
    }
}

/// Comparable copy of every buffer and committed polygon.
pub type StateView = [(Polygon, Vec<Polygon>); 2];

pub fn view(state: &LabelState) -> StateView {
    LabelClass::ALL.map(|class| {
        (
            state.buffer(class).clone(),
            state.committed(class).to_vec(),
        )
    })
}

pub fn arb_class() -> BoxedStrategy<LabelClass> {
    prop_oneof![Just(LabelClass::First), Just(LabelClass::Second)].boxed()
}

pub fn arb_point() -> BoxedStrategy<Point> {
    (0i32..4096, 0i32..4096)
        .prop_map(|(x, y)| Point::new(x, y))
        .boxed()
}

pub fn arb_op() -> BoxedStrategy<Op> {
    prop_oneof![
        6 => (arb_class(), arb_point()).prop_map(|(class, point)| Op::Add(class, point)),
        2 => Just(Op::Commit),
        1 => Just(Op::Undo),
    ]
    .boxed()
}

pub fn arb_ops(max_ops: usize) -> BoxedStrategy<Vec<Op>> {
    prop::collection::vec(arb_op(), 0..=max_ops).boxed()
}

pub fn arb_polygon(max_points: usize) -> BoxedStrategy<Polygon> {
    prop::collection::vec(arb_point(), 1..=max_points)
        .prop_map(Polygon::from)
        .boxed()
}

pub fn arb_dimensions() -> BoxedStrategy<Dimensions> {
    (1u32..4096, 1u32..4096)
        .prop_map(|(height, width)| Dimensions::new(height, width, 3))
        .boxed()
}

/// Dataset of up to `max_images` records with unique paths, each holding up
/// to `max_polygons` polygons per class.
pub fn arb_dataset(max_images: usize, max_polygons: usize) -> BoxedStrategy<Dataset> {
    let record = (
        arb_dimensions(),
        prop::collection::vec(arb_polygon(8), 0..=max_polygons),
        prop::collection::vec(arb_polygon(8), 0..=max_polygons),
    );
    prop::collection::vec(record, 0..=max_images)
        .prop_map(|records| {
            let mut dataset = Dataset::new();
            for (i, (dimensions, first, second)) in records.into_iter().enumerate() {
                dataset.record_image(ImageRecord::new(
                    format!("images/img_{:03}.jpg", i),
                    dimensions,
                    first,
                    second,
                ));
            }
            dataset
        })
        .boxed()
}
