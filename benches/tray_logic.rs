use criterion::{black_box, criterion_group, criterion_main, Criterion};
use classic_blocks::core::config::Tuning;
use classic_blocks::core::occupancy::Occupancy;
use classic_blocks::core::oracle::{find_cavities, find_line_completion_gaps};
use classic_blocks::core::rng::SimpleRng;
use classic_blocks::core::shapes::{Shape, ShapeLibrary};
use classic_blocks::core::tracker::GameTracker;
use classic_blocks::core::types::{ShapeId, TRAY_SIZE};
use classic_blocks::engine::policy::GreedyPolicy;
use classic_blocks::engine::solver::{can_clear_with_three_pieces, simulate_tray_placement};
use classic_blocks::engine::{GenerateContext, TrayGenerator};

fn mid_game_board() -> Occupancy {
    Occupancy::from_ascii(&[
        "........",
        "##......",
        "###...#.",
        "####.###",
        "##.#####",
        "#.######",
        "######..",
        "#######.",
    ])
}

fn shapes(library: &ShapeLibrary, ids: [u8; TRAY_SIZE]) -> [&Shape; TRAY_SIZE] {
    ids.map(|id| library.get(ShapeId(id)).expect("catalog shape"))
}

fn bench_solver(c: &mut Criterion) {
    let library = ShapeLibrary::classic();
    let grid = mid_game_board();
    let tray = shapes(&library, [4, 14, 31]);

    c.bench_function("simulate_tray_placement", |b| {
        b.iter(|| simulate_tray_placement(black_box(grid), tray, &GreedyPolicy))
    });
}

fn bench_clear_check(c: &mut Criterion) {
    let library = ShapeLibrary::classic();
    let grid = mid_game_board();
    // Hard shapes that rarely complete a line on this board.
    let tray = shapes(&library, [26, 33, 40]);

    c.bench_function("can_clear_with_three_pieces", |b| {
        b.iter(|| can_clear_with_three_pieces(black_box(grid), &tray))
    });
}

fn bench_board_features(c: &mut Criterion) {
    let grid = mid_game_board();

    c.bench_function("find_cavities_and_gaps", |b| {
        b.iter(|| {
            let cavities = find_cavities(black_box(grid));
            let gaps = find_line_completion_gaps(black_box(grid));
            (cavities.len(), gaps.len())
        })
    });
}

fn bench_full_refill(c: &mut Criterion) {
    let generator = TrayGenerator::new(Tuning::default());
    let grid = mid_game_board();
    let mut rng = SimpleRng::new(12345);

    c.bench_function("full_refill", |b| {
        b.iter(|| {
            let mut tracker = GameTracker::new();
            generator.generate(&mut GenerateContext {
                grid: black_box(grid),
                slots_to_fill: TRAY_SIZE,
                tracker: &mut tracker,
                rng: &mut rng,
            })
        })
    });
}

criterion_group!(
    benches,
    bench_solver,
    bench_clear_check,
    bench_board_features,
    bench_full_refill
);
criterion_main!(benches);
