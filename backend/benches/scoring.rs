use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use parkfinder::models::{GeoPoint, LotStatusSnapshot};
use parkfinder::recommend::recommend;
use parkfinder::routing::{nearest_point, route_rng, synthesize_route};
use rand::{Rng, SeedableRng, rngs::SmallRng};

const CITY_HALL: GeoPoint = GeoPoint::new(37.5663, 126.9779);

fn random_lots(count: usize) -> Vec<LotStatusSnapshot> {
    let mut rng = SmallRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            let capacity = rng.gen_range(0..500);
            LotStatusSnapshot {
                code: i.to_string(),
                name: format!("lot {i}"),
                location: Some(GeoPoint::new(
                    CITY_HALL.latitude + rng.gen_range(-0.15..0.15),
                    CITY_HALL.longitude + rng.gen_range(-0.15..0.15),
                )),
                capacity,
                current_occupancy: rng.gen_range(0..=capacity),
                ..Default::default()
            }
        })
        .collect()
}

fn benchmark_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    for count in [100, 1_000, 10_000] {
        let lots = random_lots(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &lots, |b, lots| {
            b.iter(|| recommend(black_box(CITY_HALL), black_box(lots), 5, 10.0))
        });
    }

    group.finish();
}

fn benchmark_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize_route");

    let cases = [
        ("short", GeoPoint::new(37.5700, 126.9800)),
        ("city", GeoPoint::new(37.4979, 127.0276)),
        ("intercity", GeoPoint::new(35.1796, 129.0756)),
    ];
    for (name, goal) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &goal, |b, goal| {
            let mut rng = route_rng(Some(7));
            b.iter(|| synthesize_route(black_box(CITY_HALL), black_box(*goal), &mut rng))
        });
    }

    group.finish();
}

fn benchmark_nearest_point(c: &mut Criterion) {
    let mut rng = route_rng(Some(11));
    let route = synthesize_route(CITY_HALL, GeoPoint::new(35.1796, 129.0756), &mut rng)
        .expect("valid endpoints");
    let probe = GeoPoint::new(36.4, 127.9);

    c.bench_function("nearest_point", |b| {
        b.iter(|| nearest_point(black_box(&route.path), black_box(probe)))
    });
}

criterion_group!(
    benches,
    benchmark_recommend,
    benchmark_synthesize,
    benchmark_nearest_point
);
criterion_main!(benches);
