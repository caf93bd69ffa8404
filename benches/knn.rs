//! Criterion benchmarks: tree construction, point-level KNN, cloud search,
//! and bitmap set distances.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cumulus::distance::{cloud_discrete_euclidean, cloud_euclidean};
use cumulus::{
    perturb_clouds, synthetic_clouds, BitmapCloudIndex, BkTree, CellGrid, CloudPoint,
    CloudVotingIndex, ListOfClusters, PointCloud, SetDistance, SparseBitmap, VpTree,
};

fn flatten(clouds: &[PointCloud]) -> Vec<CloudPoint> {
    clouds.iter().flat_map(|c| c.tagged_points()).collect()
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");
    group.sample_size(20);

    for n in [1_000, 5_000] {
        let items = flatten(&synthetic_clouds(n / 10, 10, 1000.0, 42));

        group.bench_with_input(BenchmarkId::new("vptree", n), &items, |b, items| {
            b.iter(|| {
                let mut tree = VpTree::new(cloud_euclidean);
                tree.build(black_box(items.clone())).unwrap();
                tree.len()
            })
        });

        group.bench_with_input(BenchmarkId::new("bktree", n), &items, |b, items| {
            b.iter(|| {
                let mut tree = BkTree::new(cloud_discrete_euclidean);
                tree.build(black_box(items.clone())).unwrap();
                tree.len()
            })
        });

        group.bench_with_input(BenchmarkId::new("list_of_clusters", n), &items, |b, items| {
            b.iter(|| {
                let mut index = ListOfClusters::new(cloud_euclidean, 64);
                index.build(black_box(items.clone())).unwrap();
                index.len()
            })
        });
    }

    group.finish();
}

fn bench_point_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_knn");

    let clouds = synthetic_clouds(1_000, 10, 1000.0, 42);
    let items = flatten(&clouds);
    let queries = flatten(&perturb_clouds(&clouds[..10], 1.0, 1000.0, 123));

    let mut vptree = VpTree::new(cloud_euclidean);
    vptree.build(items.clone()).unwrap();
    let mut bktree = BkTree::new(cloud_discrete_euclidean);
    bktree.build(items.clone()).unwrap();
    let mut clusters = ListOfClusters::new(cloud_euclidean, 100);
    clusters.build(items.clone()).unwrap();

    for k in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("vptree", k), &k, |b, &k| {
            b.iter(|| {
                for query in &queries {
                    black_box(vptree.knn(black_box(query), k).unwrap());
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("bktree", k), &k, |b, &k| {
            b.iter(|| {
                for query in &queries {
                    black_box(bktree.knn(black_box(query), k).unwrap());
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("list_of_clusters", k), &k, |b, &k| {
            b.iter(|| {
                for query in &queries {
                    black_box(clusters.knn(black_box(query), k).unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_cloud_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("cloud_knn");
    group.sample_size(20);

    let clouds = synthetic_clouds(200, 50, 1000.0, 42);
    let query = perturb_clouds(&clouds[..1], 1.0, 1000.0, 123).remove(0);

    let mut voting = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
    voting.build(&clouds).unwrap();

    for internal_k in [1, 4, 16] {
        group.bench_with_input(
            BenchmarkId::new("voting_internal_k", internal_k),
            &internal_k,
            |b, &internal_k| b.iter(|| voting.knn(black_box(&query), 10, internal_k).unwrap()),
        );
    }

    let grid = CellGrid::new(1000, 10).unwrap();
    for metric in [SetDistance::Cosine, SetDistance::Hamming, SetDistance::Jaccard] {
        let mut index = BitmapCloudIndex::new(grid, metric);
        index.build(&clouds).unwrap();
        group.bench_with_input(
            BenchmarkId::new("bitmap", format!("{metric:?}")),
            &index,
            |b, index| b.iter(|| index.knn(black_box(&query), 10).unwrap()),
        );
    }

    group.finish();
}

fn bench_bitmap_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitmap_distance");

    let universe = 40_000u64;
    let x = SparseBitmap::from_positions(universe, (0..universe).step_by(7)).unwrap();
    let y = SparseBitmap::from_positions(universe, (0..universe).step_by(11)).unwrap();

    for metric in [SetDistance::Cosine, SetDistance::Hamming, SetDistance::Jaccard] {
        group.bench_with_input(
            BenchmarkId::new("pair", format!("{metric:?}")),
            &metric,
            |b, &metric| b.iter(|| metric.distance(black_box(&x), black_box(&y))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tree_build,
    bench_point_knn,
    bench_cloud_knn,
    bench_bitmap_distance,
);
criterion_main!(benches);
