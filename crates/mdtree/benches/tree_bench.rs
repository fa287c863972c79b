use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mdtree::{RootEntry, TreeIndex};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a directory with `dirs` subdirectories and `files` entries, half of
/// which are markdown and half of which the filter rejects
fn create_flat_dir(root: &Path, dirs: usize, files: usize) {
    fs::create_dir_all(root).unwrap();
    for i in 0..dirs {
        fs::create_dir_all(root.join(format!("dir_{:04}", i))).unwrap();
    }
    for i in 0..files {
        let name = if i % 2 == 0 {
            format!("note_{:04}.md", i)
        } else {
            format!("data_{:04}.json", i)
        };
        fs::write(root.join(name), "x").unwrap();
    }
}

/// Benchmark listing a single directory of growing size
fn bench_children_of(c: &mut Criterion) {
    let mut group = c.benchmark_group("children_of");

    for (dirs, files) in [(10, 100), (50, 1_000), (100, 5_000)] {
        let temp_dir = TempDir::new().unwrap();
        create_flat_dir(temp_dir.path(), dirs, files);

        let index = TreeIndex::with_roots([RootEntry::new(temp_dir.path(), "Bench")]);
        let root = index.roots().remove(0);

        group.bench_with_input(
            BenchmarkId::new("flat", format!("{}d_{}f", dirs, files)),
            &root,
            |b, root| b.iter(|| index.children_of(black_box(root)).unwrap()),
        );
    }

    group.finish();
}

/// Benchmark walking from a deep leaf back up to its root
fn bench_parent_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("parent_chain");

    for depth in [5, 10, 20] {
        let temp_dir = TempDir::new().unwrap();
        let mut current = temp_dir.path().to_path_buf();
        for i in 0..depth {
            current = current.join(format!("level_{}", i));
        }
        fs::create_dir_all(&current).unwrap();
        let leaf_path = current.join("leaf.md");
        fs::write(&leaf_path, "leaf").unwrap();

        let index = TreeIndex::with_roots([RootEntry::new(temp_dir.path(), "Deep")]);
        let leaf = index.handle_for_path(&leaf_path).unwrap();

        group.bench_with_input(BenchmarkId::new("depth", depth), &leaf, |b, leaf| {
            b.iter(|| {
                let mut node = black_box(leaf).clone();
                while let Some(parent) = index.parent_of(&node).unwrap() {
                    node = parent;
                }
                node
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_children_of, bench_parent_chain);
criterion_main!(benches);
