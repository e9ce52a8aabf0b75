// benches/normalize_bench.rs
//! Benchmarks for list normalization and HTML rendering.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notionpress::model::{Block, BlockKind, HeadingLevel, TextContent};
use notionpress::{normalize, render_nodes, BlockId, HtmlContext, TextRun};

/// Builds a random tree of list runs, headings and paragraphs.
fn create_sample_blocks(depth: usize, breadth: usize) -> Vec<Block> {
    fn create_block(level: usize, index: usize, max_depth: usize, breadth: usize) -> Block {
        let id = BlockId::opaque(format!("block-{}-{}", level, index)).unwrap();
        let text = TextContent::new(vec![TextRun::plain(&format!(
            "Item {} at level {} with enough text to look like product copy",
            index, level
        ))]);
        let kind = match rand::random::<u32>() % 6 {
            0 => BlockKind::Heading {
                level: HeadingLevel::H2,
                content: text,
                is_toggleable: false,
            },
            1 | 2 => BlockKind::BulletedListItem(text),
            3 | 4 => BlockKind::NumberedListItem(text),
            _ => BlockKind::Paragraph(text),
        };

        let block = Block::new(id, kind);
        if level < max_depth {
            let children = (0..breadth)
                .map(|i| create_block(level + 1, index * breadth + i, max_depth, breadth))
                .collect();
            block.with_children(children)
        } else {
            block
        }
    }

    (0..breadth)
        .map(|i| create_block(0, i, depth, breadth))
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let tree_configs = vec![(2, 6, "small"), (3, 6, "medium"), (4, 6, "large")];

    for (depth, breadth, name) in tree_configs {
        let blocks = create_sample_blocks(depth, breadth);

        group.bench_with_input(BenchmarkId::new("group_lists", name), &blocks, |b, blocks| {
            b.iter(|| normalize(black_box(blocks), 0));
        });

        let nodes = normalize(&blocks, 0);
        group.bench_with_input(BenchmarkId::new("render_html", name), &nodes, |b, nodes| {
            b.iter(|| render_nodes(black_box(nodes), &HtmlContext::default()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
