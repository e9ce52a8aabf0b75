//! Content measurement for fetched block trees.

use crate::model::{Block, BlockKind};
use std::collections::BTreeMap;

/// Quick statistics for user-facing progress messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSummary {
    pub total_blocks: usize,
    pub deepest_nesting: usize,
    pub media_blocks: usize,
    /// Media blocks whose file is hosted by Notion and will expire.
    pub hosted_media: usize,
    /// Unsupported block tags and how often each occurs.
    pub unsupported: BTreeMap<String, usize>,
}

/// Measures a block tree. A flat list has nesting depth 1; an empty one 0.
pub fn measure_content(blocks: &[Block]) -> ContentSummary {
    let mut summary = ContentSummary::default();
    walk_blocks(&mut summary, blocks, 1);
    summary
}

fn walk_blocks(summary: &mut ContentSummary, blocks: &[Block], depth: usize) {
    if blocks.is_empty() {
        return;
    }
    summary.deepest_nesting = summary.deepest_nesting.max(depth);

    for block in blocks {
        summary.total_blocks += 1;
        if let Some(media) = block.media() {
            summary.media_blocks += 1;
            if media.source.is_hosted() {
                summary.hosted_media += 1;
            }
        }
        if let BlockKind::Unsupported { block_type, .. } = block.kind() {
            *summary.unsupported.entry(block_type.clone()).or_default() += 1;
        }
        walk_blocks(summary, block.children(), depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileSource;
    use crate::types::{BlockId, TextRun};

    fn id(s: &str) -> BlockId {
        BlockId::opaque(s).unwrap()
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(measure_content(&[]), ContentSummary::default());
    }

    #[test]
    fn test_counts_nested_blocks_media_and_unsupported() {
        let blocks = vec![
            Block::toggle(id("t"), vec![TextRun::plain("t")]).with_children(vec![
                Block::image(
                    id("i"),
                    FileSource::Hosted {
                        url: "https://s3.us-west-2.amazonaws.com/a.png".into(),
                        expiry_time: None,
                    },
                ),
                Block::new(
                    id("c"),
                    BlockKind::Unsupported {
                        block_type: "column_list".into(),
                        raw: serde_json::Value::Null,
                    },
                ),
            ]),
            Block::image(id("e"), FileSource::External { url: "https://cdn.example/b.png".into() }),
        ];

        let summary = measure_content(&blocks);
        assert_eq!(summary.total_blocks, 4);
        assert_eq!(summary.deepest_nesting, 2);
        assert_eq!(summary.media_blocks, 2);
        assert_eq!(summary.hosted_media, 1);
        assert_eq!(summary.unsupported.get("column_list"), Some(&1));
    }
}
