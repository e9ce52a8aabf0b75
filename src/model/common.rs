use super::Block;
use crate::types::BlockId;
use serde::{Deserialize, Serialize};

/// Fields every block carries regardless of its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCommon {
    pub id: BlockId,
    /// Attached after retrieval by the tree fetcher; empty until then.
    pub children: Vec<Block>,
    /// What the provider reported, whether or not children were attached.
    pub has_children: bool,
}

impl BlockCommon {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            children: Vec::new(),
            has_children: false,
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }
}
