//! Arena-backed binary space partition of a page.
//!
//! Nodes live in a flat `Vec` and refer to their children by index; a
//! tree is immutable once built. Per-node side data (the optimiser's cut
//! parameters) is stored in parallel arrays indexed by [`NodeId`].

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitKind {
    /// Cut parallel to the x axis: first child on top.
    H,
    /// Cut parallel to the y axis: first child on the geometric left.
    V,
}

impl SplitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SplitKind::H => "H",
            SplitKind::V => "V",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode {
    Leaf {
        panel_index: usize,
        rect: Rect,
    },
    Split {
        split: SplitKind,
        left: NodeId,
        right: NodeId,
        rect: Rect,
    },
}

impl TreeNode {
    pub fn rect(&self) -> &Rect {
        match self {
            TreeNode::Leaf { rect, .. } | TreeNode::Split { rect, .. } => rect,
        }
    }
}

/// Panel input shared by the sampler and the optimiser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub panel_index: usize,
    #[serde(default = "default_importance")]
    pub importance_score: f64,
}

pub const DEFAULT_IMPORTANCE: f64 = 5.0;

fn default_importance() -> f64 {
    DEFAULT_IMPORTANCE
}

impl PanelSpec {
    pub fn new(panel_index: usize, importance_score: f64) -> Self {
        Self {
            panel_index,
            importance_score,
        }
    }
}

/// Importance of `panel_index`, or the default when it is not listed.
pub fn importance_of(panels: &[PanelSpec], panel_index: usize) -> f64 {
    panels
        .iter()
        .find(|p| p.panel_index == panel_index)
        .map(|p| p.importance_score)
        .unwrap_or(DEFAULT_IMPORTANCE)
}

/// Flattened leaf: truncated `[x, y, w, h]` page rectangle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatPanel {
    pub panel_index: usize,
    pub importance_score: f64,
    pub bbox: [i32; 4],
}

/// Incremental arena construction.
#[derive(Default)]
pub struct TreeBuilder {
    nodes: Vec<TreeNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, panel_index: usize, rect: Rect) -> NodeId {
        self.nodes.push(TreeNode::Leaf { panel_index, rect });
        self.nodes.len() - 1
    }

    /// `left` and `right` must come from this builder.
    pub fn split(&mut self, split: SplitKind, left: NodeId, right: NodeId, rect: Rect) -> NodeId {
        debug_assert!(left < self.nodes.len() && right < self.nodes.len());
        self.nodes.push(TreeNode::Split {
            split,
            left,
            right,
            rect,
        });
        self.nodes.len() - 1
    }

    pub fn finish(self, root: NodeId) -> LayoutTree {
        debug_assert!(root < self.nodes.len());
        LayoutTree {
            nodes: self.nodes,
            root,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl LayoutTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Arena size; valid ids are `0..node_count()`.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Leaves in depth-first, left-before-right order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match &self.nodes[id] {
                TreeNode::Leaf { .. } => out.push(id),
                TreeNode::Split { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        out
    }

    /// Split nodes in pre-order (node, left subtree, right subtree).
    pub fn split_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let TreeNode::Split { left, right, .. } = &self.nodes[id] {
                out.push(id);
                stack.push(*right);
                stack.push(*left);
            }
        }
        out
    }

    /// Structural signature such as `H[L(0)|V[L(2)|L(1)]]`; ignores geometry.
    pub fn signature(&self) -> String {
        let mut s = String::new();
        self.write_signature(self.root, &mut s);
        s
    }

    fn write_signature(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id] {
            TreeNode::Leaf { panel_index, .. } => {
                let _ = write!(out, "L({panel_index})");
            }
            TreeNode::Split {
                split, left, right, ..
            } => {
                out.push_str(split.as_str());
                out.push('[');
                self.write_signature(*left, out);
                out.push('|');
                self.write_signature(*right, out);
                out.push(']');
            }
        }
    }

    /// Leaf rectangles in leaf order, carrying each panel's importance.
    pub fn flatten(&self, panels: &[PanelSpec]) -> Vec<FlatPanel> {
        self.leaves()
            .into_iter()
            .filter_map(|id| match &self.nodes[id] {
                TreeNode::Leaf { panel_index, rect } => Some(FlatPanel {
                    panel_index: *panel_index,
                    importance_score: importance_of(panels, *panel_index),
                    bbox: rect.to_xywh_i32(),
                }),
                TreeNode::Split { .. } => None,
            })
            .collect()
    }

    /// Nested, serialisable view of the tree.
    pub fn to_nested(&self) -> NestedNode {
        self.nested(self.root)
    }

    fn nested(&self, id: NodeId) -> NestedNode {
        match &self.nodes[id] {
            TreeNode::Leaf { panel_index, rect } => NestedNode::Leaf {
                panel_index: *panel_index,
                rect: *rect,
            },
            TreeNode::Split {
                split,
                left,
                right,
                rect,
            } => NestedNode::Node {
                split: *split,
                rect: *rect,
                left: Box::new(self.nested(*left)),
                right: Box::new(self.nested(*right)),
            },
        }
    }

    pub fn from_nested(nested: &NestedNode) -> LayoutTree {
        fn build(b: &mut TreeBuilder, n: &NestedNode) -> NodeId {
            match n {
                NestedNode::Leaf { panel_index, rect } => b.leaf(*panel_index, *rect),
                NestedNode::Node {
                    split,
                    rect,
                    left,
                    right,
                } => {
                    let l = build(b, left);
                    let r = build(b, right);
                    b.split(*split, l, r, *rect)
                }
            }
        }
        let mut builder = TreeBuilder::new();
        let root = build(&mut builder, nested);
        builder.finish(root)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NestedNode {
    Leaf {
        panel_index: usize,
        rect: Rect,
    },
    Node {
        split: SplitKind,
        rect: Rect,
        left: Box<NestedNode>,
        right: Box<NestedNode>,
    },
}
