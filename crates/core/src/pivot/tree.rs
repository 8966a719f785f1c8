//! Nested catalogs built by the aggregator.
//!
//! Headers are collected in a mutable builder of ordered sets and frozen into
//! an immutable [`HeaderCatalog`]. Rows are count trees keyed by day.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::DayKey;

/// A node whose children live in an ordered map keyed by label.
pub(crate) trait Branch: Sized {
    fn children_mut(&mut self) -> &mut BTreeMap<String, Self>;

    /// Walk `path`, creating missing nodes with `make`.
    ///
    /// Existing nodes along the path are returned untouched.
    fn get_or_insert_path<F>(&mut self, path: &[&str], make: &mut F) -> &mut Self
    where
        F: FnMut() -> Self,
    {
        match path.split_first() {
            None => self,
            Some((head, rest)) => {
                let child = self
                    .children_mut()
                    .entry((*head).to_string())
                    .or_insert_with(|| make());
                child.get_or_insert_path(rest, make)
            }
        }
    }
}

#[derive(Debug, Default)]
struct HeaderSet {
    children: BTreeMap<String, HeaderSet>,
}

impl Branch for HeaderSet {
    fn children_mut(&mut self) -> &mut BTreeMap<String, Self> {
        &mut self.children
    }
}

impl HeaderSet {
    fn freeze(self) -> Vec<HeaderNode> {
        self.children
            .into_iter()
            .map(|(label, set)| HeaderNode {
                label,
                children: set.freeze(),
            })
            .collect()
    }
}

/// Mutable header catalog used while scanning records.
#[derive(Debug)]
pub struct HeaderCatalogBuilder {
    levels: usize,
    root: HeaderSet,
}

impl HeaderCatalogBuilder {
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            root: HeaderSet::default(),
        }
    }

    /// Register one combination. Duplicates collapse by set membership.
    pub fn register(&mut self, path: &[&str]) {
        let path = &path[..path.len().min(self.levels)];
        self.root
            .get_or_insert_path(path, &mut HeaderSet::default);
    }

    /// Freeze every set into an ordered sequence.
    pub fn finish(self) -> HeaderCatalog {
        HeaderCatalog {
            levels: self.levels,
            roots: self.root.freeze(),
        }
    }
}

/// One column-defining label and the labels nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderNode {
    pub label: String,
    pub children: Vec<HeaderNode>,
}

impl HeaderNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of columns beneath this header cell.
    ///
    /// Every non-leaf child contributes its own span plus its Total column.
    pub fn span(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.iter().map(HeaderNode::width).sum()
    }

    /// Columns occupied by this node including its own Total column.
    pub fn width(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.span() + 1
        }
    }

    /// Number of leaf labels beneath this node.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(HeaderNode::leaf_count).sum()
        }
    }

    pub fn child(&self, label: &str) -> Option<&HeaderNode> {
        self.children.iter().find(|c| c.label == label)
    }
}

/// Distinct source/medium/campaign/term combinations, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderCatalog {
    levels: usize,
    roots: Vec<HeaderNode>,
}

impl HeaderCatalog {
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Top-level (source) headers.
    pub fn roots(&self) -> &[HeaderNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// True if `path` (a prefix of at most `levels` labels) is present.
    pub fn contains(&self, path: &[&str]) -> bool {
        let Some((first, rest)) = path.split_first() else {
            return true;
        };
        let Some(mut node) = self.roots.iter().find(|n| n.label == *first) else {
            return false;
        };
        for label in rest {
            match node.child(label) {
                Some(next) => node = next,
                None => return false,
            }
        }
        true
    }

    /// All leaf paths in display order.
    pub fn leaf_paths(&self) -> Vec<Vec<&str>> {
        fn walk<'a>(node: &'a HeaderNode, prefix: &mut Vec<&'a str>, out: &mut Vec<Vec<&'a str>>) {
            prefix.push(&node.label);
            if node.is_leaf() {
                out.push(prefix.clone());
            } else {
                for child in &node.children {
                    walk(child, prefix, out);
                }
            }
            prefix.pop();
        }

        let mut out = Vec::new();
        let mut prefix = Vec::with_capacity(self.levels);
        for root in &self.roots {
            walk(root, &mut prefix, &mut out);
        }
        out
    }
}

/// Count tree for one day. Every node counts the records that passed through it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowNode {
    count: u64,
    children: BTreeMap<String, RowNode>,
}

impl Branch for RowNode {
    fn children_mut(&mut self) -> &mut BTreeMap<String, Self> {
        &mut self.children
    }
}

impl RowNode {
    /// Count one record along `path`.
    pub(crate) fn tally(&mut self, path: &[&str]) {
        self.count += 1;
        if let Some((head, rest)) = path.split_first() {
            self.get_or_insert_path(std::slice::from_ref(head), &mut RowNode::default)
                .tally(rest);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn child(&self, label: &str) -> Option<&RowNode> {
        self.children.get(label)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &RowNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Node at `path`, if any record reached it.
    pub fn lookup(&self, path: &[&str]) -> Option<&RowNode> {
        path.iter()
            .try_fold(self, |node, label| node.child(label))
    }

    /// Count at `path`; absent paths count as zero.
    pub fn count_at(&self, path: &[&str]) -> u64 {
        self.lookup(path).map_or(0, RowNode::count)
    }

    /// Visit every node exactly `depth` levels below this one.
    pub fn for_each_at_depth<'a>(
        &'a self,
        depth: usize,
        prefix: &mut Vec<&'a str>,
        visit: &mut dyn FnMut(&[&'a str], &'a RowNode),
    ) {
        if depth == 0 {
            visit(prefix, self);
            return;
        }
        for (label, child) in &self.children {
            prefix.push(label);
            child.for_each_at_depth(depth - 1, prefix, visit);
            prefix.pop();
        }
    }
}

/// Per-day count trees, in calendar order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCatalog {
    days: BTreeMap<DayKey, RowNode>,
}

impl RowCatalog {
    pub(crate) fn from_days(days: BTreeMap<DayKey, RowNode>) -> Self {
        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn days(&self) -> impl Iterator<Item = (&DayKey, &RowNode)> {
        self.days.iter()
    }

    pub fn day(&self, day: &DayKey) -> Option<&RowNode> {
        self.days.get(day)
    }

    /// Count for `path` on `day`; absent data counts as zero.
    pub fn count(&self, day: &DayKey, path: &[&str]) -> u64 {
        self.days.get(day).map_or(0, |node| node.count_at(path))
    }

    /// Sum of all records across days.
    pub fn total(&self) -> u64 {
        self.days.values().map(RowNode::count).sum()
    }
}
