use crate::config::Config;
use crate::error::{ReltreeError, Result};
use crate::node::{parent_path, FlatRow, LoadMoreNode, NodeContext, NodeKind, NodePath, RecordNode, TreeNode};
use crate::record::{Record, RecordId, RecordKey};
use crate::store::RecordStore;
use serde_json::Value;
use std::sync::Arc;

/// Pane height assumed until the renderer reports the real one.
pub const DEFAULT_PANE_HEIGHT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pane {
    Tree,
    Detail,
}

/// Cursor, scroll, focus and selection over a lazily loaded record tree.
///
/// All navigation goes through these methods; nothing else mutates the tree.
pub struct TreeState {
    store: Arc<dyn RecordStore>,
    config: Arc<Config>,
    root: TreeNode,
    root_key: RecordKey,

    // Index into the visible-node sequence.
    cursor: usize,

    // Scroll offsets (number of lines from top)
    tree_scroll: usize,
    detail_scroll: usize,

    // Set by the renderer every frame.
    tree_height: usize,
    detail_height: usize,
    detail_content_height: usize,

    focus: Pane,
    // Always addresses a record node.
    selected: NodePath,
    status: Option<String>,
}

impl TreeState {
    pub fn new(store: Arc<dyn RecordStore>, config: Arc<Config>, root_record: Record) -> Self {
        let root_key = root_record.key.clone();
        Self {
            store,
            config,
            root: TreeNode::root(root_record),
            root_key,
            cursor: 0,
            tree_scroll: 0,
            detail_scroll: 0,
            tree_height: DEFAULT_PANE_HEIGHT,
            detail_height: DEFAULT_PANE_HEIGHT,
            detail_content_height: 0,
            focus: Pane::Tree,
            selected: vec![],
            status: None,
        }
    }

    /// Resolve the root record by type and id, honoring the store-wide scope.
    pub fn open(store: Arc<dyn RecordStore>, config: Arc<Config>, type_name: &str, id: &RecordId) -> Result<Self> {
        if !store.has_type(type_name) {
            return Err(ReltreeError::UnknownType(type_name.to_string()));
        }
        let record = store
            .find(type_name, id, config.global_scope.as_ref())?
            .ok_or_else(|| ReltreeError::RecordNotFound {
                type_name: type_name.to_string(),
                id: id.to_string(),
            })?;
        tracing::info!(root = %record.key, "opening tree");
        Ok(Self::new(store, config, record))
    }

    fn context(&self) -> NodeContext<'_> {
        NodeContext::new(self.store.as_ref(), &self.config, &self.root_key)
    }

    fn split(&mut self) -> (&mut TreeNode, NodeContext<'_>) {
        let ctx = NodeContext::new(self.store.as_ref(), &self.config, &self.root_key);
        (&mut self.root, ctx)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn root_key(&self) -> &RecordKey {
        &self.root_key
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tree_scroll(&self) -> usize {
        self.tree_scroll
    }

    pub fn detail_scroll(&self) -> usize {
        self.detail_scroll
    }

    pub fn tree_height(&self) -> usize {
        self.tree_height
    }

    pub fn detail_height(&self) -> usize {
        self.detail_height
    }

    pub fn detail_content_height(&self) -> usize {
        self.detail_content_height
    }

    pub fn focus(&self) -> Pane {
        self.focus
    }

    pub fn is_tree_focused(&self) -> bool {
        self.focus == Pane::Tree
    }

    pub fn is_detail_focused(&self) -> bool {
        self.focus == Pane::Detail
    }

    pub fn selected_path(&self) -> &[usize] {
        &self.selected
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The flattened, expansion-aware node sequence. Recomputed on every call.
    pub fn visible_rows(&mut self) -> Vec<FlatRow> {
        let (root, ctx) = self.split();
        root.visible_rows(&ctx)
    }

    pub fn cursor_row(&mut self) -> Option<FlatRow> {
        let cursor = self.cursor;
        self.visible_rows().into_iter().nth(cursor)
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&TreeNode> {
        self.root.node_at(path)
    }

    pub fn selected_record(&self) -> Option<&RecordNode> {
        self.root.node_at(&self.selected).and_then(TreeNode::as_record)
    }

    pub fn selected_label(&self) -> Option<String> {
        self.selected_record().map(|n| n.label(&self.config))
    }

    /// Field/value pairs of the selected record, in display order.
    pub fn detail_pairs(&self) -> Vec<(String, Value)> {
        let ctx = self.context();
        self.selected_record()
            .map(|n| n.detail_pairs(&ctx))
            .unwrap_or_default()
    }

    // ===== Cursor movement =====

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.rescroll();
    }

    pub fn move_down(&mut self) {
        let last = self.visible_rows().len().saturating_sub(1);
        self.cursor = (self.cursor + 1).min(last);
        self.rescroll();
    }

    pub fn move_to_top(&mut self) {
        self.cursor = 0;
        self.rescroll();
    }

    pub fn move_to_bottom(&mut self) {
        self.cursor = self.visible_rows().len().saturating_sub(1);
        self.rescroll();
    }

    pub fn page_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(self.tree_height.max(1));
        self.rescroll();
    }

    pub fn page_down(&mut self) {
        let last = self.visible_rows().len().saturating_sub(1);
        self.cursor = (self.cursor + self.tree_height.max(1)).min(last);
        self.rescroll();
    }

    // Minimal scroll adjustment that keeps the cursor inside the tree pane.
    fn rescroll(&mut self) {
        let height = self.tree_height.max(1);
        if self.cursor < self.tree_scroll {
            self.tree_scroll = self.cursor;
        } else if self.cursor >= self.tree_scroll + height {
            self.tree_scroll = self.cursor + 1 - height;
        }
    }

    fn clamp_cursor(&mut self) {
        let last = self.visible_rows().len().saturating_sub(1);
        self.cursor = self.cursor.min(last);
        self.rescroll();
    }

    // ===== Expansion =====

    /// Load-more rows fetch the next page; expandable rows flip their expansion.
    pub fn toggle_expand(&mut self) -> Result<()> {
        let Some(row) = self.cursor_row() else {
            return Ok(());
        };

        let res = match row.kind {
            NodeKind::LoadMore => self.activate_load_more(&row.path),
            _ if row.expandable => self.set_expanded_at(&row.path, !row.expanded),
            _ => Ok(()),
        };
        self.clamp_cursor();
        res
    }

    /// Expand without ever collapsing.
    pub fn expand_current(&mut self) -> Result<()> {
        let Some(row) = self.cursor_row() else {
            return Ok(());
        };

        let res = match row.kind {
            NodeKind::LoadMore => self.activate_load_more(&row.path),
            _ if row.expandable && !row.expanded => self.set_expanded_at(&row.path, true),
            _ => Ok(()),
        };
        self.clamp_cursor();
        res
    }

    /// Collapse the cursor node, or move to its parent when there is nothing to collapse.
    pub fn collapse_current(&mut self) -> Result<()> {
        let Some(row) = self.cursor_row() else {
            return Ok(());
        };

        if row.expandable && row.expanded {
            self.set_expanded_at(&row.path, false)?;
        } else if let Some(parent) = parent_path(&row.path) {
            if let Some(idx) = self.visible_rows().iter().position(|r| r.path.as_slice() == parent) {
                self.cursor = idx;
            }
        }
        self.clamp_cursor();
        Ok(())
    }

    fn set_expanded_at(&mut self, path: &[usize], expanded: bool) -> Result<()> {
        let (root, ctx) = self.split();
        let Some(node) = root.node_at_mut(path) else {
            return Ok(());
        };

        // Groups load before they open, so a failed fetch leaves them collapsed.
        if expanded {
            if let TreeNode::Group(group) = &mut *node {
                group.load(&ctx)?;
            }
        }
        node.set_expanded(expanded);
        Ok(())
    }

    fn activate_load_more(&mut self, path: &[usize]) -> Result<()> {
        let Some(parent) = parent_path(path) else {
            return Ok(());
        };
        let (root, ctx) = self.split();
        if let Some(TreeNode::Group(group)) = root.node_at_mut(parent) {
            LoadMoreNode::activate(group, &ctx)?;
        }
        Ok(())
    }

    // ===== Selection =====

    pub fn select_current(&mut self) {
        let Some(row) = self.cursor_row() else {
            return;
        };
        if row.is_record() {
            self.selected = row.path;
            self.detail_scroll = 0;
        }
    }

    /// Re-root the tree on the selected record. The old tree is dropped.
    pub fn make_selected_record_root(&mut self) {
        let Some(record) = self.selected_record().map(|n| n.record().clone()) else {
            return;
        };
        tracing::info!(from = %self.root_key, to = %record.key, "re-rooting tree");
        self.root_key = record.key.clone();
        self.root = TreeNode::root(record);
        self.cursor = 0;
        self.tree_scroll = 0;
        self.detail_scroll = 0;
        self.selected = vec![];
    }

    // ===== Focus and detail scrolling =====

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Tree => Pane::Detail,
            Pane::Detail => Pane::Tree,
        };
    }

    fn max_detail_scroll(&self) -> usize {
        self.detail_content_height.saturating_sub(self.detail_height)
    }

    pub fn scroll_detail_up(&mut self) {
        self.scroll_detail_by(-1);
    }

    pub fn scroll_detail_down(&mut self) {
        self.scroll_detail_by(1);
    }

    pub fn scroll_detail_by(&mut self, delta: isize) {
        let next = self.detail_scroll.saturating_add_signed(delta);
        self.detail_scroll = next.min(self.max_detail_scroll());
    }

    // ===== Renderer feedback =====

    pub fn set_tree_height(&mut self, height: usize) {
        self.tree_height = height;
        self.rescroll();
    }

    pub fn set_detail_height(&mut self, height: usize) {
        self.detail_height = height;
        self.detail_scroll = self.detail_scroll.min(self.max_detail_scroll());
    }

    pub fn set_detail_content_height(&mut self, lines: usize) {
        self.detail_content_height = lines;
        self.detail_scroll = self.detail_scroll.min(self.max_detail_scroll());
    }

    // ===== Status line =====

    pub fn report_error(&mut self, err: &ReltreeError) {
        tracing::warn!(error = %err, "operation failed");
        self.status = Some(err.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}
