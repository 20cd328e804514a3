use crate::config::{Config, FieldConfig};
use crate::error::Result;
use crate::pagination::Pagination;
use crate::record::{Record, RecordKey};
use crate::scope::Scope;
use crate::store::{RecordStore, Reflection};
use serde_json::Value;

pub const LOAD_MORE_LABEL: &str = "[load more...]";

/// Address of a node: child indices walked from the root. The root is the empty path.
///
/// A node's parent is its path without the last index.
pub type NodePath = Vec<usize>;

pub fn parent_path(path: &[usize]) -> Option<&[usize]> {
    path.split_last().map(|(_, parent)| parent)
}

/// What a node needs from the tree that owns it, handed in per call instead of stored.
#[derive(Clone, Copy)]
pub struct NodeContext<'a> {
    pub store: &'a dyn RecordStore,
    pub config: &'a Config,
    /// Record identity of the current tree root.
    pub root_key: &'a RecordKey,
}

impl<'a> NodeContext<'a> {
    pub fn new(store: &'a dyn RecordStore, config: &'a Config, root_key: &'a RecordKey) -> Self {
        Self { store, config, root_key }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Record,
    Group,
    LoadMore,
}

/// One line of the visible-node sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub path: NodePath,
    pub depth: usize,
    pub kind: NodeKind,
    pub label: String,
    pub expandable: bool,
    pub expanded: bool,
    pub record_key: Option<RecordKey>,
}

impl FlatRow {
    pub fn is_record(&self) -> bool {
        self.kind == NodeKind::Record
    }
}

#[derive(Debug)]
pub enum TreeNode {
    Record(RecordNode),
    Group(AssociationGroupNode),
    LoadMore(LoadMoreNode),
}

impl TreeNode {
    /// A fresh, expanded tree root for `record`.
    pub fn root(record: Record) -> Self {
        let mut node = RecordNode::new(record, 0);
        node.expanded = true;
        Self::Record(node)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Record(_) => NodeKind::Record,
            Self::Group(_) => NodeKind::Group,
            Self::LoadMore(_) => NodeKind::LoadMore,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Self::Record(n) => n.depth,
            Self::Group(n) => n.depth,
            Self::LoadMore(n) => n.depth,
        }
    }

    pub fn expanded(&self) -> bool {
        match self {
            Self::Record(n) => n.expanded,
            Self::Group(n) => n.expanded,
            Self::LoadMore(_) => false,
        }
    }

    pub(crate) fn set_expanded(&mut self, expanded: bool) {
        match self {
            Self::Record(n) => n.expanded = expanded,
            Self::Group(n) => n.expanded = expanded,
            Self::LoadMore(_) => {}
        }
    }

    pub fn label(&self, config: &Config) -> String {
        match self {
            Self::Record(n) => n.label(config),
            Self::Group(n) => n.label(),
            Self::LoadMore(n) => n.label().to_string(),
        }
    }

    pub fn expandable(&mut self, ctx: &NodeContext<'_>) -> bool {
        match self {
            Self::Record(n) => n.expandable(ctx),
            Self::Group(_) => true,
            Self::LoadMore(_) => false,
        }
    }

    /// Children, loading them on first access. Later calls return the cached sequence.
    pub fn children(&mut self, ctx: &NodeContext<'_>) -> Result<&[TreeNode]> {
        let children = self.children_mut(ctx)?;
        Ok(children)
    }

    pub fn children_mut(&mut self, ctx: &NodeContext<'_>) -> Result<&mut [TreeNode]> {
        match self {
            Self::Record(n) => Ok(n.groups(ctx).as_mut_slice()),
            Self::Group(n) => {
                n.load(ctx)?;
                Ok(n.children.as_mut_slice())
            }
            Self::LoadMore(_) => Ok(&mut []),
        }
    }

    /// Children already in memory, without triggering any load.
    pub fn loaded_children(&self) -> &[TreeNode] {
        match self {
            Self::Record(n) => n.groups.as_deref().unwrap_or(&[]),
            Self::Group(n) => &n.children,
            Self::LoadMore(_) => &[],
        }
    }

    pub fn as_record(&self) -> Option<&RecordNode> {
        match self {
            Self::Record(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&AssociationGroupNode> {
        match self {
            Self::Group(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut AssociationGroupNode> {
        match self {
            Self::Group(n) => Some(n),
            _ => None,
        }
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&TreeNode> {
        let mut node = self;
        for &idx in path {
            node = node.loaded_children().get(idx)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut TreeNode> {
        let mut node = self;
        for &idx in path {
            node = match node {
                Self::Record(n) => n.groups.as_mut()?.get_mut(idx)?,
                Self::Group(n) => n.children.get_mut(idx)?,
                Self::LoadMore(_) => return None,
            };
        }
        Some(node)
    }

    /// Depth-first pre-order walk: every node contributes itself, and its children only
    /// when it is both expanded and expandable. Collapsed subtrees are never descended into.
    pub fn visible_rows(&mut self, ctx: &NodeContext<'_>) -> Vec<FlatRow> {
        let mut out = vec![];
        let mut path = vec![];
        self.collect_visible(ctx, &mut path, &mut out);
        out
    }

    fn collect_visible(&mut self, ctx: &NodeContext<'_>, path: &mut NodePath, out: &mut Vec<FlatRow>) {
        let expandable = self.expandable(ctx);
        let expanded = self.expanded();
        out.push(FlatRow {
            path: path.clone(),
            depth: self.depth(),
            kind: self.kind(),
            label: self.label(ctx.config),
            expandable,
            expanded,
            record_key: self.as_record().map(|r| r.key().clone()),
        });

        if !(expanded && expandable) {
            return;
        }

        let children = match self.children_mut(ctx) {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load children while flattening");
                return;
            }
        };
        for (idx, child) in children.iter_mut().enumerate() {
            path.push(idx);
            child.collect_visible(ctx, path, out);
            path.pop();
        }
    }
}

// ===== Record node =====

#[derive(Debug)]
pub struct RecordNode {
    record: Record,
    depth: usize,
    expanded: bool,
    /// Built once, on first use.
    groups: Option<Vec<TreeNode>>,
}

impl RecordNode {
    pub fn new(record: Record, depth: usize) -> Self {
        Self {
            record,
            depth,
            expanded: false,
            groups: None,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn key(&self) -> &RecordKey {
        &self.record.key
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    /// Only the tree state creates depth-0 record nodes, and only for its root.
    pub fn is_tree_root(&self) -> bool {
        self.depth == 0
    }

    pub fn type_label(&self) -> &str {
        self.record.type_name()
    }

    pub fn label(&self, config: &Config) -> String {
        config.model(self.record.type_name()).label_for(&self.record)
    }

    /// A second, shallower view of the root record inside its own tree would expand into
    /// an endless mirror, so such nodes are never expandable.
    pub fn expandable(&mut self, ctx: &NodeContext<'_>) -> bool {
        if !self.is_tree_root() && self.record.key == *ctx.root_key {
            return false;
        }
        !self.groups(ctx).is_empty()
    }

    fn groups(&mut self, ctx: &NodeContext<'_>) -> &mut Vec<TreeNode> {
        let depth = self.depth;
        let record = &self.record;
        self.groups.get_or_insert_with(|| build_groups(record, depth, ctx))
    }

    /// Configured fields, or every field of the type when none are configured.
    pub fn detail_fields(&self, ctx: &NodeContext<'_>) -> Vec<FieldConfig> {
        let model = ctx.config.model(self.record.type_name());
        if !model.fields.is_empty() {
            return model.fields.clone();
        }

        let mut names = ctx.store.field_names(self.record.type_name());
        if names.is_empty() {
            names = self.record.field_names();
        }
        names.into_iter().map(|name| FieldConfig::new(name, None)).collect()
    }

    pub fn detail_pairs(&self, ctx: &NodeContext<'_>) -> Vec<(String, Value)> {
        self.detail_fields(ctx)
            .into_iter()
            .map(|field| {
                let value = self.record.get(&field.name);
                (field.label, value)
            })
            .collect()
    }
}

fn build_groups(record: &Record, depth: usize, ctx: &NodeContext<'_>) -> Vec<TreeNode> {
    let model = ctx.config.model(record.type_name());
    let mut groups = Vec::with_capacity(model.children.len());

    for child in &model.children {
        let Some(reflection) = ctx.store.reflect(record.type_name(), &child.name) else {
            tracing::debug!(
                type_name = record.type_name(),
                relationship = %child.name,
                "skipping unresolvable relationship"
            );
            continue;
        };
        groups.push(TreeNode::Group(AssociationGroupNode::new(
            record.clone(),
            child.label.clone(),
            reflection,
            child.scope.clone(),
            depth + 1,
        )));
    }
    groups
}

// ===== Association group node =====

/// One named relationship of one record, with its page state and fetched children.
#[derive(Debug)]
pub struct AssociationGroupNode {
    owner: Record,
    display_label: String,
    reflection: Reflection,
    scope: Option<Scope>,
    pagination: Pagination,
    /// Record nodes, optionally followed by exactly one trailing load-more node.
    children: Vec<TreeNode>,
    depth: usize,
    expanded: bool,
}

impl AssociationGroupNode {
    pub fn new(owner: Record, display_label: String, reflection: Reflection, scope: Option<Scope>, depth: usize) -> Self {
        Self {
            owner,
            display_label,
            reflection,
            scope,
            pagination: Pagination::default(),
            children: vec![],
            depth,
            expanded: false,
        }
    }

    pub fn owner(&self) -> &Record {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.reflection.name
    }

    pub fn reflection(&self) -> &Reflection {
        &self.reflection
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn is_loaded(&self) -> bool {
        self.pagination.loaded
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more
    }

    pub fn offset(&self) -> usize {
        self.pagination.offset
    }

    pub fn is_singular(&self) -> bool {
        self.reflection.is_singular()
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn label(&self) -> String {
        let base = format!("{} ({})", self.display_label, self.reflection.macro_kind);
        if !self.pagination.loaded || self.is_singular() {
            return base;
        }
        if self.pagination.has_more {
            format!("{base} [{}+]", self.pagination.offset)
        } else {
            format!("{base} [{}]", self.record_count())
        }
    }

    pub fn record_count(&self) -> usize {
        self.children
            .iter()
            .filter(|c| matches!(c, TreeNode::Record(_)))
            .count()
    }

    /// First page (or the single related record). Never re-runs once loaded.
    pub fn load(&mut self, ctx: &NodeContext<'_>) -> Result<()> {
        if self.pagination.loaded {
            return Ok(());
        }

        let mut scopes: Vec<&Scope> = vec![];
        scopes.extend(ctx.config.global_scope.as_ref());
        scopes.extend(self.scope.as_ref());

        self.children.clear();
        if self.reflection.is_singular() {
            if let Some(record) = self
                .pagination
                .fetch_single(ctx.store, &self.owner, &self.reflection, &scopes)?
            {
                self.children.push(TreeNode::Record(RecordNode::new(record, self.depth + 1)));
            }
            return Ok(());
        }

        let records = self.pagination.fetch_next(
            ctx.store,
            &self.owner,
            &self.reflection,
            &scopes,
            ctx.config.page_size,
        )?;
        self.append_records(records);
        Ok(())
    }

    /// Fetch the next page and extend the cached children. No-op when nothing remains.
    pub fn load_more(&mut self, ctx: &NodeContext<'_>) -> Result<()> {
        if !self.pagination.loaded {
            return self.load(ctx);
        }
        if !self.pagination.has_more || self.is_singular() {
            return Ok(());
        }

        let mut scopes: Vec<&Scope> = vec![];
        scopes.extend(ctx.config.global_scope.as_ref());
        scopes.extend(self.scope.as_ref());

        let records = self.pagination.fetch_next(
            ctx.store,
            &self.owner,
            &self.reflection,
            &scopes,
            ctx.config.page_size,
        )?;
        self.children.retain(|c| !matches!(c, TreeNode::LoadMore(_)));
        self.append_records(records);
        Ok(())
    }

    fn append_records(&mut self, records: Vec<Record>) {
        let depth = self.depth + 1;
        self.children
            .extend(records.into_iter().map(|r| TreeNode::Record(RecordNode::new(r, depth))));
        if self.pagination.has_more {
            self.children.push(TreeNode::LoadMore(LoadMoreNode { depth }));
        }
    }
}

// ===== Load-more sentinel =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMoreNode {
    depth: usize,
}

impl LoadMoreNode {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn label(&self) -> &'static str {
        LOAD_MORE_LABEL
    }

    /// Activation fetches the next page of the owning group, which replaces this node.
    pub fn activate(group: &mut AssociationGroupNode, ctx: &NodeContext<'_>) -> Result<()> {
        group.load_more(ctx)
    }
}
