mod app;
mod catalog;
mod config;
mod error;
mod input;
mod memory_store;
mod node;
mod pagination;
mod record;
mod render;
mod scope;
mod scrollbar;
mod state;
mod store;

pub mod logging;
pub mod terminal;

pub use crate::app::{dispatch, run};
pub use crate::catalog::{discover, TypeSummary};
pub use crate::config::{ChildConfig, Config, FieldConfig, LabelFn, LabelFormat, ModelConfig, DEFAULT_MAX_DEPTH, DEFAULT_PAGE_SIZE};
pub use crate::error::{ReltreeError, Result};
pub use crate::input::{action_for, Action, ByteSource, InputHandler, ESC};
pub use crate::memory_store::MemoryStore;
pub use crate::node::{
    parent_path, AssociationGroupNode, FlatRow, LoadMoreNode, NodeContext, NodeKind, NodePath, RecordNode, TreeNode,
    LOAD_MORE_LABEL,
};
pub use crate::pagination::Pagination;
pub use crate::record::{display_value, Record, RecordId, RecordKey};
pub use crate::render::{encode, strip_ansi, Layout, Renderer, APP_NAME, CHROME_ROWS, MIN_TREE_WIDTH, TREE_WIDTH_RATIO, VERSION};
pub use crate::scope::{Condition, Op, Scope};
pub use crate::scrollbar::{thumb, Thumb};
pub use crate::state::{Pane, TreeState, DEFAULT_PANE_HEIGHT};
pub use crate::store::{Macro, PageQuery, RecordStore, Reflection};
