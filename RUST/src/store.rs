use crate::error::Result;
use crate::record::{Record, RecordId};
use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of relationship, named after the association macros records are usually declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Macro {
    HasMany,
    HasOne,
    BelongsTo,
}

impl Macro {
    /// Singular relationships resolve to at most one record and never paginate.
    pub fn is_singular(&self) -> bool {
        matches!(self, Self::HasOne | Self::BelongsTo)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasMany => "has_many",
            Self::HasOne => "has_one",
            Self::BelongsTo => "belongs_to",
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one named relationship of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflection {
    pub name: String,
    pub macro_kind: Macro,
    pub target: String,
    pub foreign_key: String,
}

impl Reflection {
    pub fn is_singular(&self) -> bool {
        self.macro_kind.is_singular()
    }
}

/// A page request against a plural relationship.
///
/// Scopes are applied in order (store-wide first, then the relationship's own),
/// then `offset`, then `limit`.
#[derive(Debug, Clone)]
pub struct PageQuery<'a> {
    pub scopes: Vec<&'a Scope>,
    pub offset: usize,
    pub limit: usize,
}

/// The external record collaborator the tree reads from.
///
/// Calls are synchronous; the interactive loop blocks while a fetch is in flight.
pub trait RecordStore {
    /// Short human description of where the records come from (shown in the header).
    fn source_name(&self) -> String;

    fn has_type(&self, type_name: &str) -> bool;

    /// Every record type the store knows, sorted by name.
    fn type_names(&self) -> Vec<String>;

    /// Every relationship declared on a type, sorted by name.
    fn relationships(&self, type_name: &str) -> Vec<Reflection>;

    /// All field names of a type, in declaration order.
    fn field_names(&self, type_name: &str) -> Vec<String>;

    /// Look up one record by id, honoring `scope` when given.
    fn find(&self, type_name: &str, id: &RecordId, scope: Option<&Scope>) -> Result<Option<Record>>;

    /// Resolve a relationship by name. `None` when the type has no such relationship.
    fn reflect(&self, type_name: &str, relationship: &str) -> Option<Reflection>;

    fn fetch_many(&self, owner: &Record, reflection: &Reflection, query: &PageQuery<'_>) -> Result<Vec<Record>>;

    fn fetch_one(&self, owner: &Record, reflection: &Reflection, scopes: &[&Scope]) -> Result<Option<Record>>;
}
