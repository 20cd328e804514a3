use crate::error::Result;
use crate::record::Record;
use crate::scope::Scope;
use crate::store::{PageQuery, RecordStore, Reflection};

/// Per-relationship page bookkeeping.
///
/// `offset` always equals the number of records fetched so far from the relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub has_more: bool,
    pub loaded: bool,
}

impl Pagination {
    /// Fetch the page starting at the current offset and advance past it.
    ///
    /// One record beyond `limit` is requested purely to learn whether another page exists;
    /// it is dropped before returning.
    pub fn fetch_next(
        &mut self,
        store: &dyn RecordStore,
        owner: &Record,
        reflection: &Reflection,
        scopes: &[&Scope],
        limit: usize,
    ) -> Result<Vec<Record>> {
        let limit = limit.max(1);
        let query = PageQuery {
            scopes: scopes.to_vec(),
            offset: self.offset,
            limit: limit + 1,
        };

        let mut records = store.fetch_many(owner, reflection, &query)?;
        self.has_more = records.len() > limit;
        records.truncate(limit);
        self.offset += records.len();
        self.loaded = true;

        tracing::debug!(
            owner = %owner.key,
            relationship = %reflection.name,
            fetched = records.len(),
            offset = self.offset,
            has_more = self.has_more,
            "fetched page"
        );
        Ok(records)
    }

    /// Singular relationships load exactly once and never paginate.
    pub fn fetch_single(
        &mut self,
        store: &dyn RecordStore,
        owner: &Record,
        reflection: &Reflection,
        scopes: &[&Scope],
    ) -> Result<Option<Record>> {
        let record = store.fetch_one(owner, reflection, scopes)?;
        self.offset = usize::from(record.is_some());
        self.has_more = false;
        self.loaded = true;
        Ok(record)
    }
}
