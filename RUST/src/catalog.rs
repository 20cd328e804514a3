use crate::config::Config;
use crate::store::{RecordStore, Reflection};

/// One browsable record type: its relationships and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary {
    pub name: String,
    pub relationships: Vec<Reflection>,
    pub fields: Vec<String>,
}

/// Every type in the store that the configuration does not exclude, sorted by name.
pub fn discover(store: &dyn RecordStore, config: &Config) -> Vec<TypeSummary> {
    store
        .type_names()
        .into_iter()
        .filter(|name| !config.excluded_types.iter().any(|x| x == name))
        .map(|name| TypeSummary {
            relationships: store.relationships(&name),
            fields: store.field_names(&name),
            name,
        })
        .collect()
}
