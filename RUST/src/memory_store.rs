use crate::error::{ReltreeError, Result};
use crate::record::{Record, RecordId, RecordKey};
use crate::scope::{apply_scopes, Scope};
use crate::store::{Macro, PageQuery, RecordStore, Reflection};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

// Fixture layout:
// { "name": "...", "types": { "<Type>": { "fields": [..], "relationships": { "<name>": {..} } } },
//   "records": { "<Type>": [ { "id": .., ... } ] } }

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: BTreeMap<String, TypeDef>,
    #[serde(default)]
    records: BTreeMap<String, Vec<Map<String, Value>>>,
}

#[derive(Debug, Default, Deserialize)]
struct TypeDef {
    #[serde(default)]
    fields: Option<Vec<String>>,
    #[serde(default)]
    relationships: BTreeMap<String, RelationshipDef>,
}

#[derive(Debug, Deserialize)]
struct RelationshipDef {
    #[serde(rename = "macro")]
    macro_kind: Macro,
    target: String,
    #[serde(default)]
    foreign_key: Option<String>,
}

#[derive(Debug, Default)]
struct TypeSchema {
    fields: Option<Vec<String>>,
    relationships: HashMap<String, Reflection>,
}

/// A record store held entirely in memory, usually loaded from a JSON fixture.
#[derive(Debug, Default)]
pub struct MemoryStore {
    name: String,
    types: HashMap<String, TypeSchema>,
    records: HashMap<String, Vec<Record>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut store = Self::from_json_str(&text)?;
        if store.name.is_empty() {
            store.name = path.display().to_string();
        }
        Ok(store)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(text)?;
        Self::from_fixture(fixture)
    }

    fn from_fixture(fixture: Fixture) -> Result<Self> {
        let mut store = Self::new(fixture.name.unwrap_or_default());

        for type_name in fixture.types.keys().chain(fixture.records.keys()) {
            store.define_type(type_name);
        }

        for (type_name, def) in &fixture.types {
            if let Some(schema) = store.types.get_mut(type_name) {
                schema.fields = def.fields.clone();
            }
            for (name, rel) in &def.relationships {
                store.define_relationship(type_name, name, rel.macro_kind, &rel.target, rel.foreign_key.as_deref())?;
            }
        }

        for (type_name, rows) in fixture.records {
            for fields in rows {
                store.insert(&type_name, fields)?;
            }
        }

        tracing::debug!(
            store = %store.name,
            types = store.types.len(),
            records = store.records.values().map(Vec::len).sum::<usize>(),
            "loaded memory store"
        );
        Ok(store)
    }

    pub fn define_type(&mut self, type_name: &str) {
        self.types.entry(type_name.to_string()).or_default();
        self.records.entry(type_name.to_string()).or_default();
    }

    /// Declare a relationship. Without an explicit foreign key, `has_*` relationships use
    /// `<owner_type>_id` on the target and `belongs_to` uses `<name>_id` on the owner.
    pub fn define_relationship(
        &mut self,
        type_name: &str,
        name: &str,
        macro_kind: Macro,
        target: &str,
        foreign_key: Option<&str>,
    ) -> Result<()> {
        if !self.types.contains_key(target) {
            return Err(ReltreeError::UnknownRelationship {
                type_name: type_name.to_string(),
                relationship: name.to_string(),
                target: target.to_string(),
            });
        }

        let foreign_key = match foreign_key {
            Some(fk) => fk.to_string(),
            None => match macro_kind {
                Macro::BelongsTo => format!("{name}_id"),
                Macro::HasMany | Macro::HasOne => format!("{}_id", snake_case(type_name)),
            },
        };

        self.define_type(type_name);
        let schema = self.types.entry(type_name.to_string()).or_default();
        schema.relationships.insert(
            name.to_string(),
            Reflection {
                name: name.to_string(),
                macro_kind,
                target: target.to_string(),
                foreign_key,
            },
        );
        Ok(())
    }

    pub fn insert(&mut self, type_name: &str, fields: Map<String, Value>) -> Result<RecordKey> {
        let id = fields
            .get("id")
            .and_then(RecordId::from_value)
            .ok_or_else(|| ReltreeError::Store(format!("{type_name} record without a usable `id` field")))?;

        self.define_type(type_name);
        let key = RecordKey::new(type_name, id);
        self.records
            .entry(type_name.to_string())
            .or_default()
            .push(Record::new(key.clone(), fields));
        Ok(key)
    }

    fn rows(&self, type_name: &str) -> &[Record] {
        self.records.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn related(&self, owner: &Record, reflection: &Reflection) -> Vec<&Record> {
        let targets = self.rows(&reflection.target);
        match reflection.macro_kind {
            Macro::BelongsTo => {
                let Some(fk) = RecordId::from_value(&owner.get(&reflection.foreign_key)) else {
                    return vec![];
                };
                targets.iter().filter(|r| *r.id() == fk).collect()
            }
            Macro::HasMany | Macro::HasOne => targets
                .iter()
                .filter(|r| {
                    RecordId::from_value(&r.get(&reflection.foreign_key)).as_ref() == Some(owner.id())
                })
                .collect(),
        }
    }
}

impl RecordStore for MemoryStore {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    fn relationships(&self, type_name: &str) -> Vec<Reflection> {
        let mut rels: Vec<Reflection> = self
            .types
            .get(type_name)
            .map(|s| s.relationships.values().cloned().collect())
            .unwrap_or_default();
        rels.sort_by(|a, b| a.name.cmp(&b.name));
        rels
    }

    fn field_names(&self, type_name: &str) -> Vec<String> {
        if let Some(fields) = self.types.get(type_name).and_then(|s| s.fields.clone()) {
            return fields;
        }

        let mut names: Vec<String> = vec![];
        for record in self.rows(type_name) {
            for name in record.fields.keys() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    fn find(&self, type_name: &str, id: &RecordId, scope: Option<&Scope>) -> Result<Option<Record>> {
        let found = self
            .rows(type_name)
            .iter()
            .filter(|r| r.id() == id)
            .find(|r| scope.map_or(true, |s| s.matches(r)));
        Ok(found.cloned())
    }

    fn reflect(&self, type_name: &str, relationship: &str) -> Option<Reflection> {
        self.types.get(type_name)?.relationships.get(relationship).cloned()
    }

    fn fetch_many(&self, owner: &Record, reflection: &Reflection, query: &PageQuery<'_>) -> Result<Vec<Record>> {
        let filtered = apply_scopes(self.related(owner, reflection), &query.scopes);
        Ok(filtered
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    fn fetch_one(&self, owner: &Record, reflection: &Reflection, scopes: &[&Scope]) -> Result<Option<Record>> {
        let filtered = apply_scopes(self.related(owner, reflection), scopes);
        Ok(filtered.into_iter().next().cloned())
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
