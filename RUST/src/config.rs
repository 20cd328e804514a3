use crate::error::{ReltreeError, Result};
use crate::record::{display_value, Record};
use crate::scope::Scope;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const DEFAULT_MAX_DEPTH: usize = 3;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("regex"));

static EMPTY_MODEL: Lazy<ModelConfig> = Lazy::new(|| ModelConfig::new(""));

pub type LabelFn = Arc<dyn Fn(&Record) -> String + Send + Sync>;

/// How a record node names itself in the tree.
#[derive(Clone, Default)]
pub enum LabelFormat {
    /// `<type> #<id>`
    #[default]
    Default,
    /// `{field}` placeholders are replaced by the record's field values.
    Template(String),
    Custom(LabelFn),
}

impl LabelFormat {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Record) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn render(&self, record: &Record) -> String {
        match self {
            Self::Default => format!("{} #{}", record.type_name(), record.id()),
            Self::Template(template) => PLACEHOLDER_RE
                .replace_all(template, |caps: &Captures| display_value(&record.get(&caps[1])))
                .into_owned(),
            Self::Custom(f) => f(record),
        }
    }
}

impl fmt::Debug for LabelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub name: String,
    pub label: String,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, label: Option<&str>) -> Self {
        let name = name.into();
        let label = label.map(str::to_string).unwrap_or_else(|| name.clone());
        Self { name, label }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildConfig {
    pub name: String,
    pub label: String,
    /// Applied on top of the store-wide scope, never in place of it.
    pub scope: Option<Scope>,
}

impl ChildConfig {
    pub fn new(name: impl Into<String>, label: Option<&str>, scope: Option<Scope>) -> Self {
        let name = name.into();
        let label = label.map(str::to_string).unwrap_or_else(|| name.clone());
        Self { name, label, scope }
    }
}

/// Display configuration of one record type.
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    pub type_name: String,
    pub fields: Vec<FieldConfig>,
    pub children: Vec<ChildConfig>,
    pub label: LabelFormat,
}

impl ModelConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Reconfiguring an existing field replaces it in place, keeping its position.
    pub fn configure_field(&mut self, name: &str, label: Option<&str>) -> &mut Self {
        let field = FieldConfig::new(name, label);
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn configure_fields<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.configure_field(name.as_ref(), None);
        }
        self
    }

    pub fn configure_child(&mut self, name: &str, label: Option<&str>, scope: Option<Scope>) -> &mut Self {
        let child = ChildConfig::new(name, label, scope);
        match self.children.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = child,
            None => self.children.push(child),
        }
        self
    }

    pub fn configure_children<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.configure_child(name.as_ref(), None, None);
        }
        self
    }

    pub fn configure_label(&mut self, label: LabelFormat) -> &mut Self {
        self.label = label;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&ChildConfig> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn label_for(&self, record: &Record) -> String {
        self.label.render(record)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Records fetched per page of a plural relationship.
    pub page_size: usize,
    /// Advisory only; nothing stops expansion past it.
    pub max_depth: usize,
    /// Applied to every relationship fetch and to the root lookup.
    pub global_scope: Option<Scope>,
    /// Types left out of the `--types` listing.
    pub excluded_types: Vec<String>,
    models: Vec<ModelConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            global_scope: None,
            excluded_types: vec![],
            models: vec![],
        }
    }
}

impl Config {
    /// Configuration of a type. Unconfigured types get an empty model (default label, no children).
    pub fn model(&self, type_name: &str) -> &ModelConfig {
        self.models
            .iter()
            .find(|m| m.type_name == type_name)
            .unwrap_or(&EMPTY_MODEL)
    }

    pub fn model_mut(&mut self, type_name: &str) -> &mut ModelConfig {
        let idx = match self.models.iter().position(|m| m.type_name == type_name) {
            Some(idx) => idx,
            None => {
                self.models.push(ModelConfig::new(type_name));
                self.models.len() - 1
            }
        };
        &mut self.models[idx]
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ReltreeError::Config("page_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text)?;
        let config = raw.into_config();
        config.validate()?;
        Ok(config)
    }
}

// ===== TOML shape =====

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    page_size: Option<usize>,
    max_depth: Option<usize>,
    global_scope: Option<Scope>,
    #[serde(default)]
    excluded_types: Vec<String>,
    #[serde(default)]
    models: BTreeMap<String, RawModel>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    label: Option<String>,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    children: Vec<RawChild>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawField {
    Name(String),
    Detailed { name: String, label: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawChild {
    Name(String),
    Detailed {
        name: String,
        label: Option<String>,
        scope: Option<Scope>,
    },
}

impl RawConfig {
    fn into_config(self) -> Config {
        let mut config = Config {
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            global_scope: self.global_scope.filter(|s| !s.is_empty()),
            excluded_types: self.excluded_types,
            models: vec![],
        };

        for (type_name, raw) in self.models {
            let model = config.model_mut(&type_name);
            if let Some(template) = raw.label {
                model.configure_label(LabelFormat::Template(template));
            }
            for field in raw.fields {
                match field {
                    RawField::Name(name) => model.configure_field(&name, None),
                    RawField::Detailed { name, label } => model.configure_field(&name, label.as_deref()),
                };
            }
            for child in raw.children {
                match child {
                    RawChild::Name(name) => model.configure_child(&name, None, None),
                    RawChild::Detailed { name, label, scope } => {
                        model.configure_child(&name, label.as_deref(), scope)
                    }
                };
            }
        }

        config
    }
}
