//! Post-filters that prune the working set of classes before rendering.
//!
//! Filters mutate a set of [`ClassId`]s in place and are applied in listed
//! order. Configuration records dispatch on their `kind` string; callers can
//! register additional kinds through a [`FilterRegistry`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{GraphError, Result};
use crate::graph::{ClassGraph, ClassId};

mod builtin;

pub use builtin::{
    AbstractKeeper, ByNameRemover, ByPartialNameKeeper, ByPartialNameRemover, ConnectedKeeper,
    LoneParentsRemover, PackageRemover, RelatedKeeper,
};

/// A pruning step over the working set of classes.
///
/// Filters only ever remove ids; an id dropped by an earlier filter never
/// comes back.
pub trait ClassFilter: fmt::Debug {
    /// Remove the ids this filter rejects from `classes`.
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>);
}

/// One configured filter, builtin or registered.
#[derive(Debug)]
pub enum Filter {
    /// Drop whole root packages.
    PackageRemover(PackageRemover),
    /// Drop classes matched by exact name.
    ByNameRemover(ByNameRemover),
    /// Drop classes matched by substring.
    ByPartialNameRemover(ByPartialNameRemover),
    /// Keep classes containing every substring.
    ByPartialNameKeeper(ByPartialNameKeeper),
    /// Drop parents whose children were all filtered away.
    LoneParentsRemover(LoneParentsRemover),
    /// Keep the undirected closure around seed classes.
    ConnectedKeeper(ConnectedKeeper),
    /// Keep ancestors and descendants of seed classes.
    RelatedKeeper(RelatedKeeper),
    /// Keep abstract classes only.
    AbstractKeeper(AbstractKeeper),
    /// A filter built by a registered extension.
    Custom(Box<dyn ClassFilter>),
}

impl Filter {
    /// Apply the underlying filter.
    pub fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        match self {
            Filter::PackageRemover(f) => f.apply(graph, classes),
            Filter::ByNameRemover(f) => f.apply(graph, classes),
            Filter::ByPartialNameRemover(f) => f.apply(graph, classes),
            Filter::ByPartialNameKeeper(f) => f.apply(graph, classes),
            Filter::LoneParentsRemover(f) => f.apply(graph, classes),
            Filter::ConnectedKeeper(f) => f.apply(graph, classes),
            Filter::RelatedKeeper(f) => f.apply(graph, classes),
            Filter::AbstractKeeper(f) => f.apply(graph, classes),
            Filter::Custom(f) => f.apply(graph, classes),
        }
    }

    /// Kind name, matching the configuration `kind` strings for builtins.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::PackageRemover(_) => "PackageRemover",
            Filter::ByNameRemover(_) => "ByNameRemover",
            Filter::ByPartialNameRemover(_) => "ByPartialNameRemover",
            Filter::ByPartialNameKeeper(_) => "ByPartialNameKeeper",
            Filter::LoneParentsRemover(_) => "LoneParentsRemover",
            Filter::ConnectedKeeper(_) => "ConnectedKeeper",
            Filter::RelatedKeeper(_) => "RelatedKeeper",
            Filter::AbstractKeeper(_) => "AbstractKeeper",
            Filter::Custom(_) => "custom",
        }
    }
}

fn default_active() -> bool {
    true
}

/// A filter entry as it appears in configuration.
///
/// Every key besides `kind` and `active` is forwarded to the filter being
/// built as a parameter. Builtin kinds reject keys they do not declare.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterRecord {
    /// Which filter kind to build.
    pub kind: String,
    /// Inactive records are skipped at load time.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Remaining keys, forwarded to the filter constructor.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Builds a custom filter from raw configuration parameters.
pub type FilterBuilder = fn(&Map<String, Value>) -> Result<Box<dyn ClassFilter>>;

/// Registry of caller-supplied filter kinds.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    builders: HashMap<String, FilterBuilder>,
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register a builder for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, builder: FilterBuilder) {
        self.builders.insert(kind.into(), builder);
    }

    /// Build a filter for `kind` from raw parameters.
    pub fn build(&self, kind: &str, params: &Map<String, Value>) -> Result<Box<dyn ClassFilter>> {
        match self.builders.get(kind) {
            Some(builder) => builder(params),
            None => Err(GraphError::unknown_filter_kind(kind)),
        }
    }
}

fn parse_params<T>(kind: &str, params: &Map<String, Value>) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| GraphError::invalid_filter_params(kind, e.to_string()))
}

/// Build one filter from its configuration record.
pub fn build_filter(record: &FilterRecord, registry: &FilterRegistry) -> Result<Filter> {
    let filter = match record.kind.as_str() {
        "PackageRemover" => Filter::PackageRemover(parse_params(&record.kind, &record.params)?),
        "ByNameRemover" => Filter::ByNameRemover(parse_params(&record.kind, &record.params)?),
        "ByPartialNameRemover" => {
            Filter::ByPartialNameRemover(parse_params(&record.kind, &record.params)?)
        }
        "ByPartialNameKeeper" => {
            Filter::ByPartialNameKeeper(parse_params(&record.kind, &record.params)?)
        }
        "LoneParentsRemover" => {
            Filter::LoneParentsRemover(parse_params(&record.kind, &record.params)?)
        }
        "ConnectedKeeper" => Filter::ConnectedKeeper(parse_params(&record.kind, &record.params)?),
        "RelatedKeeper" => Filter::RelatedKeeper(parse_params(&record.kind, &record.params)?),
        "AbstractKeeper" => Filter::AbstractKeeper(parse_params(&record.kind, &record.params)?),
        _ => Filter::Custom(registry.build(&record.kind, &record.params)?),
    };
    Ok(filter)
}

/// Build the active filters from configuration records, in order.
///
/// Inactive records are skipped. An unknown kind fails the whole load.
pub fn load_filters(records: &[FilterRecord], registry: &FilterRegistry) -> Result<Vec<Filter>> {
    let mut filters = Vec::with_capacity(records.len());
    for record in records {
        if !record.active {
            debug!("skipping inactive filter '{}'", record.kind);
            continue;
        }
        filters.push(build_filter(record, registry)?);
    }
    Ok(filters)
}

/// Apply `filters` to the working set, in order.
pub fn apply_filters(filters: &[Filter], graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
    for filter in filters {
        let before = classes.len();
        filter.apply(graph, classes);
        debug!(
            "filter {} kept {} of {} classes",
            filter.name(),
            classes.len(),
            before
        );
    }
}
