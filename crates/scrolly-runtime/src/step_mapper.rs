#![forbid(unsafe_code)]

//! Logical step names to scroll indices and back.
//!
//! A story is an ordered list of [`StepDefinition`]s. Fixed steps take one
//! scroll index; a dynamic group takes as many as the active profile says it
//! has instances. Indices are handed out in a single forward pass, so the
//! resolved steps always cover `0..len` without gaps.
//!
//! # Names
//!
//! | name                  | resolves to                                  |
//! |-----------------------|----------------------------------------------|
//! | `opening`             | index of a fixed step                        |
//! | `city-episodes-2`     | index of the third instance of a group       |
//! | `city-episodes-start` | first instance, or the next slot when empty  |
//! | `city-episodes-end`   | last instance (only when count > 0)          |
//! | `city-episodes-count` | number of instances                          |
//!
//! `-start` and `-end` are aliases of instance slots. `-count` is kept in a
//! separate table, so [`StepMapper::name_of`] always returns the canonical
//! name: the fixed step name or the `group-i` instance name.
//!
//! # Caching
//!
//! The mapping is computed on first query and cached inside the mapper until
//! [`StepMapper::clear_cache`] or [`StepMapper::set_profile`] is called. It is
//! always recomputed in full.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, error, warn};

use crate::config::StoryConfig;

/// Whether a step takes one index or a data-dependent run of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Fixed,
    Dynamic,
}

/// One declared step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    pub kind: StepKind,
}

impl StepDefinition {
    pub fn fixed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Fixed,
        }
    }

    pub fn dynamic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Dynamic,
        }
    }
}

/// Where the mapper's definitions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionSource {
    /// Passed in by the caller.
    Explicit,
    /// Derived from the loaded story configuration.
    Config,
    /// Built-in opening / intro / city-episodes / footer set.
    Minimal,
}

/// Name of the dynamic group in the built-in definitions.
pub const CITY_EPISODES: &str = "city-episodes";

/// The built-in definitions used when no configuration is loaded.
pub fn minimal_definitions() -> Vec<StepDefinition> {
    vec![
        StepDefinition::fixed("opening"),
        StepDefinition::fixed("intro"),
        StepDefinition::dynamic(CITY_EPISODES),
        StepDefinition::fixed("footer"),
    ]
}

/// Contiguous run of indices belonging to one dynamic group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicRange {
    pub start: usize,
    pub count: usize,
}

impl DynamicRange {
    /// Last index of the run, `None` for an empty group.
    #[inline]
    pub fn end(&self) -> Option<usize> {
        self.count.checked_sub(1).map(|last| self.start + last)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.count
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.count
    }
}

/// Errors from resolving step definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMapError {
    /// No definitions were available from any source.
    NoDefinitions,
    /// A dynamic group has no count in the active profile.
    MissingDynamicCount {
        group: String,
        profile: Option<String>,
    },
    /// Two steps resolve to the same name.
    DuplicateName(String),
    /// A step every story needs is not defined.
    MissingRequired(&'static str),
    /// Resolved indices skip a value.
    IndexGap { after: usize, next: usize },
}

impl fmt::Display for StepMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDefinitions => write!(f, "no step definitions available"),
            Self::MissingDynamicCount {
                group,
                profile: Some(profile),
            } => write!(f, "no step count for '{group}' in profile '{profile}'"),
            Self::MissingDynamicCount {
                group,
                profile: None,
            } => write!(f, "no step count for '{group}' and no active profile"),
            Self::DuplicateName(name) => write!(f, "step name '{name}' is defined twice"),
            Self::MissingRequired(name) => write!(f, "required step '{name}' is not defined"),
            Self::IndexGap { after, next } => {
                write!(f, "indices jump from {after} to {next}")
            }
        }
    }
}

impl std::error::Error for StepMapError {}

/// The resolved name/index table.
#[derive(Debug, Clone, Default)]
pub struct StepMapping {
    names: Vec<String>,
    indices: HashMap<String, usize>,
    counts: HashMap<String, usize>,
    groups: BTreeMap<String, DynamicRange>,
    failure: Option<StepMapError>,
    duplicates: Vec<String>,
}

impl StepMapping {
    fn failed(err: StepMapError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    fn build(
        definitions: &[StepDefinition],
        mut count_for: impl FnMut(&str) -> Result<usize, StepMapError>,
    ) -> Result<Self, StepMapError> {
        if definitions.is_empty() {
            return Err(StepMapError::NoDefinitions);
        }

        let mut mapping = Self::default();
        for def in definitions {
            match def.kind {
                StepKind::Fixed => mapping.push(def.name.clone()),
                StepKind::Dynamic => {
                    let count = count_for(&def.name)?;
                    let start = mapping.names.len();
                    for i in 0..count {
                        mapping.push(format!("{}-{i}", def.name));
                    }
                    let range = DynamicRange { start, count };
                    mapping.alias(format!("{}-start", def.name), start);
                    if let Some(end) = range.end() {
                        mapping.alias(format!("{}-end", def.name), end);
                    }
                    mapping.counts.insert(format!("{}-count", def.name), count);
                    mapping.groups.insert(def.name.clone(), range);
                }
            }
        }
        Ok(mapping)
    }

    fn push(&mut self, name: String) {
        let index = self.names.len();
        if self.indices.insert(name.clone(), index).is_some() {
            self.duplicates.push(name.clone());
        }
        self.names.push(name);
    }

    fn alias(&mut self, name: String, index: usize) {
        if self.indices.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.indices.insert(name, index);
        }
    }

    /// Index for a canonical name or alias. A `group-count` name yields the
    /// group's instance count.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices
            .get(name)
            .or_else(|| self.counts.get(name))
            .copied()
    }

    /// Canonical name at `index`.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of scroll indices.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn group(&self, name: &str) -> Option<DynamicRange> {
        self.groups.get(name).copied()
    }

    /// Canonical `(name, index)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.names.iter().enumerate().map(|(i, n)| (n.as_str(), i))
    }

    /// Why the mapping is empty, if it failed.
    pub fn failure(&self) -> Option<&StepMapError> {
        self.failure.as_ref()
    }
}

/// Step name/index resolver owned by a story session.
#[derive(Debug, Clone)]
pub struct StepMapper {
    definitions: Vec<StepDefinition>,
    source: DefinitionSource,
    profiles: BTreeMap<String, BTreeMap<String, usize>>,
    profile: Option<String>,
    fallback_count: Option<usize>,
    cache: OnceCell<StepMapping>,
}

impl StepMapper {
    /// Mapper over explicit definitions.
    pub fn new(definitions: Vec<StepDefinition>) -> Self {
        Self::with_source(definitions, DefinitionSource::Explicit)
    }

    /// Mapper over the built-in definitions.
    pub fn minimal() -> Self {
        Self::with_source(minimal_definitions(), DefinitionSource::Minimal)
    }

    /// Mapper over a loaded story: its steps, profiles and active profile.
    ///
    /// A story without steps falls back to the built-in definitions.
    pub fn from_config(config: &StoryConfig) -> Self {
        let definitions: Vec<StepDefinition> = config
            .steps
            .iter()
            .map(|step| {
                if step.dynamic {
                    StepDefinition::dynamic(step.id.clone())
                } else {
                    StepDefinition::fixed(step.id.clone())
                }
            })
            .collect();

        let mut mapper = if definitions.is_empty() {
            Self::minimal()
        } else {
            Self::with_source(definitions, DefinitionSource::Config)
        };
        for (name, profile) in &config.profiles {
            mapper
                .profiles
                .insert(name.clone(), profile.dynamic_counts.clone());
        }
        mapper.profile = config.active_profile.clone();
        mapper
    }

    fn with_source(definitions: Vec<StepDefinition>, source: DefinitionSource) -> Self {
        Self {
            definitions,
            source,
            profiles: BTreeMap::new(),
            profile: None,
            fallback_count: None,
            cache: OnceCell::new(),
        }
    }

    /// Register dynamic counts for a profile.
    #[must_use]
    pub fn with_profile<I, K>(mut self, profile: impl Into<String>, counts: I) -> Self
    where
        I: IntoIterator<Item = (K, usize)>,
        K: Into<String>,
    {
        let counts = counts.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let profile = profile.into();
        if self.profile.is_none() {
            self.profile = Some(profile.clone());
        }
        self.profiles.insert(profile, counts);
        self.cache = OnceCell::new();
        self
    }

    /// Count used for a dynamic group the active profile has no count for.
    ///
    /// Off by default: a missing count is an error.
    #[must_use]
    pub fn with_fallback_count(mut self, count: usize) -> Self {
        self.fallback_count = Some(count);
        self.cache = OnceCell::new();
        self
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    pub fn source(&self) -> DefinitionSource {
        self.source
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Switch the active dataset profile. Invalidates the cache on change.
    pub fn set_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if self.profile.as_deref() != Some(profile.as_str()) {
            debug!(profile = %profile, "step profile changed");
            self.profile = Some(profile);
            self.clear_cache();
        }
    }

    /// Set the count of a dynamic group in the active profile and invalidate.
    ///
    /// Without an active profile the count goes to a profile named `default`,
    /// which becomes active.
    pub fn set_dynamic_count(&mut self, group: impl Into<String>, count: usize) {
        let profile = self
            .profile
            .get_or_insert_with(|| "default".to_owned())
            .clone();
        self.profiles
            .entry(profile)
            .or_default()
            .insert(group.into(), count);
        self.clear_cache();
    }

    /// Drop the cached mapping; the next query recomputes it.
    pub fn clear_cache(&mut self) {
        self.cache = OnceCell::new();
    }

    /// Live instance count of a dynamic group in the active profile.
    pub fn dynamic_step_count(&self, group: &str) -> Result<usize, StepMapError> {
        let configured = self
            .profile
            .as_ref()
            .and_then(|p| self.profiles.get(p))
            .and_then(|counts| counts.get(group))
            .copied();
        match (configured, self.fallback_count) {
            (Some(count), _) => Ok(count),
            (None, Some(fallback)) => {
                warn!(group, fallback, "no configured step count, using fallback");
                Ok(fallback)
            }
            (None, None) => Err(StepMapError::MissingDynamicCount {
                group: group.to_owned(),
                profile: self.profile.clone(),
            }),
        }
    }

    /// The full mapping, computed on first use.
    ///
    /// On failure the mapping is empty, the error is logged once and kept in
    /// [`StepMapping::failure`].
    pub fn calculate_all_mappings(&self) -> &StepMapping {
        self.cache.get_or_init(|| {
            let _span = debug_span!("step_mapping", profile = ?self.profile).entered();
            match StepMapping::build(&self.definitions, |g| self.dynamic_step_count(g)) {
                Ok(mapping) => {
                    debug!(steps = mapping.len(), source = ?self.source, "step mapping computed");
                    mapping
                }
                Err(err) => {
                    error!(%err, "step mapping unavailable, scroll sync disabled");
                    StepMapping::failed(err)
                }
            }
        })
    }

    /// Index for a step name. Logs a warning on a miss.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let index = self.calculate_all_mappings().index_of(name);
        if index.is_none() {
            warn!(name, "unknown step name");
        }
        index
    }

    /// Canonical name at `index`. Logs a warning on a miss.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        let name = self.calculate_all_mappings().name_of(index);
        if name.is_none() {
            warn!(index, "no step at index");
        }
        name
    }

    /// Number of resolved scroll indices.
    pub fn len(&self) -> usize {
        self.calculate_all_mappings().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculate_all_mappings().is_empty()
    }

    /// Index range of a dynamic group.
    pub fn group_range(&self, group: &str) -> Option<DynamicRange> {
        self.calculate_all_mappings().group(group)
    }

    /// Index of instance `i` of a dynamic group.
    pub fn instance_index(&self, group: &str, i: usize) -> Option<usize> {
        self.group_range(group)
            .filter(|r| i < r.count)
            .map(|r| r.start + i)
    }

    /// The dynamic group owning `index`, with the instance number within it.
    pub fn group_containing(&self, index: usize) -> Option<(&str, usize)> {
        self.calculate_all_mappings()
            .groups
            .iter()
            .find(|(_, r)| r.contains(index))
            .map(|(name, r)| (name.as_str(), index - r.start))
    }

    pub fn footer_index(&self) -> Option<usize> {
        self.index_of("footer")
    }

    /// Check the resolved mapping, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<StepMapError>> {
        let mapping = self.calculate_all_mappings();
        let mut errors = Vec::new();

        if let Some(err) = mapping.failure() {
            errors.push(err.clone());
        } else {
            for required in ["opening", "footer"] {
                if mapping.index_of(required).is_none() {
                    errors.push(StepMapError::MissingRequired(required));
                }
            }
            for name in &mapping.duplicates {
                errors.push(StepMapError::DuplicateName(name.clone()));
            }
            let mut indices: Vec<usize> = mapping
                .names
                .iter()
                .filter_map(|n| mapping.index_of(n))
                .collect();
            indices.sort_unstable();
            indices.dedup();
            for pair in indices.windows(2) {
                if pair[1] != pair[0] + 1 {
                    errors.push(StepMapError::IndexGap {
                        after: pair[0],
                        next: pair[1],
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            error!(count = errors.len(), "step configuration invalid");
            Err(errors)
        }
    }
}

impl Default for StepMapper {
    fn default() -> Self {
        Self::minimal()
    }
}
