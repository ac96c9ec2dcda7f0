//! Entity registry.
//!
//! Maps an entity type tag (the metadata class name) to its metadata and an
//! optional hook run on every record hydrated for that entity. Built once at
//! startup and handed to the [`Database`](crate::Database).

use crate::error::{OrmError, Result};
use crate::query::table::TableMetadata;
use crate::record::Record;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Post-hydration callback
pub type HydrationHook = Box<dyn Fn(&mut Record) + Send + Sync>;

struct Entry {
    metadata: Arc<TableMetadata>,
    hook: Option<HydrationHook>,
}

/// Entity type tag to metadata and hydration hook
#[derive(Default)]
pub struct EntityRegistry {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("EntityRegistry").field("entities", &names).finish()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata under its class name, replacing any earlier entry
    pub fn register(&mut self, metadata: Arc<TableMetadata>) -> &mut Self {
        self.entries.insert(
            metadata.class_name().to_string(),
            Entry {
                metadata,
                hook: None,
            },
        );
        self
    }

    /// Register metadata with a hook run after each record is hydrated
    pub fn register_with_hook<F>(&mut self, metadata: Arc<TableMetadata>, hook: F) -> &mut Self
    where
        F: Fn(&mut Record) + Send + Sync + 'static,
    {
        self.entries.insert(
            metadata.class_name().to_string(),
            Entry {
                metadata,
                hook: Some(Box::new(hook)),
            },
        );
        self
    }

    pub fn get(&self, class_name: &str) -> Option<&Arc<TableMetadata>> {
        self.entries.get(class_name).map(|e| &e.metadata)
    }

    /// Look up metadata by class name
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnknownEntity`] for unregistered names.
    pub fn resolve(&self, class_name: &str) -> Result<Arc<TableMetadata>> {
        self.get(class_name)
            .cloned()
            .ok_or_else(|| OrmError::UnknownEntity(class_name.to_string()))
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.entries.contains_key(class_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the hook registered for the record's entity, if any
    pub(crate) fn after_hydrate(&self, record: &mut Record) {
        if let Some(hook) = self
            .entries
            .get(record.metadata().class_name())
            .and_then(|e| e.hook.as_ref())
        {
            hook(record);
        }
    }
}
