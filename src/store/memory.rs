//! In-Memory Attribute Store
//!
//! Clusters, attributes and functional command handlers kept in process
//! memory behind a shared lock. Attribute values may be backed by read/write
//! hooks so a virtual device can compute or validate values on access.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;

use super::{
    Access, AttributeStore, ClusterDirection, CommandKind, CommandOutcome, CommandRequest, Result,
    StoreError,
};
use crate::value::AttributeValue;

/// Computes an attribute value on read
pub type ReadHook = Arc<dyn Fn() -> Result<AttributeValue> + Send + Sync>;

/// Validates or transforms a value on write; returns what gets stored
pub type WriteHook = Arc<dyn Fn(AttributeValue) -> Result<AttributeValue> + Send + Sync>;

/// Executes a functional command
pub type CommandHandler = Arc<dyn Fn(&CommandRequest) -> Result<CommandOutcome> + Send + Sync>;

struct AttributeEntry {
    value: AttributeValue,
    access: Access,
    read_hook: Option<ReadHook>,
    write_hook: Option<WriteHook>,
}

struct ClusterEntry {
    direction: ClusterDirection,
    /// Ordered so discovery pages come out by ascending id
    attributes: BTreeMap<u16, AttributeEntry>,
    commands: HashMap<(CommandKind, String), CommandHandler>,
}

impl ClusterEntry {
    fn new(direction: ClusterDirection) -> Self {
        Self {
            direction,
            attributes: BTreeMap::new(),
            commands: HashMap::new(),
        }
    }
}

/// Thread-safe in-memory attribute store
#[derive(Clone, Default)]
pub struct MemoryStore {
    clusters: Arc<RwLock<BTreeMap<u16, ClusterEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cluster, or widen the directions of an existing one
    pub fn add_cluster(&self, cluster_id: u16, direction: ClusterDirection) {
        let mut clusters = self.clusters.write().unwrap_or_else(PoisonError::into_inner);
        clusters
            .entry(cluster_id)
            .and_modify(|entry| entry.direction |= direction)
            .or_insert_with(|| ClusterEntry::new(direction));
    }

    /// Add an attribute to an existing cluster
    pub fn add_attribute(
        &self,
        cluster_id: u16,
        attr_id: u16,
        value: AttributeValue,
        access: Access,
    ) -> Result<()> {
        let mut clusters = self.clusters.write().unwrap_or_else(PoisonError::into_inner);
        let cluster = clusters.get_mut(&cluster_id).ok_or(StoreError::NotFound)?;
        if cluster.attributes.contains_key(&attr_id) {
            return Err(StoreError::Other(format!(
                "attribute {:#06x} already exists in cluster {:#06x}",
                attr_id, cluster_id
            )));
        }
        cluster.attributes.insert(
            attr_id,
            AttributeEntry {
                value,
                access,
                read_hook: None,
                write_hook: None,
            },
        );
        Ok(())
    }

    pub fn set_read_hook(&self, cluster_id: u16, attr_id: u16, hook: ReadHook) -> Result<()> {
        self.with_attribute(cluster_id, attr_id, |entry| entry.read_hook = Some(hook))
    }

    pub fn set_write_hook(&self, cluster_id: u16, attr_id: u16, hook: WriteHook) -> Result<()> {
        self.with_attribute(cluster_id, attr_id, |entry| entry.write_hook = Some(hook))
    }

    /// Register a functional command handler
    pub fn add_command(
        &self,
        cluster_id: u16,
        kind: CommandKind,
        name: &str,
        handler: CommandHandler,
    ) -> Result<()> {
        let mut clusters = self.clusters.write().unwrap_or_else(PoisonError::into_inner);
        let cluster = clusters.get_mut(&cluster_id).ok_or(StoreError::NotFound)?;
        cluster.commands.insert((kind, name.to_string()), handler);
        Ok(())
    }

    /// Stored value without hooks or access checks
    pub fn peek(&self, cluster_id: u16, attr_id: u16) -> Option<AttributeValue> {
        let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
        clusters
            .get(&cluster_id)?
            .attributes
            .get(&attr_id)
            .map(|entry| entry.value.clone())
    }

    /// Local update of a stored value, bypassing access control
    pub fn set_local(&self, cluster_id: u16, attr_id: u16, value: AttributeValue) -> Result<()> {
        self.with_attribute(cluster_id, attr_id, |entry| entry.value = value)
    }

    fn with_attribute(
        &self,
        cluster_id: u16,
        attr_id: u16,
        f: impl FnOnce(&mut AttributeEntry),
    ) -> Result<()> {
        let mut clusters = self.clusters.write().unwrap_or_else(PoisonError::into_inner);
        let entry = clusters
            .get_mut(&cluster_id)
            .and_then(|cluster| cluster.attributes.get_mut(&attr_id))
            .ok_or(StoreError::NotFound)?;
        f(entry);
        Ok(())
    }
}

#[async_trait]
impl AttributeStore for MemoryStore {
    async fn read(&self, cluster_id: u16, attr_id: u16) -> Result<AttributeValue> {
        let (hook, value) = {
            let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
            let entry = clusters
                .get(&cluster_id)
                .and_then(|cluster| cluster.attributes.get(&attr_id))
                .ok_or(StoreError::NotFound)?;
            if !entry.access.contains(Access::READ) {
                return Err(StoreError::Unreadable);
            }
            (entry.read_hook.clone(), entry.value.clone())
        };

        // Hooks run outside the lock so they may touch the store themselves
        match hook {
            Some(hook) => hook(),
            None => Ok(value),
        }
    }

    async fn write(
        &self,
        cluster_id: u16,
        attr_id: u16,
        value: AttributeValue,
    ) -> Result<AttributeValue> {
        let hook = {
            let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
            let entry = clusters
                .get(&cluster_id)
                .and_then(|cluster| cluster.attributes.get(&attr_id))
                .ok_or(StoreError::NotFound)?;
            if !entry.access.contains(Access::WRITE) {
                return Err(StoreError::Unwritable);
            }
            entry.write_hook.clone()
        };

        let stored = match hook {
            Some(hook) => hook(value)?,
            None => value,
        };
        self.set_local(cluster_id, attr_id, stored.clone())?;
        Ok(stored)
    }

    fn contains(&self, cluster_id: u16, attr_id: u16) -> bool {
        let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
        clusters
            .get(&cluster_id)
            .is_some_and(|cluster| cluster.attributes.contains_key(&attr_id))
    }

    fn access(&self, cluster_id: u16, attr_id: u16) -> Option<Access> {
        let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
        clusters
            .get(&cluster_id)?
            .attributes
            .get(&attr_id)
            .map(|entry| entry.access)
    }

    fn attributes(&self, cluster_id: u16) -> Vec<u16> {
        let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
        clusters
            .get(&cluster_id)
            .map(|cluster| cluster.attributes.keys().copied().collect())
            .unwrap_or_default()
    }

    fn clusters(&self) -> Vec<(u16, ClusterDirection)> {
        let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
        clusters
            .iter()
            .map(|(id, cluster)| (*id, cluster.direction))
            .collect()
    }

    async fn exec(&self, request: CommandRequest) -> Result<CommandOutcome> {
        let handler = {
            let clusters = self.clusters.read().unwrap_or_else(PoisonError::into_inner);
            clusters
                .get(&request.cluster_id)
                .and_then(|cluster| {
                    cluster
                        .commands
                        .get(&(request.kind, request.name.clone()))
                        .cloned()
                })
                .ok_or(StoreError::NotFound)?
        };
        handler(&request)
    }
}

/// Builder for populating a [`MemoryStore`] up front
#[derive(Default)]
pub struct MemoryStoreBuilder {
    clusters: Vec<(u16, ClusterDirection)>,
    attributes: Vec<(u16, u16, AttributeValue, Access)>,
    read_hooks: Vec<(u16, u16, ReadHook)>,
    write_hooks: Vec<(u16, u16, WriteHook)>,
    commands: Vec<(u16, CommandKind, String, CommandHandler)>,
}

impl MemoryStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cluster(mut self, cluster_id: u16, direction: ClusterDirection) -> Self {
        self.clusters.push((cluster_id, direction));
        self
    }

    pub fn attribute(
        mut self,
        cluster_id: u16,
        attr_id: u16,
        value: impl Into<AttributeValue>,
        access: Access,
    ) -> Self {
        self.attributes
            .push((cluster_id, attr_id, value.into(), access));
        self
    }

    pub fn read_hook(
        mut self,
        cluster_id: u16,
        attr_id: u16,
        hook: impl Fn() -> Result<AttributeValue> + Send + Sync + 'static,
    ) -> Self {
        self.read_hooks.push((cluster_id, attr_id, Arc::new(hook)));
        self
    }

    pub fn write_hook(
        mut self,
        cluster_id: u16,
        attr_id: u16,
        hook: impl Fn(AttributeValue) -> Result<AttributeValue> + Send + Sync + 'static,
    ) -> Self {
        self.write_hooks.push((cluster_id, attr_id, Arc::new(hook)));
        self
    }

    pub fn command(
        mut self,
        cluster_id: u16,
        kind: CommandKind,
        name: &str,
        handler: impl Fn(&CommandRequest) -> Result<CommandOutcome> + Send + Sync + 'static,
    ) -> Self {
        self.commands
            .push((cluster_id, kind, name.to_string(), Arc::new(handler)));
        self
    }

    /// Build the store; fails if anything refers to an undeclared cluster
    /// or attribute
    pub fn build(self) -> Result<MemoryStore> {
        let store = MemoryStore::new();

        for (cluster_id, direction) in self.clusters {
            store.add_cluster(cluster_id, direction);
        }
        for (cluster_id, attr_id, value, access) in self.attributes {
            store.add_attribute(cluster_id, attr_id, value, access)?;
        }
        for (cluster_id, attr_id, hook) in self.read_hooks {
            store.set_read_hook(cluster_id, attr_id, hook)?;
        }
        for (cluster_id, attr_id, hook) in self.write_hooks {
            store.set_write_hook(cluster_id, attr_id, hook)?;
        }
        for (cluster_id, kind, name, handler) in self.commands {
            store.add_command(cluster_id, kind, &name, handler)?;
        }

        Ok(store)
    }
}
