//! Identifier Resolution
//!
//! Maps wire-level identifiers to what they mean: the declared data type of
//! each attribute and the symbolic names of functional commands. Resolution
//! is pure and synchronous; the foundation layer never mutates it.
//!
//! # Example
//!
//! ```rust
//! use zcl_foundation::datatype::DataType;
//! use zcl_foundation::resolver::{ClusterDefinition, ClusterTable, IdentifierResolver};
//! use zcl_foundation::frame::CommandKind;
//!
//! let table = ClusterTable::new().with_cluster(
//!     ClusterDefinition::new(0x0006)
//!         .with_attribute(0x0000, DataType::Boolean)
//!         .with_command(0x02, "toggle"),
//! );
//!
//! assert_eq!(table.attribute_type(0x0006, 0x0000), Some(DataType::Boolean));
//! assert_eq!(table.command_name(0x0006, 0x02, CommandKind::Command), Some("toggle"));
//! assert_eq!(table.command_id(0x0006, "toggle", CommandKind::Command), Some(0x02));
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::datatype::DataType;
use crate::status::Status;
use crate::frame::CommandKind;

/// Pure lookup service for cluster identifiers
pub trait IdentifierResolver: Send + Sync {
    /// Declared primitive type of an attribute
    fn attribute_type(&self, cluster_id: u16, attr_id: u16) -> Option<DataType>;

    /// Symbolic name of a functional command
    fn command_name(&self, cluster_id: u16, command_id: u8, kind: CommandKind) -> Option<&str>;

    /// Wire id of a functional command
    fn command_id(&self, cluster_id: u16, name: &str, kind: CommandKind) -> Option<u8>;

    /// Wire code of a status given its symbolic name
    fn status_code(&self, name: &str) -> Option<u8> {
        Status::from_name(name).map(u8::from)
    }
}

/// Identifiers of a single cluster
#[derive(Debug, Clone, Default)]
pub struct ClusterDefinition {
    id: u16,
    attributes: BTreeMap<u16, DataType>,
    commands: BTreeMap<u8, String>,
    responses: BTreeMap<u8, String>,
}

impl ClusterDefinition {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn with_attribute(mut self, attr_id: u16, data_type: DataType) -> Self {
        self.attributes.insert(attr_id, data_type);
        self
    }

    /// Client-to-server command
    pub fn with_command(mut self, command_id: u8, name: &str) -> Self {
        self.commands.insert(command_id, name.to_string());
        self
    }

    /// Server-to-client command
    pub fn with_response(mut self, command_id: u8, name: &str) -> Self {
        self.responses.insert(command_id, name.to_string());
        self
    }

    fn namespace(&self, kind: CommandKind) -> &BTreeMap<u8, String> {
        match kind {
            CommandKind::Command => &self.commands,
            CommandKind::Response => &self.responses,
        }
    }
}

/// Table-driven [`IdentifierResolver`]
#[derive(Debug, Clone, Default)]
pub struct ClusterTable {
    clusters: HashMap<u16, ClusterDefinition>,
}

impl ClusterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, definition: ClusterDefinition) -> Self {
        self.insert(definition);
        self
    }

    /// Add a definition, replacing any earlier one with the same id
    pub fn insert(&mut self, definition: ClusterDefinition) {
        self.clusters.insert(definition.id, definition);
    }

    pub fn cluster(&self, cluster_id: u16) -> Option<&ClusterDefinition> {
        self.clusters.get(&cluster_id)
    }
}

impl IdentifierResolver for ClusterTable {
    fn attribute_type(&self, cluster_id: u16, attr_id: u16) -> Option<DataType> {
        self.clusters
            .get(&cluster_id)?
            .attributes
            .get(&attr_id)
            .copied()
    }

    fn command_name(&self, cluster_id: u16, command_id: u8, kind: CommandKind) -> Option<&str> {
        self.clusters
            .get(&cluster_id)?
            .namespace(kind)
            .get(&command_id)
            .map(String::as_str)
    }

    fn command_id(&self, cluster_id: u16, name: &str, kind: CommandKind) -> Option<u8> {
        self.clusters
            .get(&cluster_id)?
            .namespace(kind)
            .iter()
            .find_map(|(id, candidate)| (candidate == name).then_some(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> ClusterTable {
        ClusterTable::new().with_cluster(
            ClusterDefinition::new(0x0004)
                .with_attribute(0x0000, DataType::Bitmap8)
                .with_command(0x00, "add")
                .with_command(0x01, "view")
                .with_response(0x00, "addRsp")
                .with_response(0x01, "viewRsp"),
        )
    }

    #[test]
    fn test_attribute_types() {
        let table = groups();
        assert_eq!(table.attribute_type(0x0004, 0x0000), Some(DataType::Bitmap8));
        assert_eq!(table.attribute_type(0x0004, 0x0001), None);
        assert_eq!(table.attribute_type(0x0006, 0x0000), None);
    }

    #[test]
    fn test_command_namespaces() {
        let table = groups();
        assert_eq!(table.command_name(0x0004, 0x00, CommandKind::Command), Some("add"));
        assert_eq!(
            table.command_name(0x0004, 0x00, CommandKind::Response),
            Some("addRsp")
        );
        assert_eq!(table.command_name(0x0004, 0x05, CommandKind::Command), None);
        assert_eq!(table.command_id(0x0004, "viewRsp", CommandKind::Response), Some(0x01));
        assert_eq!(table.command_id(0x0004, "viewRsp", CommandKind::Command), None);
    }

    #[test]
    fn test_status_names() {
        let table = groups();
        assert_eq!(table.status_code("UnsupportedAttribute"), Some(0x86));
        assert_eq!(table.status_code("Success"), Some(0x00));
        assert_eq!(table.status_code("NoSuchStatus"), None);
    }

    #[test]
    fn test_replace_definition() {
        let mut table = groups();
        table.insert(ClusterDefinition::new(0x0004));
        assert!(table.cluster(0x0004).is_some());
        assert_eq!(table.attribute_type(0x0004, 0x0000), None);
    }
}
