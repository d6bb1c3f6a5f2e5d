//! Inbound payload schema and descriptor extraction
//!
//! Messages arrive as loosely-typed JSON. This module defines the expected
//! shape and converts it into the typed [`TaskListDescriptor`] the dispatcher
//! works with. Extraction is deliberately permissive: absent or malformed
//! fields become empty strings, never errors — semantic validation belongs to
//! the downstream ERP API.

pub mod accepter;

pub use accepter::{resolve_accepter, ALL_SUB_RESOURCES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level inbound message payload
///
/// Extra keys are ignored; missing keys default. The `Accepter` list is the
/// caller's sub-resource selection (see [`resolve_accepter`]).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundPayload {
    /// Task list identity and nested strategy/operation fields
    #[serde(rename = "MaintenanceTaskList", default)]
    pub maintenance_task_list: MaintenanceTaskList,
    /// Requested sub-resource names; empty means "All"
    #[serde(rename = "Accepter", default)]
    pub accepter: Vec<String>,
}

/// The `MaintenanceTaskList` object of the inbound payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceTaskList {
    /// Task list type code
    #[serde(rename = "TaskListType", default)]
    pub task_list_type: String,
    /// Task list group key
    #[serde(rename = "TaskListGroup", default)]
    pub task_list_group: String,
    /// Counter within the group
    #[serde(rename = "TaskListGroupCounter", default)]
    pub task_list_group_counter: String,
    /// Version counter
    #[serde(rename = "TaskListVersionCounter", default)]
    pub task_list_version_counter: String,
    /// Equipment id the task list applies to
    #[serde(rename = "Equipment", default)]
    pub equipment: String,
    /// Maintenance plant id
    #[serde(rename = "Plant", default)]
    pub plant: String,
    /// Nested strategy package fields
    #[serde(rename = "StrategyPackage", default)]
    pub strategy_package: StrategyPackage,
}

/// Strategy package sub-structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyPackage {
    /// Sequence within the task list
    #[serde(rename = "TaskListSequence", default)]
    pub task_list_sequence: String,
    /// Maintenance package text
    #[serde(rename = "MaintenancePackageText", default)]
    pub maintenance_package_text: String,
    /// Nested operation fields
    #[serde(rename = "Operation", default)]
    pub operation: Operation,
}

/// Operation sub-structure of a strategy package
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    /// Technical object the operation targets
    #[serde(rename = "TechnicalObject", default)]
    pub technical_object: String,
    /// Operation description text
    #[serde(rename = "OperationText", default)]
    pub operation_text: String,
}

/// Flattened task list identity handed to the dispatcher
///
/// Built fresh per message and read-only afterwards. All fields are opaque
/// identifier strings; empty means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListDescriptor {
    /// Task list type code
    pub task_list_type: String,
    /// Task list group key
    pub task_list_group: String,
    /// Counter within the group
    pub task_list_group_counter: String,
    /// Version counter
    pub task_list_version_counter: String,
    /// Equipment id
    pub equipment: String,
    /// Maintenance plant id
    pub plant: String,
    /// Strategy package sequence
    pub task_list_sequence: String,
    /// Maintenance package text
    pub maintenance_package_text: String,
    /// Technical object of the operation
    pub technical_object: String,
    /// Operation description text
    pub operation_text: String,
}

impl InboundPayload {
    /// Parse a raw JSON payload into the typed schema
    ///
    /// A payload that does not match the schema at all yields the default
    /// (zero-valued) payload rather than an error.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

impl TaskListDescriptor {
    /// Flatten the nested payload schema into the dispatch descriptor
    pub fn from_payload(payload: &InboundPayload) -> Self {
        let mtl = &payload.maintenance_task_list;
        Self {
            task_list_type: mtl.task_list_type.clone(),
            task_list_group: mtl.task_list_group.clone(),
            task_list_group_counter: mtl.task_list_group_counter.clone(),
            task_list_version_counter: mtl.task_list_version_counter.clone(),
            equipment: mtl.equipment.clone(),
            plant: mtl.plant.clone(),
            task_list_sequence: mtl.strategy_package.task_list_sequence.clone(),
            maintenance_package_text: mtl.strategy_package.maintenance_package_text.clone(),
            technical_object: mtl.strategy_package.operation.technical_object.clone(),
            operation_text: mtl.strategy_package.operation.operation_text.clone(),
        }
    }
}

/// One fetched sub-resource, forwarded to the outbound channel
#[derive(Debug, Clone, Serialize)]
pub struct SubResourceResult {
    /// Sub-resource name this result answers (e.g. "Header")
    pub sub_resource: String,
    /// Id of the inbound delivery that triggered the fetch
    pub delivery_id: Uuid,
    /// When the ERP response was received
    pub fetched_at: DateTime<Utc>,
    /// Raw JSON body returned by the ERP API
    pub data: serde_json::Value,
}
