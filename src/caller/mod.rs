//! ERP dispatch orchestrator
//!
//! Turns a task list descriptor plus a resolved accepter set into one read
//! call per accepted sub-resource against the ERP maintenance-task-list API.
//! Dispatch is fire-and-forget: each call runs in its own task, publishes its
//! result to the outbound sink on success, and reports its own failure in the
//! logs. The loop never waits for call outcomes.

pub mod error;

pub use error::DispatchError;

use crate::payload::{SubResourceResult, TaskListDescriptor};
use crate::transport::ResultSink;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Seam between the consumption loop and the HTTP layer
///
/// `dispatch` returns once the calls for every accepted sub-resource have
/// been issued; it does not wait for their results.
#[async_trait]
pub trait TaskListDispatch: Send + Sync {
    /// Issue one read call per accepted sub-resource name
    async fn dispatch(
        &self,
        delivery_id: Uuid,
        descriptor: &TaskListDescriptor,
        accepter: &[String],
    ) -> Result<(), DispatchError>;
}

/// HTTP client for the ERP maintenance-task-list read API
pub struct ErpCaller {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    sink: Arc<dyn ResultSink>,
}

impl ErpCaller {
    /// Build a caller around a shared HTTP client (connection pooling)
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            sink,
        }
    }

    /// Map a sub-resource name to its endpoint path and query parameters
    ///
    /// `None` for names outside the vocabulary; the resolver passes those
    /// through untouched, and ignoring them is this layer's call.
    fn request_for(
        name: &str,
        d: &TaskListDescriptor,
    ) -> Option<(&'static str, Vec<(&'static str, String)>)> {
        let identity = || {
            vec![
                ("TaskListType", d.task_list_type.clone()),
                ("TaskListGroup", d.task_list_group.clone()),
                ("TaskListGroupCounter", d.task_list_group_counter.clone()),
            ]
        };

        match name {
            "Header" => {
                let mut params = identity();
                params.push((
                    "TaskListVersionCounter",
                    d.task_list_version_counter.clone(),
                ));
                Some(("header", params))
            }
            "HeaderEquipmentPlant" => Some((
                "header-equipment-plant",
                vec![
                    ("Equipment", d.equipment.clone()),
                    ("Plant", d.plant.clone()),
                ],
            )),
            "StrategyPackage" => {
                let mut params = identity();
                params.push(("TaskListSequence", d.task_list_sequence.clone()));
                Some(("strategy-package", params))
            }
            "StrategyPackageText" => {
                let mut params = identity();
                params.push((
                    "MaintenancePackageText",
                    d.maintenance_package_text.clone(),
                ));
                Some(("strategy-package-text", params))
            }
            "Operation" => {
                let mut params = identity();
                params.push(("TechnicalObject", d.technical_object.clone()));
                Some(("operation", params))
            }
            "OperationText" => {
                let mut params = identity();
                params.push(("OperationText", d.operation_text.clone()));
                Some(("operation-text", params))
            }
            "OperationMaterial" => Some(("operation-material", identity())),
            _ => None,
        }
    }
}

#[async_trait]
impl TaskListDispatch for ErpCaller {
    async fn dispatch(
        &self,
        delivery_id: Uuid,
        descriptor: &TaskListDescriptor,
        accepter: &[String],
    ) -> Result<(), DispatchError> {
        for name in accepter {
            let Some((path, params)) = Self::request_for(name, descriptor) else {
                warn!(
                    delivery_id = %delivery_id,
                    sub_resource = %name,
                    "Unknown sub-resource name, skipping"
                );
                continue;
            };

            let client = self.client.clone();
            let sink = Arc::clone(&self.sink);
            let api_key = self.api_key.clone();
            let url = format!("{}/maintenance-task-list/{}", self.base_url, path);
            let sub_resource = name.clone();

            // One task per accepted name; each reports its own outcome.
            tokio::spawn(async move {
                match fetch_sub_resource(&client, &url, api_key.as_deref(), &params).await {
                    Ok(data) => {
                        let result = SubResourceResult {
                            sub_resource: sub_resource.clone(),
                            delivery_id,
                            fetched_at: Utc::now(),
                            data,
                        };
                        if let Err(e) = sink.publish(result).await {
                            error!(
                                delivery_id = %delivery_id,
                                sub_resource = %sub_resource,
                                error = %e,
                                "Failed to forward sub-resource result"
                            );
                        }
                    }
                    Err(e) => {
                        error!(
                            delivery_id = %delivery_id,
                            sub_resource = %sub_resource,
                            error = %e,
                            "ERP read call failed"
                        );
                    }
                }
            });
        }

        debug!(
            delivery_id = %delivery_id,
            calls = accepter.len(),
            "Dispatch issued"
        );
        Ok(())
    }
}

/// Perform one GET against the ERP API and parse the JSON body
async fn fetch_sub_resource(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    params: &[(&'static str, String)],
) -> Result<serde_json::Value, DispatchError> {
    debug!(url = %url, "Calling ERP API");

    let mut request = client.get(url).query(params);
    if let Some(key) = api_key {
        request = request.header("APIKey", key);
    }

    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        return Err(DispatchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    let data: serde_json::Value = serde_json::from_str(&body)?;

    debug!(url = %url, response_len = body.len(), "ERP API call succeeded");
    Ok(data)
}
