//! Consumption loop
//!
//! Pulls deliveries from the inbound source one at a time, in order:
//! extract the descriptor, resolve the accepter set, issue the dispatch
//! fan-out, then acknowledge. Any error or panic during a message's
//! processing is caught at a per-message fault boundary and turned into a
//! failed disposition; the loop only exits when the source closes.

use crate::caller::TaskListDispatch;
use crate::error::RelayError;
use crate::payload::{resolve_accepter, InboundPayload, TaskListDescriptor};
use crate::transport::{Delivery, MessageSource};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, info_span, Instrument};

/// The sequential message consumer
///
/// Holds the dispatcher shared read-only across loop iterations. Processing
/// of message N+1 does not start before message N's disposition is decided;
/// acknowledgment happens once dispatch calls are issued, not once their
/// results are known.
pub struct Consumer<D: TaskListDispatch> {
    dispatcher: D,
}

impl<D: TaskListDispatch> Consumer<D> {
    /// Build a consumer around a dispatcher
    pub fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }

    /// Run the loop until the inbound source is exhausted
    pub async fn run<S: MessageSource>(&self, source: &mut S) {
        while let Some(delivery) = source.next().await {
            let delivery_id = delivery.id;
            let span = info_span!("message", delivery_id = %delivery_id);

            // Fault boundary: a panic inside one message's processing must
            // not take the loop down.
            let outcome = AssertUnwindSafe(self.process(&delivery).instrument(span))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(RelayError::Panic(panic_message(panic))));

            match outcome {
                Ok(()) => {
                    debug!(delivery_id = %delivery_id, "Message processed, acknowledging");
                    delivery.ack();
                }
                Err(e) => {
                    error!(delivery_id = %delivery_id, error = %e, "Message processing failed");
                    delivery.fail();
                }
            }
        }

        info!("Inbound channel closed, consumption loop exiting");
    }

    /// Handle one delivery: extract, resolve, issue dispatch
    async fn process(&self, delivery: &Delivery) -> Result<(), RelayError> {
        let payload = InboundPayload::from_value(&delivery.payload);
        let descriptor = TaskListDescriptor::from_payload(&payload);
        let accepter = resolve_accepter(&payload.accepter);

        debug!(
            task_list_type = %descriptor.task_list_type,
            task_list_group = %descriptor.task_list_group,
            accepted = accepter.len(),
            "Dispatching task list read"
        );

        self.dispatcher
            .dispatch(delivery.id, &descriptor, &accepter)
            .await?;
        Ok(())
    }
}

/// Best-effort string form of a caught panic payload
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::DispatchError;
    use crate::transport::{channel_source, Disposition};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Scripted dispatcher: behavior keyed off the task list type field
    struct ScriptedDispatch {
        calls: Mutex<Vec<(Uuid, TaskListDescriptor, Vec<String>)>>,
    }

    impl ScriptedDispatch {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TaskListDispatch for ScriptedDispatch {
        async fn dispatch(
            &self,
            delivery_id: Uuid,
            descriptor: &TaskListDescriptor,
            accepter: &[String],
        ) -> Result<(), DispatchError> {
            match descriptor.task_list_type.as_str() {
                "PANIC" => panic!("scripted panic"),
                "ERR" => Err(DispatchError::Status {
                    status: 500,
                    body: "scripted error".to_string(),
                }),
                _ => {
                    self.calls.lock().unwrap().push((
                        delivery_id,
                        descriptor.clone(),
                        accepter.to_vec(),
                    ));
                    Ok(())
                }
            }
        }
    }

    fn message(task_list_type: &str, accepter: serde_json::Value) -> serde_json::Value {
        json!({
            "MaintenanceTaskList": { "TaskListType": task_list_type },
            "Accepter": accepter
        })
    }

    #[tokio::test]
    async fn test_successful_message_is_acked() {
        let (tx, mut source, mut dispositions) = channel_source(4);
        tx.send(message("A", json!(["Operation"]))).await.unwrap();
        drop(tx);

        let consumer = Consumer::new(ScriptedDispatch::new());
        consumer.run(&mut source).await;

        assert!(matches!(
            dispositions.recv().await,
            Some(Disposition::Acked(_))
        ));
        let calls = consumer.dispatcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, vec!["Operation".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_accepter_expands_before_dispatch() {
        let (tx, mut source, _dispositions) = channel_source(4);
        tx.send(message("A", json!([]))).await.unwrap();
        drop(tx);

        let consumer = Consumer::new(ScriptedDispatch::new());
        consumer.run(&mut source).await;

        let calls = consumer.dispatcher.calls.lock().unwrap();
        assert_eq!(calls[0].2.len(), 7);
        assert_eq!(calls[0].2[0], "Header");
        assert_eq!(calls[0].2[6], "OperationMaterial");
    }

    #[tokio::test]
    async fn test_dispatch_error_fails_message_and_loop_continues() {
        let (tx, mut source, mut dispositions) = channel_source(4);
        tx.send(message("ERR", json!(["Header"]))).await.unwrap();
        tx.send(message("A", json!(["Header"]))).await.unwrap();
        drop(tx);

        let consumer = Consumer::new(ScriptedDispatch::new());
        consumer.run(&mut source).await;

        assert!(matches!(
            dispositions.recv().await,
            Some(Disposition::Failed(_))
        ));
        assert!(matches!(
            dispositions.recv().await,
            Some(Disposition::Acked(_))
        ));
        assert_eq!(consumer.dispatcher.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_contained_and_loop_continues() {
        let (tx, mut source, mut dispositions) = channel_source(4);
        tx.send(message("PANIC", json!(["Header"]))).await.unwrap();
        tx.send(message("A", json!(["Header"]))).await.unwrap();
        drop(tx);

        let consumer = Consumer::new(ScriptedDispatch::new());
        consumer.run(&mut source).await;

        assert!(matches!(
            dispositions.recv().await,
            Some(Disposition::Failed(_))
        ));
        assert!(matches!(
            dispositions.recv().await,
            Some(Disposition::Acked(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_dispatched_with_empty_descriptor() {
        // Observed behavior: a payload of the wrong shape still dispatches,
        // with a zero-valued descriptor and the full accepter expansion.
        let (tx, mut source, mut dispositions) = channel_source(4);
        tx.send(json!("just a string")).await.unwrap();
        drop(tx);

        let consumer = Consumer::new(ScriptedDispatch::new());
        consumer.run(&mut source).await;

        assert!(matches!(
            dispositions.recv().await,
            Some(Disposition::Acked(_))
        ));
        let calls = consumer.dispatcher.calls.lock().unwrap();
        assert_eq!(calls[0].1, TaskListDescriptor::default());
        assert_eq!(calls[0].2.len(), 7);
    }
}
