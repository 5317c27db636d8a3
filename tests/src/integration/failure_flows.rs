//! # Failure Flows
//!
//! The callee answers after the caller's deadline, a cascade delete hits
//! products with no media, and the callee fails internally.

#[cfg(test)]
mod tests {
    use crate::integration::support::{count, pair, Echo};
    use async_trait::async_trait;
    use serde_json::Value;
    use shared_rpc::{HandlerError, RpcHandler};
    use shared_types::{CascadeDeleteResult, ProductIds, Response, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use svc_media::{CascadeDeleteHandler, InMemoryMediaRepository, Media, MediaRepository};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_after_timeout_is_discarded() {
        let p = pair(Echo::after(Duration::from_millis(500)));
        let started = Instant::now();

        let reply: Response<Value> = p
            .caller
            .client()
            .call(&p.request_topic(), "p1", Duration::from_millis(200))
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert_eq!(reply.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(reply.data().is_none());
        assert!(reply.message().contains("timed out after"));
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
        assert_eq!(p.caller.registry().pending_count(), 0);

        // Let the handler finish and its reply arrive.
        tokio::time::sleep(Duration::from_millis(400)).await;

        let stats = p.caller.registry().stats();
        assert_eq!(count(&stats.expired), 1);
        assert_eq!(count(&stats.discarded), 1);
        assert_eq!(count(&stats.resolved), 0);
        assert_eq!(p.caller.registry().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cascade_delete_absence_is_not_failure() {
        let repo = Arc::new(InMemoryMediaRepository::new());
        for (id, product) in [("m1", "p1"), ("m2", "p1"), ("m3", "p3")] {
            repo.insert(Media {
                id: id.into(),
                product_id: product.into(),
                file_name: format!("{id}.png"),
            })
            .await
            .unwrap();
        }
        let p = pair(CascadeDeleteHandler::new(repo.clone()));

        let ids = ProductIds::Many(vec!["p1".into(), "p2".into()]);
        let reply: Response<CascadeDeleteResult> = p
            .caller
            .client()
            .call(&p.request_topic(), &ids, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        let result = reply.into_data().unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(repo.len(), 1);

        // Redelivery of the same request is harmless.
        let again: Response<CascadeDeleteResult> = p
            .caller
            .client()
            .call(&p.request_topic(), &ids, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::OK);
        assert_eq!(again.into_data().unwrap().count, 0);
    }

    struct Failing;

    #[async_trait]
    impl RpcHandler for Failing {
        type Request = String;
        type Reply = Value;

        async fn handle(&self, request: String) -> Result<Response<Value>, HandlerError> {
            match request.as_str() {
                "panic" => panic!("index out of range in pricing table"),
                _ => Err(HandlerError::Internal("database connection reset".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_internal_error_reaches_caller() {
        let p = pair(Failing);

        let reply: Response<Value> = p
            .caller
            .client()
            .call(&p.request_topic(), "boom", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.message(), "database connection reset");
        assert!(reply.data().is_none());
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let p = pair(Failing);
        let client = p.caller.client();
        let topic = p.request_topic();

        let reply: Response<Value> = client
            .call(&topic, "panic", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.message(), "index out of range in pricing table");

        // The consumer loop survived the panic.
        let next: Response<Value> = client
            .call(&topic, "boom", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(next.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
