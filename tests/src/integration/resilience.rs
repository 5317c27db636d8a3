//! # Resilience
//!
//! Pending calls never leak, never resolve twice, and never hang, whatever
//! the other side does.

#[cfg(test)]
mod tests {
    use crate::integration::support::{count, pair, Echo};
    use serde_json::Value;
    use shared_bus::{BusMessage, MessagePublisher};
    use shared_rpc::{CorrelationRegistry, RpcError};
    use shared_types::{
        CorrelationId, Response, StatusCode, CORRELATION_ID_HEADER, SOURCE_SERVICE_HEADER,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;
    use tokio::time::{timeout, Instant};

    #[tokio::test]
    async fn test_no_leak_after_reply_timeout_or_transport_fault() {
        let p = pair(Echo::after(Duration::from_millis(50)));
        let client = p.caller.client();
        let topic = p.request_topic();

        let ok: Response<Value> = client.call(&topic, "a", Duration::from_secs(1)).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(p.caller.registry().pending_count(), 0);

        let late: Response<Value> = client
            .call(&topic, "b", Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(late.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(p.caller.registry().pending_count(), 0);

        p.broker.shutdown();
        let fault = client
            .call::<_, Value>(&topic, "c", Duration::from_secs(1))
            .await;
        assert!(matches!(fault, Err(RpcError::Transport(_))));
        assert_eq!(p.caller.registry().pending_count(), 0);
        assert_eq!(count(&p.caller.registry().stats().cancelled), 1);
    }

    #[tokio::test]
    async fn test_aborted_caller_leaves_no_entry() {
        let p = pair(Echo::after(Duration::from_secs(10)));
        let client = p.caller.client().clone();
        let topic = p.request_topic();

        let call = tokio::spawn(async move {
            client
                .call::<_, Value>(&topic, "x", Duration::from_secs(30))
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(p.caller.registry().pending_count(), 1);

        call.abort();
        let _ = call.await;
        assert_eq!(p.caller.registry().pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_wait_without_any_callee() {
        let p = pair(Echo::immediate());
        // Nobody serves this topic.
        let started = Instant::now();

        let reply: Response<Value> = p
            .caller
            .client()
            .call("nobody-listens-request", "x", Duration::from_millis(300))
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(started.elapsed() < Duration::from_millis(350));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolve_and_expire_never_both_win() {
        let registry = Arc::new(CorrelationRegistry::new());

        for _ in 0..500 {
            let (id, rx) = registry.register("race", Duration::from_secs(1));
            let barrier = Arc::new(Barrier::new(2));

            let resolver = {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    registry.resolve(id, Response::ok(Value::from("reply")))
                })
            };
            let expirer = {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    registry.expire(&id)
                })
            };

            let resolved = resolver.await.unwrap();
            let expired = expirer.await.unwrap();
            assert!(resolved ^ expired, "exactly one side must win");
            assert_eq!(rx.await.is_ok(), resolved);
            assert!(!registry.is_pending(&id));
        }

        let stats = registry.stats();
        assert_eq!(count(&stats.resolved) + count(&stats.expired), 500);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_calls_racing_their_deadline_settle_once() {
        let p = pair(Echo::after(Duration::from_millis(30)));
        let client = p.caller.client().clone();
        let topic = p.request_topic();

        let calls = (0..40).map(|_| {
            let client = client.clone();
            let topic = topic.clone();
            tokio::spawn(async move {
                client
                    .call::<_, Value>(&topic, "edge", Duration::from_millis(30))
                    .await
                    .unwrap()
                    .status()
            })
        });

        for status in futures::future::join_all(calls).await {
            let status = status.unwrap();
            assert!(status == StatusCode::OK || status == StatusCode::REQUEST_TIMEOUT);
        }
        assert_eq!(p.caller.registry().pending_count(), 0);
        let stats = p.caller.registry().stats();
        assert_eq!(count(&stats.resolved) + count(&stats.expired), 40);
    }

    #[tokio::test]
    async fn test_unknown_reply_is_a_no_op() {
        let p = pair(Echo::after(Duration::from_millis(50)));
        let client = p.caller.client().clone();
        let topic = p.request_topic();

        let waiting = tokio::spawn(async move {
            client
                .call::<_, Value>(&topic, "real", Duration::from_secs(1))
                .await
        });

        let stray = BusMessage::reply(
            p.reply_topic(),
            &CorrelationId::new().to_string(),
            "stranger",
            &Response::ok("stray"),
        )
        .unwrap();
        p.broker.publish(stray).await.unwrap();

        let reply = waiting.await.unwrap().unwrap();
        assert_eq!(reply.data(), Some(&Value::from("real")));
        assert_eq!(count(&p.caller.registry().stats().discarded), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_unblocks_caller() {
        // No handler: the test plays the callee by hand.
        let p = pair(Echo::immediate());
        let rogue_topic = "rogue-request";
        let mut requests = p.broker.subscribe(rogue_topic, "rogue").unwrap();
        let reply_topic = p.reply_topic();
        let broker = Arc::clone(&p.broker);

        tokio::spawn(async move {
            if let Some(request) = requests.recv().await {
                let correlation = request.correlation_id().unwrap_or_default().to_string();
                let garbage = BusMessage::new(reply_topic, "{ this is not an envelope")
                    .with_header(CORRELATION_ID_HEADER, correlation)
                    .with_header(SOURCE_SERVICE_HEADER, "rogue");
                broker.publish(garbage).await.unwrap();
            }
        });

        let reply = timeout(
            Duration::from_secs(1),
            p.caller
                .client()
                .call::<_, Value>(rogue_topic, "x", Duration::from_millis(500)),
        )
        .await
        .expect("caller must not hang")
        .unwrap();

        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert!(!reply.message().is_empty());
        assert_eq!(p.caller.registry().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_data_of_wrong_shape_is_400() {
        let p = pair(Echo::immediate());

        let reply: Response<u64> = p
            .caller
            .client()
            .call(&p.request_topic(), "not a number", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_request_without_correlation_is_dropped() {
        let p = pair(Echo::immediate());
        let mut replies = p.broker.subscribe(&p.reply_topic(), "probe").unwrap();

        p.broker
            .publish(BusMessage::new(p.request_topic(), "\"orphan\""))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(replies.try_recv().unwrap().is_none());

        // The server keeps serving.
        let reply: Response<String> = p
            .caller
            .client()
            .call(&p.request_topic(), "after", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply.into_data().as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn test_quoted_payload_is_unwrapped() {
        let p = pair(Echo::immediate());
        let mut replies = p.broker.subscribe(&p.reply_topic(), "probe").unwrap();
        let id = CorrelationId::new();

        // A string that was JSON-encoded twice on the way in.
        let body = serde_json::to_string(&serde_json::to_string("p-42").unwrap()).unwrap();
        p.broker
            .publish(
                BusMessage::new(p.request_topic(), body)
                    .with_correlation_id(id)
                    .with_source("legacy"),
            )
            .await
            .unwrap();

        let message = timeout(Duration::from_secs(1), replies.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.correlation_id(), Some(id.to_string().as_str()));

        let reply: Response<Value> = serde_json::from_slice(&message.body).unwrap();
        assert_eq!(reply.data(), Some(&Value::from("p-42")));
    }
}
