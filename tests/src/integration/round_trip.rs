//! # Round Trip
//!
//! A call published by one endpoint is answered by another through the
//! broker, and the reply comes back to exactly the caller that asked.

#[cfg(test)]
mod tests {
    use crate::integration::support::{count, pair, Echo};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use shared_bus::{InMemoryBroker, MessagePublisher};
    use shared_rpc::{RpcConfig, RpcEndpoint};
    use shared_types::{Response, StatusCode, CORRELATION_ID_HEADER};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        quantity: u32,
    }

    #[tokio::test]
    async fn test_echo_returns_payload_as_data() {
        let p = pair(Echo::immediate());
        let payload = json!({ "id": "p1", "tags": ["a", "b"], "n": 3 });

        let reply: Response<Value> = p
            .caller
            .client()
            .call(&p.request_topic(), &payload, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.data(), Some(&payload));
        assert_eq!(p.caller.registry().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_typed_reply() {
        let p = pair(Echo::immediate());
        let item = Item {
            id: "p1".into(),
            quantity: 2,
        };

        let reply: Response<Item> = p
            .caller
            .client()
            .call(&p.request_topic(), &item, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(reply.into_data(), Some(item));
    }

    #[tokio::test]
    async fn test_reply_echoes_correlation_header() {
        let p = pair(Echo::immediate());
        let mut probe = p.broker.subscribe(&p.reply_topic(), "probe").unwrap();

        p.caller
            .client()
            .call::<_, Value>(&p.request_topic(), "x", Duration::from_secs(1))
            .await
            .unwrap();

        let reply = tokio::time::timeout(Duration::from_secs(1), probe.recv())
            .await
            .unwrap()
            .unwrap();
        let correlation = reply.header(CORRELATION_ID_HEADER).unwrap();
        assert!(shared_types::CorrelationId::parse(correlation).is_ok());
        assert_eq!(reply.source(), Some("callee"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_resolve_independently() {
        let p = pair(Echo::after(Duration::from_millis(20)));
        let client = p.caller.client().clone();
        let topic = p.request_topic();

        let calls = (0..50u32).map(|i| {
            let client = client.clone();
            let topic = topic.clone();
            tokio::spawn(async move {
                let reply: Response<u32> = client
                    .call(&topic, &i, Duration::from_secs(2))
                    .await
                    .unwrap();
                (i, reply.into_data())
            })
        });

        for handle in futures::future::join_all(calls).await {
            let (sent, received) = handle.unwrap();
            assert_eq!(received, Some(sent));
        }
        assert_eq!(p.caller.registry().pending_count(), 0);
        assert_eq!(count(&p.caller.registry().stats().resolved), 50);
    }

    #[tokio::test]
    async fn test_per_call_timeouts_share_one_client() {
        let p = pair(Echo::after(Duration::from_millis(100)));
        let client = p.caller.client();
        let topic = p.request_topic();

        let (fast, slow) = tokio::join!(
            client.call::<_, Value>(&topic, "fast", Duration::from_millis(20)),
            client.call::<_, Value>(&topic, "slow", Duration::from_secs(1)),
        );

        assert_eq!(fast.unwrap().status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(slow.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_replies_reach_only_their_instance() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut callee = RpcEndpoint::new(Arc::clone(&broker), RpcConfig::for_service("callee"));
        let topics = callee.config().topics.clone();
        callee
            .serve(&topics.product_lookup, Arc::new(Echo::immediate()))
            .unwrap();

        // Two instances of one service share a consumer group but not replies.
        let mut a = RpcEndpoint::new(Arc::clone(&broker), RpcConfig::for_service("order"));
        let mut b = RpcEndpoint::new(Arc::clone(&broker), RpcConfig::for_service("order"));
        a.listen_replies(&topics.product_lookup).unwrap();
        b.listen_replies(&topics.product_lookup).unwrap();

        let topic = topics.product_lookup.request.clone();
        let (ra, rb) = tokio::join!(
            a.client().call::<_, String>(&topic, "from-a", Duration::from_secs(1)),
            b.client().call::<_, String>(&topic, "from-b", Duration::from_secs(1)),
        );

        assert_eq!(ra.unwrap().into_data().as_deref(), Some("from-a"));
        assert_eq!(rb.unwrap().into_data().as_deref(), Some("from-b"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Each instance saw the other's reply and discarded it.
        assert_eq!(count(&a.registry().stats().discarded), 1);
        assert_eq!(count(&b.registry().stats().discarded), 1);
        assert!(broker.messages_published() >= 4);
    }
}
