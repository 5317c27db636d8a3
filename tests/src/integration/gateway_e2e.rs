//! # Gateway End to End
//!
//! HTTP requests through the access validation layer into every service,
//! with every cross-service hop going over the broker.

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use mesh_node::{MeshNode, NodeConfig, SeedIdentity};
    use serde_json::{json, Value};
    use shared_types::Role;
    use std::time::Duration;
    use tower::ServiceExt;

    fn node() -> MeshNode {
        let mut config = NodeConfig::default();
        config.identities = vec![
            SeedIdentity {
                token: "alice-token".into(),
                user_id: "alice".into(),
                role: Role::User,
            },
            SeedIdentity {
                token: "bob-token".into(),
                user_id: "bob".into(),
                role: Role::User,
            },
            SeedIdentity {
                token: "guest-token".into(),
                user_id: "visitor".into(),
                role: Role::Guest,
            },
        ];
        config.resolve().unwrap();
        MeshNode::start(config).unwrap()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create_product(app: &Router, token: &str, name: &str, price: u64) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/products",
            Some(token),
            Some(json!({ "name": name, "price_cents": price })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_product_media_order_flow() {
        let node = node();
        let app = node.router();

        let lamp = create_product(&app, "alice-token", "Lamp", 1999).await;
        let desk = create_product(&app, "alice-token", "Desk", 15000).await;

        // Media: ownership is checked by the product service over the bus.
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/products/{lamp}/media"),
            Some("alice-token"),
            Some(json!({ "file_name": "lamp.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/products/{lamp}/media"),
            Some("bob-token"),
            Some(json!({ "file_name": "stolen.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["data"], Value::Null);

        // Order: prices come from the product service.
        let (status, body) = send(
            &app,
            Method::POST,
            "/orders",
            Some("bob-token"),
            Some(json!({ "product_ids": [lamp, desk] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["total_cents"], 16999);

        let (status, body) = send(
            &app,
            Method::POST,
            "/orders",
            Some("bob-token"),
            Some(json!({ "product_ids": [lamp, "ghost"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"], json!(["ghost"]));

        // Delete cascades into the media service.
        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/products/{lamp}"),
            Some("alice-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["count"], 1);

        let (status, body) = send(&app, Method::GET, &format!("/products/{lamp}/media"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));

        assert_eq!(node.container().pending_calls(), 0);
        node.shutdown();
    }

    #[tokio::test]
    async fn test_reads_bypass_validation() {
        let node = node();
        let app = node.router();

        let (status, body) = send(&app, Method::GET, "/products/none", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);

        let (status, _) = send(&app, Method::GET, "/users/bob/orders", None, None).await;
        assert_eq!(status, StatusCode::OK);
        node.shutdown();
    }

    #[tokio::test]
    async fn test_access_failures() {
        let node = node();
        let app = node.router();
        let product = json!({ "name": "Lamp", "price_cents": 1 });

        let (status, body) = send(&app, Method::POST, "/products", None, Some(product.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);

        let (status, body) = send(
            &app,
            Method::POST,
            "/products",
            Some("forged"),
            Some(product.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token");

        let (status, _) = send(
            &app,
            Method::POST,
            "/products",
            Some("guest-token"),
            Some(product),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        node.shutdown();
    }

    #[tokio::test]
    async fn test_closed_broker_hides_transport_error() {
        let node = node();
        let app = node.router();
        node.broker().shutdown();

        let (status, body) = send(
            &app,
            Method::POST,
            "/products",
            Some("alice-token"),
            Some(json!({ "name": "Lamp", "price_cents": 1 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "access validation unavailable");
        assert_eq!(node.container().pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_ops_routes() {
        let node = node();
        let app = node.router();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = tokio::time::timeout(
            Duration::from_secs(1),
            app.oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap()),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
