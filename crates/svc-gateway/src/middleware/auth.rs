//! Access validation middleware.
//!
//! Protected methods must carry an `Authorization` header. The raw header
//! value is sent to the user service over the bus; the request continues
//! only when a known identity with an allowed role comes back.

use crate::config::GatewayConfig;
use crate::router::envelope_response;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request},
    response::Response,
};
use shared_rpc::{ConfigError, RpcClient};
use shared_types::{Identity, Response as Envelope, Role, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::{Layer, Service};
use tracing::{debug, error, warn};

/// Shown to HTTP clients when the identity call fails below the envelope
/// level. The underlying error is logged, never returned.
const VALIDATION_UNAVAILABLE: &str = "access validation unavailable";

/// Which requests are checked and what passes.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    protected_methods: Vec<Method>,
    allowed_roles: Vec<Role>,
    identity_topic: String,
    timeout: Duration,
}

impl AccessPolicy {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let protected_methods = config
            .protected_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| ConfigError::Invalid(format!("unknown HTTP method '{m}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            protected_methods,
            allowed_roles: config.allowed_roles.clone(),
            identity_topic: config.identity.request.clone(),
            timeout: config.validation_timeout,
        })
    }

    /// Read-only methods are never protected, whatever the configuration says.
    pub fn is_protected(&self, method: &Method) -> bool {
        if matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) {
            return false;
        }
        self.protected_methods.contains(method)
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// Access validation layer
#[derive(Clone)]
pub struct AccessValidationLayer {
    client: RpcClient,
    policy: Arc<AccessPolicy>,
}

impl AccessValidationLayer {
    pub fn new(client: RpcClient, policy: AccessPolicy) -> Self {
        Self {
            client,
            policy: Arc::new(policy),
        }
    }

    pub fn from_config(client: RpcClient, config: &GatewayConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(client, AccessPolicy::from_config(config)?))
    }
}

impl<S> Layer<S> for AccessValidationLayer {
    type Service = AccessValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessValidationService {
            inner,
            client: self.client.clone(),
            policy: Arc::clone(&self.policy),
        }
    }
}

/// Access validation service
#[derive(Clone)]
pub struct AccessValidationService<S> {
    inner: S,
    client: RpcClient,
    policy: Arc<AccessPolicy>,
}

impl<S> Service<Request<Body>> for AccessValidationService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let client = self.client.clone();
        let policy = Arc::clone(&self.policy);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !policy.is_protected(req.method()) {
                return inner.call(req).await;
            }

            let credential = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned);
            let Some(credential) = credential else {
                debug!(method = %req.method(), path = %req.uri().path(), "Missing credential");
                return Ok(envelope_response(Envelope::<()>::unauthorized(
                    "Authorization header is required",
                )));
            };

            match validate(&client, &policy, &credential).await {
                Ok(identity) => {
                    debug!(
                        user_id = %identity.user_id,
                        role = %identity.role,
                        path = %req.uri().path(),
                        "Access granted"
                    );
                    req.extensions_mut().insert(identity);
                    inner.call(req).await
                }
                Err(failure) => {
                    warn!(
                        method = %req.method(),
                        path = %req.uri().path(),
                        status = %failure.status(),
                        reason = failure.message(),
                        "Access denied"
                    );
                    Ok(envelope_response(failure))
                }
            }
        })
    }
}

/// Ask the user service who holds `credential`.
///
/// Error envelopes from the user service (invalid token) are returned as
/// they are. A call that fails on the way (timeout, malformed reply, bus
/// fault) becomes a 400.
async fn validate(
    client: &RpcClient,
    policy: &AccessPolicy,
    credential: &str,
) -> Result<Identity, Envelope<()>> {
    let reply: Envelope<Identity> = client
        .call(&policy.identity_topic, credential, policy.timeout)
        .await
        .map_err(|e| {
            error!(topic = %policy.identity_topic, error = %e, "Identity validation call failed");
            Envelope::bad_request(VALIDATION_UNAVAILABLE)
        })?;

    if reply.status() == StatusCode::REQUEST_TIMEOUT {
        return Err(Envelope::bad_request(reply.message()));
    }

    let identity = reply
        .into_result()?
        .ok_or_else(|| Envelope::bad_request("Identity reply carried no data"))?;

    if !policy.allows(identity.role) {
        return Err(Envelope::forbidden(format!(
            "Role '{}' is not allowed to perform this action",
            identity.role
        )));
    }
    Ok(identity)
}
