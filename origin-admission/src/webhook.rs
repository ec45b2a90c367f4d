//! A validating admission webhook serving the enabled plugins
use crate::{
    attributes::{operation_name, Attributes},
    interfaces::ValidationInterface,
};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use kube::core::{
    admission::{AdmissionRequest, AdmissionResponse, AdmissionReview},
    DynamicObject,
};
use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};

/// The plugins consulted for every request, in order
#[derive(Clone, Default)]
pub struct Webhook {
    plugins: Vec<(String, Arc<dyn ValidationInterface>)>,
}

impl Webhook {
    /// Serve `plugins`
    pub fn new(plugins: Vec<(String, Arc<dyn ValidationInterface>)>) -> Self {
        Self { plugins }
    }

    /// Run every plugin that handles the operation; the first rejection wins
    pub fn review(&self, req: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
        let response = AdmissionResponse::from(req);
        let attrs = Attributes::from(req);
        for (name, plugin) in &self.plugins {
            if !plugin.handles(&attrs.operation) {
                continue;
            }
            if let Err(err) = plugin.validate(&attrs) {
                info!(
                    plugin = %name,
                    uid = %req.uid,
                    operation = operation_name(&attrs.operation),
                    resource = %attrs.group_resource(),
                    name = %attrs.name,
                    "denied: {err}"
                );
                return response.deny(err);
            }
        }
        debug!(uid = %req.uid, "allowed");
        response
    }

    /// Routes: `POST /validate` and `GET /healthz`
    pub fn router(self) -> Router {
        Router::new()
            .route("/validate", post(validate))
            .route("/healthz", get(healthz))
            .with_state(Arc::new(self))
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn validate(State(webhook): State<Arc<Webhook>>, body: Bytes) -> Json<AdmissionReview<DynamicObject>> {
    let review: AdmissionReview<DynamicObject> = match serde_json::from_slice(&body) {
        Ok(review) => review,
        Err(err) => {
            warn!("malformed admission review: {err}");
            return Json(AdmissionResponse::invalid(err).into_review());
        }
    };
    let req: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(err) => {
            warn!("invalid admission review: {err}");
            return Json(AdmissionResponse::invalid(err).into_review());
        }
    };
    Json(webhook.review(&req).into_review())
}

/// Where and how the webhook listens
#[derive(Clone, Debug)]
pub struct ServeConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Serving certificate and key; plain http when absent
    pub tls: Option<(PathBuf, PathBuf)>,
}

/// Serve `webhook` until `shutdown` resolves
pub async fn serve(
    webhook: Webhook,
    config: ServeConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = webhook.router();
    match config.tls {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            info!(addr = %config.addr, "serving admission webhook over https");
            let server = axum_server::bind_rustls(config.addr, tls).serve(app.into_make_service());
            tokio::select! {
                res = server => res,
                _ = shutdown => Ok(()),
            }
        }
        None => {
            let listener = tokio::net::TcpListener::bind(config.addr).await?;
            info!(addr = %config.addr, "serving admission webhook over http");
            axum::serve(listener, app).with_graceful_shutdown(shutdown).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_plugins;
    use assert_json_diff::assert_json_include;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn webhook() -> Webhook {
        let plugins = default_plugins();
        Webhook::new(plugins.new_chain(&plugins.registered_names()).unwrap())
    }

    fn review(operation: &str, name: &str) -> Value {
        json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": { "group": "config.openshift.io", "version": "v1", "kind": "Image" },
                "resource": { "group": "config.openshift.io", "version": "v1", "resource": "images" },
                "name": name,
                "operation": operation,
                "userInfo": { "username": "admin" },
                "object": {
                    "apiVersion": "config.openshift.io/v1",
                    "kind": "Image",
                    "metadata": { "name": name },
                    "spec": {}
                },
                "dryRun": false
            }
        })
    }

    async fn post_review(body: String) -> Value {
        let res = webhook()
            .router()
            .oneshot(
                Request::post("/validate")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn allows_the_cluster_image() {
        let res = post_review(review("CREATE", "cluster").to_string()).await;
        assert_json_include!(
            actual: res,
            expected: json!({
                "response": { "uid": "705ab4f5-6393-11e8-b7cc-42010a800002", "allowed": true }
            })
        );
    }

    #[tokio::test]
    async fn denies_other_image_names() {
        let res = post_review(review("CREATE", "mine").to_string()).await;
        assert_eq!(res["response"]["allowed"], json!(false));
        let message = res["response"]["status"]["message"].as_str().unwrap();
        assert_eq!(
            message,
            r#"Image.config.openshift.io "mine" is invalid: metadata.name: Invalid value: "mine": must be cluster"#
        );
    }

    #[tokio::test]
    async fn deletes_are_not_handled() {
        let res = post_review(review("DELETE", "mine").to_string()).await;
        assert_eq!(res["response"]["allowed"], json!(true));
    }

    #[tokio::test]
    async fn malformed_reviews_are_invalid() {
        let res = post_review("{\"kind\": 12".to_owned()).await;
        assert_eq!(res["response"]["allowed"], json!(false));

        let res = post_review(json!({"apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview"}).to_string()).await;
        assert_eq!(res["response"]["allowed"], json!(false));
    }

    #[tokio::test]
    async fn health() {
        let res = webhook()
            .router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
