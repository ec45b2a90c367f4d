//! Mock API server used by the controller tests
use http::{Method, Request, Response};
use kube::{client::Body, Client};
use serde::Serialize;
use serde_json::Value;
use tower_test::mock::SendResponse;

type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

/// Answers the requests a test expects, in order.
///
/// Once the verifier is dropped every further request fails with
/// `KubeError(Service(Closed(())))`, so a test asserting `Ok` also asserts no extra calls.
pub(crate) struct ApiServerVerifier(ApiServerHandle);

pub(crate) fn testcontext() -> (Client, ApiServerVerifier) {
    let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    let mock_client = Client::new(mock_service, "default");
    (mock_client, ApiServerVerifier(handle))
}

pub(crate) async fn timeout_after_1s(handle: tokio::task::JoinHandle<()>) {
    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("timeout on mock apiserver")
        .expect("scenario succeeded")
}

/// A request seen by the verifier
pub(crate) struct Call {
    pub(crate) query: String,
    pub(crate) body: Value,
    send: SendResponse<Response<Body>>,
}

impl Call {
    /// Reply with `obj` as JSON
    pub(crate) fn respond(self, obj: impl Serialize) {
        let response = serde_json::to_vec(&obj).unwrap();
        self.send
            .send_response(Response::builder().body(Body::from(response)).unwrap());
    }

    /// Reply with a `Status` failure carrying `code`
    pub(crate) fn fail(self, code: u16, reason: &str) {
        let status = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": reason,
            "reason": reason,
            "code": code,
        });
        let response = serde_json::to_vec(&status).unwrap();
        self.send.send_response(
            Response::builder()
                .status(code)
                .body(Body::from(response))
                .unwrap(),
        );
    }
}

impl ApiServerVerifier {
    /// Wait for the next request and check its method and path
    pub(crate) async fn expect(&mut self, method: Method, path: &str) -> Call {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method(), method, "method of request to {}", request.uri());
        assert_eq!(request.uri().path(), path);
        let query = request.uri().query().unwrap_or_default().to_owned();
        let bytes = request.into_body().collect_bytes().await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Call { query, body, send }
    }
}
