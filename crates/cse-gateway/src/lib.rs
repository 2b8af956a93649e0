//! The HTTP binding for the CSE core: an Axum [`Router`] that translates
//! incoming requests into the canonical envelope `cse_dispatch` understands
//! and renders its [`cse_types::Response`] back out, per the method/header
//! mapping in the specification's HTTP binding section. Everything below
//! this layer (TLS termination, connection handling) is external transport
//! plumbing the caller is responsible for, the same division of labor the
//! teacher draws between its webhook transport and the handlers it is
//! handed.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use cse_dispatch::Dispatcher;
use snafu::{ResultExt, Snafu};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

mod constants;
mod envelope;
mod handler;
mod options;

pub use envelope::GatewayError;
pub use options::GatewayOptions;

#[derive(Debug, Snafu)]
pub enum ServeError {
    #[snafu(display("failed to bind gateway socket {socket_addr}"))]
    Bind {
        socket_addr: SocketAddr,
        source: std::io::Error,
    },
    #[snafu(display("gateway server loop failed"))]
    Serve { source: std::io::Error },
}

pub type Result<T, E = ServeError> = std::result::Result<T, E>;

/// Builds the router every oneM2M HTTP request (GET/POST/PUT/DELETE) is
/// handled through, plus an unauthenticated `/health` route kept outside the
/// tracing layer so liveness probes don't pollute request spans.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    let trace_layer = TraceLayer::new_for_http();
    let service_builder = ServiceBuilder::new().layer(trace_layer);

    Router::new()
        .route("/{*path}", any(handler::handle))
        .route("/", any(handler::handle))
        .layer(service_builder)
        .route("/health", get(handler::health))
        .with_state(dispatcher)
}

/// Runs the gateway until the process is terminated. Binds a `TcpListener`
/// and serves the router built by [`router`].
pub async fn serve(dispatcher: Arc<Dispatcher>, options: GatewayOptions) -> Result<()> {
    let app = router(dispatcher);

    tracing::info!(socket_addr = %options.socket_addr, "binding gateway listener");
    let listener = tokio::net::TcpListener::bind(options.socket_addr)
        .await
        .context(BindSnafu {
            socket_addr: options.socket_addr,
        })?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context(ServeSnafu)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use cse_access::AccessConfig;
    use cse_dispatch::{DispatchConfig, EventBus};
    use cse_notify::{NotifyConfig, NotifyEngine};
    use cse_registration::RegistrationConfig;
    use cse_resource::body::CseBaseBody;
    use cse_resource::{Resource, ResourceBody, ResourceMeta};
    use cse_storage::{InMemoryStore, ResourceStore};
    use cse_types::Permission;
    use http_body_util::BodyExt as _;
    use tower::ServiceExt as _;

    use super::*;

    const CSE_RI: &str = "cse-in";
    const CSE_RN: &str = "cse-in";
    const CSE_CSI: &str = "in-cse";

    async fn test_router() -> Router {
        let store: Arc<dyn ResourceStore> = Arc::new(InMemoryStore::new());
        let now = cse_types::Timestamp::now();
        store
            .put(Resource {
                meta: ResourceMeta {
                    ri: CSE_RI.to_string(),
                    rn: CSE_RN.to_string(),
                    pi: String::new(),
                    ct: now,
                    lt: now,
                    et: None,
                    acpi: vec![],
                    lbl: vec![],
                    at: vec![],
                    aa: vec![],
                    cr: None,
                },
                body: ResourceBody::CseBase(CseBaseBody {
                    csi: CSE_CSI.to_string(),
                    cst: 1,
                    csz: vec![],
                    srt: vec![],
                    poa: vec![],
                    dcse: vec![],
                }),
            })
            .await
            .unwrap();

        let access = AccessConfig {
            admin_originator: "CAdmin".to_string(),
            full_access_admin: true,
            allowed_ae_originators: vec!["*".to_string()],
            allowed_csr_originators: vec!["*".to_string()],
            registrar_csi: None,
            inherit_acp: true,
            acp_checks_disabled: false,
        };
        let registration = RegistrationConfig {
            cse_originator: "CAdmin".to_string(),
            acp_prefix: "acp".to_string(),
            default_ae_permission: Permission::CREATE.union(Permission::RETRIEVE),
            acp_self_permission: Permission::RETRIEVE.union(Permission::UPDATE),
            allowed_ae_originators: vec!["*".to_string()],
            creator_allowed_types: vec![],
        };
        let notify = NotifyEngine::new(Arc::clone(&store), NotifyConfig::default());
        let events = Arc::new(EventBus::default());
        let config = DispatchConfig {
            cse_csi: CSE_CSI.to_string(),
            cse_ri: CSE_RI.to_string(),
            cse_rn: CSE_RN.to_string(),
            cse_originator: "CAdmin".to_string(),
            rvi: "3".to_string(),
            discovery_default_limit: 1000,
        };
        let dispatcher = Arc::new(Dispatcher::new(store, access, registration, notify, events, config));

        router(dispatcher)
    }

    #[tokio::test]
    async fn health_endpoint_bypasses_the_envelope() {
        let app = test_router().await;
        let response = app
            .oneshot(HttpRequest::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn retrieve_with_missing_headers_is_rejected_as_bad_request() {
        let app = test_router().await;
        let response = app
            .oneshot(HttpRequest::builder().uri("/cse-in").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn retrieve_cse_base_round_trips_through_http() {
        let app = test_router().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/cse-in")
                    .header(constants::HEADER_REQUEST_ID, "req1")
                    .header(constants::HEADER_RELEASE_VERSION, "3")
                    .header(constants::HEADER_ORIGIN, "CAdmin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(constants::HEADER_RESPONSE_STATUS_CODE).unwrap(),
            "2000"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["body"]["body"]["csi"], CSE_CSI);
    }

    #[tokio::test]
    async fn create_ae_via_post_returns_201_with_location_metadata() {
        let app = test_router().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/cse-in?ty=2")
                    .header(constants::HEADER_REQUEST_ID, "req2")
                    .header(constants::HEADER_RELEASE_VERSION, "3")
                    .header(constants::HEADER_ORIGIN, "Cmyapp")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"api":"N.example.app","rn":"myapp"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(constants::HEADER_RESPONSE_STATUS_CODE).unwrap(),
            "2001"
        );
    }

    #[tokio::test]
    async fn rvi_mismatch_reports_release_version_not_supported() {
        let app = test_router().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/cse-in")
                    .header(constants::HEADER_REQUEST_ID, "req4")
                    .header(constants::HEADER_RELEASE_VERSION, "1")
                    .header(constants::HEADER_ORIGIN, "CAdmin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(constants::HEADER_RESPONSE_STATUS_CODE).unwrap(),
            "4127"
        );
    }

    #[tokio::test]
    async fn create_with_unknown_numeric_type_is_rejected() {
        let app = test_router().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/cse-in?ty=999")
                    .header(constants::HEADER_REQUEST_ID, "req5")
                    .header(constants::HEADER_RELEASE_VERSION, "3")
                    .header(constants::HEADER_ORIGIN, "CAdmin")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_without_ty_query_param_is_rejected() {
        let app = test_router().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/cse-in")
                    .header(constants::HEADER_REQUEST_ID, "req3")
                    .header(constants::HEADER_RELEASE_VERSION, "3")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
