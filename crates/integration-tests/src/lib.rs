//! Integration test harness for Hazel Lab.
//!
//! # Running Tests
//!
//! ```bash
//! # Mock-backed tests (no external services needed)
//! cargo test -p hazel-lab-integration-tests
//!
//! # Smoke tests against a running storefront
//! STOREFRONT_URL=http://localhost:3000 cargo test -p hazel-lab-integration-tests -- --ignored
//! ```
//!
//! # Pieces
//!
//! - [`MockBackend`] - an axum stand-in for the REST backend on an ephemeral
//!   port, with canned catalogue, accounts and carts. Every request it sees is
//!   recorded so tests can assert on paths and query strings.
//! - [`Storefront`] - the storefront router served against a mock backend,
//!   driven with a cookie-keeping `reqwest` client.
//!
//! # Canned data
//!
//! | User id | Email              | Cart                               |
//! |---------|--------------------|------------------------------------|
//! | 7       | `ana@duoc.cl`      | Mesa x2 ($50.000), Silla x1        |
//! | 8       | `vacio@duoc.cl`    | empty                              |
//! | 9       | `roto@duoc.cl`     | backend answers 500                |
//! | 10      | `raro@duoc.cl`     | one line with a non-numeric cost   |
//! | 11      | `html@duoc.cl`     | backend answers 200 with HTML      |
//!
//! Every account's password is [`PASSWORD`].

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use hazel_lab_core::CoercionPolicy;
use hazel_lab_storefront::config::{BackendConfig, CheckoutConfig, StorefrontConfig};
use hazel_lab_storefront::middleware::{create_session_layer, security_headers_middleware};
use hazel_lab_storefront::routes;
use hazel_lab_storefront::state::AppState;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Password accepted for every canned account.
pub const PASSWORD: &str = "secreto1";

/// Message the mock sends for rejected logins, as a bare string body.
pub const BAD_CREDENTIALS: &str = "Credenciales inválidas";

/// Email the mock reports as already registered.
pub const TAKEN_EMAIL: &str = "tomado@gmail.com";

/// Message the mock sends when [`TAKEN_EMAIL`] registers again.
pub const TAKEN_EMAIL_MESSAGE: &str = "El email ya está registrado";

// =============================================================================
// Mock Backend
// =============================================================================

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn push(&self, entry: String) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(entry);
        }
    }

    fn snapshot(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

/// An in-process stand-in for the Hazel Lab REST backend.
pub struct MockBackend {
    addr: SocketAddr,
    recorder: Recorder,
}

impl MockBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let recorder = Recorder::default();
        let app = Router::new()
            .nest("/api", api_routes())
            .layer(middleware::from_fn_with_state(recorder.clone(), record));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, recorder }
    }

    /// Base URL to configure the client with (`http://127.0.0.1:port/api`).
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client settings pointing at this backend.
    #[must_use]
    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            api_url: self.api_url(),
            timeout: None,
        }
    }

    /// Every request seen so far, as `"METHOD /path?query"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.recorder.snapshot()
    }

    /// How many recorded requests start with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

async fn record(State(recorder): State<Recorder>, request: Request, next: Next) -> Response {
    recorder.push(format!("{} {}", request.method(), request.uri()));
    next.run(request).await
}

fn api_routes() -> Router {
    Router::new()
        .route("/productos", get(products))
        .route("/productos/destacados", get(featured))
        .route("/productos/buscar/avanzada", get(products))
        .route("/categorias", get(categories))
        .route("/auth/login", post(login))
        .route("/usuarios", post(create_user))
        .route("/ubicacion/regiones", get(regions))
        .route("/ubicacion/comunas/{region}", get(comunas))
        .route("/itemscarrito", post(add_item))
        .route("/itemscarrito/usuario/{id}", get(cart_items))
        .route("/itemscarrito/{id}/cantidad", put(update_item))
        .route("/itemscarrito/{id}", delete(remove_item))
}

fn catalogue() -> Value {
    json!([
        {
            "id": 4, "name": "Mesa de Roble", "description": "Mesa de comedor",
            "cost": 50000, "stock": 3, "activeStatus": true, "destacado": true,
            "category": {"id": 1, "nombre": "Muebles"}, "image": "https://cdn.hazellab.cl/mesa.jpg"
        },
        {
            "id": 5, "name": "Silla Nórdica", "description": "Silla de haya",
            "cost": 20000, "stock": 12, "activeStatus": true, "destacado": false,
            "category": {"id": 1, "nombre": "Muebles"}
        },
        {
            "id": 6, "name": "Vela Aromática", "description": "Aroma a roble",
            "cost": 7990, "stock": 40, "activeStatus": true, "destacado": false,
            "category": {"id": 2, "nombre": "Decoración"}
        }
    ])
}

async fn products() -> Json<Value> {
    Json(catalogue())
}

async fn featured() -> Json<Value> {
    let first = catalogue().get(0).cloned().unwrap_or(Value::Null);
    Json(json!([first]))
}

async fn categories() -> Json<Value> {
    Json(json!([{"id": 1, "nombre": "Muebles"}, {"id": 2, "nombre": "Decoración"}]))
}

fn account(email: &str) -> Option<Value> {
    let (id, username) = match email {
        "ana@duoc.cl" => (7, "Ana Pérez"),
        "vacio@duoc.cl" => (8, "Vicente Vacío"),
        "roto@duoc.cl" => (9, "Rosa Roto"),
        "raro@duoc.cl" => (10, "Raúl Raro"),
        "html@duoc.cl" => (11, "Hugo Html"),
        _ => return None,
    };
    Some(json!({
        "id": id, "username": username, "email": email,
        "role": "Cliente", "status": "activo"
    }))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    match account(&body.email) {
        Some(user) if body.password == PASSWORD => Json(user).into_response(),
        _ => (StatusCode::UNAUTHORIZED, BAD_CREDENTIALS).into_response(),
    }
}

async fn create_user(Json(body): Json<Value>) -> Response {
    if body.get("email").and_then(Value::as_str) == Some(TAKEN_EMAIL) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": TAKEN_EMAIL_MESSAGE})),
        )
            .into_response();
    }

    let mut user = body;
    if let Some(fields) = user.as_object_mut() {
        fields.insert("id".to_string(), json!(99));
        fields.remove("password");
    }
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn regions() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn comunas(Path(region): Path<String>) -> Json<Vec<&'static str>> {
    Json(match region.as_str() {
        "Metropolitana" => vec!["Ñuñoa", "Providencia", "Santiago"],
        "Región de Ñuble" => vec!["Chillán", "San Carlos"],
        _ => Vec::new(),
    })
}

#[derive(Deserialize)]
struct NewItem {
    producto: IdOnly,
}

#[derive(Deserialize)]
struct IdOnly {
    id: i64,
}

async fn add_item(Json(body): Json<NewItem>) -> StatusCode {
    if catalogue()
        .as_array()
        .is_some_and(|items| {
            items
                .iter()
                .any(|p| p.get("id").and_then(Value::as_i64) == Some(body.producto.id))
        })
    {
        StatusCode::CREATED
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn cart_items(Path(id): Path<i64>) -> Response {
    match id {
        7 => Json(json!([
            {"id": 1, "producto": {"id": 4, "name": "Mesa de Roble", "cost": 50000}, "quantity": 2},
            {"id": 2, "producto": {"id": 5, "name": "Silla Nórdica", "cost": "20000"}, "quantity": "1"}
        ]))
        .into_response(),
        9 => (StatusCode::INTERNAL_SERVER_ERROR, "java.lang.NullPointerException").into_response(),
        10 => Json(json!([
            {"id": 3, "producto": {"id": 6, "name": "Vela Aromática", "cost": "gratis"}, "quantity": 1}
        ]))
        .into_response(),
        11 => (StatusCode::OK, "<html>ok</html>").into_response(),
        _ => Json(json!([])).into_response(),
    }
}

async fn update_item(Path(_id): Path<String>, Json(_body): Json<Value>) -> StatusCode {
    StatusCode::OK
}

async fn remove_item(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

// =============================================================================
// Storefront Harness
// =============================================================================

/// The storefront router served against a [`MockBackend`].
pub struct Storefront {
    /// Backend the storefront talks to.
    pub backend: MockBackend,
    base_url: String,
}

impl Storefront {
    /// Start a mock backend and a storefront in front of it.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn start(coercion: CoercionPolicy) -> Self {
        let backend = MockBackend::start().await;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront");
        let addr = listener.local_addr().expect("storefront address");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            backend: backend.config(),
            checkout: CheckoutConfig { coercion },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let session_layer = create_session_layer(&config);
        let state = AppState::new(config).expect("storefront state");
        let app = Router::new()
            .merge(routes::routes())
            .layer(session_layer)
            .layer(middleware::from_fn(security_headers_middleware))
            .with_state(state);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        Self { backend, base_url }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A browser-like client: keeps cookies, does not follow redirects.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("reqwest client")
    }

    /// Log `client` in as `email`.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the login is not accepted.
    pub async fn login(&self, client: &reqwest::Client, email: &str) {
        let response = client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", PASSWORD)])
            .send()
            .await
            .expect("login request");
        assert_eq!(
            response.status(),
            reqwest::StatusCode::SEE_OTHER,
            "login as {email} was not accepted"
        );
    }
}
