use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub use axum::{http::StatusCode, Router};

pub const ACCOUNTS_PATH: &str = "/v1/organisation/accounts";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Account {
    pub attributes: Value,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_on: String,
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub modified_on: String,
    pub organisation_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: i64,
}

#[derive(Deserialize)]
pub struct CreateAccount {
    pub data: Account,
}

#[derive(Deserialize)]
pub struct DeleteParams {
    pub version: Option<i64>,
}

/// Accounts in insertion order.
pub type Db = Arc<RwLock<Vec<Account>>>;

pub fn app() -> Router {
    app_with_accounts(Vec::new())
}

/// Router preloaded with `seed`, versions kept as given.
pub fn app_with_accounts(seed: Vec<Account>) -> Router {
    let db: Db = Arc::new(RwLock::new(seed));
    Router::new()
        .route(ACCOUNTS_PATH, get(list_accounts).post(create_account))
        .route(
            &format!("{ACCOUNTS_PATH}/{{id}}"),
            get(get_account).delete(delete_account),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock account api listening");
    }
    axum::serve(listener, router).await
}

/// A canned answer returned for every request, whatever the method or path.
///
/// Every request received is recorded and can be read back with `requests`.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, as sent.
    pub uri: String,
    /// Header names are lowercase.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl Fixture {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            delay: Duration::ZERO,
            recorded: Arc::default(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: RecordedRequest) {
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(request);
        }
    }
}

pub fn fixture_app(fixture: Fixture) -> Router {
    Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: String| {
        let fixture = fixture.clone();
        async move {
            fixture.record(RecordedRequest {
                method: method.to_string(),
                uri: uri.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect(),
                body,
            });
            if !fixture.delay.is_zero() {
                tokio::time::sleep(fixture.delay).await;
            }
            (fixture.status, fixture.body)
        }
    })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error_message": message.into() }))).into_response()
}

fn account_response(status: StatusCode, account: &Account) -> Response {
    let body = json!({
        "data": account,
        "links": { "self": format!("{ACCOUNTS_PATH}/{}", account.id) },
    });
    (status, Json(body)).into_response()
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

async fn list_accounts(State(db): State<Db>) -> Response {
    let accounts = db.read().await;
    let page = |which: &str| format!("{ACCOUNTS_PATH}?page%5Bnumber%5D={which}");
    let body = json!({
        "data": &*accounts,
        "links": {
            "first": page("first"),
            "last": page("last"),
            "self": page("first"),
        },
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn create_account(
    State(db): State<Db>,
    payload: Result<Json<CreateAccount>, JsonRejection>,
) -> Response {
    let Json(CreateAccount { data: mut account }) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if Uuid::parse_str(&account.id).is_err() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("id in body must be of type uuid: {:?}", account.id),
        );
    }

    let mut accounts = db.write().await;
    if accounts.iter().any(|a| a.id == account.id) {
        return error_response(
            StatusCode::CONFLICT,
            "Account cannot be created as it violates a duplicate constraint",
        );
    }
    let now = timestamp();
    account.created_on = now.clone();
    account.modified_on = now;
    account.version = 0;
    debug!(id = %account.id, "account created");
    accounts.push(account.clone());
    account_response(StatusCode::CREATED, &account)
}

async fn get_account(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let accounts = db.read().await;
    match accounts.iter().find(|a| a.id == id) {
        Some(account) => account_response(StatusCode::OK, account),
        None => error_response(StatusCode::NOT_FOUND, format!("record {id} does not exist")),
    }
}

async fn delete_account(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Response {
    let Some(version) = params.version else {
        return error_response(StatusCode::BAD_REQUEST, "version is required");
    };
    let mut accounts = db.write().await;
    let Some(pos) = accounts.iter().position(|a| a.id == id) else {
        return error_response(StatusCode::NOT_FOUND, format!("record {id} does not exist"));
    };
    if accounts[pos].version != version {
        return error_response(StatusCode::CONFLICT, "invalid version");
    }
    accounts.remove(pos);
    debug!(%id, "account deleted");
    StatusCode::NO_CONTENT.into_response()
}
