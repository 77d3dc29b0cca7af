//! Account operations on top of `Transport`.
//!
//! # Design
//! Each operation checks its trivial preconditions, maps its inputs to a
//! path (and body), and makes exactly one round trip. `list` pages on the
//! client: the downstream paging parameters have no effect, so the full
//! collection is fetched and sliced by `page`.

use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::transport::Transport;
use crate::types::Account;

pub const ACCOUNTS_PATH: &str = "/v1/organisation/accounts";

/// Client for the organisation accounts endpoint.
#[derive(Debug, Clone, Default)]
pub struct AccountService {
    transport: Transport,
}

impl AccountService {
    /// Use `transport` when given, otherwise a default one.
    pub fn new(transport: Option<Transport>) -> Self {
        Self {
            transport: transport.unwrap_or_default(),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    #[instrument(skip(self))]
    pub fn get_by_id(&self, id: &str) -> ApiResult<Account> {
        if id.is_empty() {
            return Err(ApiError::invalid_argument("id must not be empty"));
        }
        let account = self.transport.get(&format!("{ACCOUNTS_PATH}/{id}"))?;
        Ok(account.unwrap_or_default())
    }

    /// Create `account`. Its `id` must already be set; no ID is generated here.
    #[instrument(skip(self, account), fields(id = %account.id))]
    pub fn create(&self, account: &Account) -> ApiResult<Account> {
        if account.id.is_empty() {
            return Err(ApiError::invalid_argument("account id is missing, generate a new UUID"));
        }
        let created = self.transport.post(ACCOUNTS_PATH, account)?;
        Ok(created.unwrap_or_default())
    }

    /// Delete the account `id`.
    ///
    /// Always sends `version=0`, so only accounts that were never updated can
    /// be deleted; any other version is rejected by the server.
    #[instrument(skip(self))]
    pub fn delete_by_id(&self, id: &str) -> ApiResult<()> {
        if id.is_empty() {
            return Err(ApiError::invalid_argument("id must not be empty"));
        }
        self.transport
            .delete(&format!("{ACCOUNTS_PATH}/{id}?version=0"))
    }

    /// Page `page_number` (1-based) of `page_items` accounts, in server order.
    ///
    /// Fetches every account on each call and slices locally.
    #[instrument(skip(self))]
    pub fn list(&self, page_number: i64, page_items: i64) -> ApiResult<Vec<Account>> {
        if page_number <= 0 || page_items <= 0 {
            return Err(ApiError::invalid_argument(
                "page_number and page_items must both be greater than 0",
            ));
        }
        let start =
            usize::try_from((page_number - 1).saturating_mul(page_items)).unwrap_or(usize::MAX);
        let stop = start.saturating_add(usize::try_from(page_items).unwrap_or(usize::MAX));

        let accounts: Vec<Account> = self.transport.get(ACCOUNTS_PATH)?.unwrap_or_default();
        Ok(page(start, stop, accounts))
    }
}

/// Items `[start, stop)` of `items`, each bound capped at the length.
pub fn page<T>(start: usize, stop: usize, mut items: Vec<T>) -> Vec<T> {
    let len = items.len();
    let start = start.min(len);
    let stop = stop.min(len);
    if start >= stop {
        return Vec::new();
    }
    items.truncate(stop);
    items.drain(..start);
    items
}
