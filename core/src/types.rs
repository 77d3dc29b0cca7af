//! Domain DTOs for the account API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any schema drift between the two crates.
//! Empty strings and a zero version are left off the wire so a
//! not-yet-created account serializes without server-assigned fields.

use serde::{Deserialize, Serialize};

/// Discriminator carried in every account's `type` field.
pub const ACCOUNT_TYPE: &str = "accounts";

/// A single account resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Account {
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_on: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub modified_on: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub organisation_id: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Optimistic-concurrency marker. Never checked client-side.
    #[serde(skip_serializing_if = "is_zero")]
    pub version: i32,
}

impl Account {
    /// Build an account ready for `AccountService::create`.
    ///
    /// The caller owns `id` generation; the service rejects an empty one.
    pub fn new(
        id: impl Into<String>,
        organisation_id: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            attributes,
            id: id.into(),
            organisation_id: organisation_id.into(),
            kind: ACCOUNT_TYPE.to_string(),
            ..Self::default()
        }
    }
}

/// Flat record of account fields. Nothing here is validated before submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_bank_account_names: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_id_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_currency: Option<String>,
    /// Always sent, as `null` when unset.
    pub bic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}
