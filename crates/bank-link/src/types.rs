//! Domain types shared by the linking components.

use crate::error::{AuthFlowError, LinkError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use url::Url;

/// Opaque bearer token scoping all RPCs to one linking session.
///
/// Forwarded verbatim, never parsed. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for forwarding to the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

impl From<&str> for ClientSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClientSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Everything the auth session manager needs to present one flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    /// Entry point of the hosted authentication flow.
    pub hosted_auth_url: Url,
    /// Landing URL that signals a successful link.
    pub success_target: Url,
    /// Landing URL that signals the user backed out.
    pub cancel_target: Url,
    /// Backend session id, when the bootstrap response carries one.
    pub session_id: Option<String>,
}

/// Terminal result of one presented auth flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Flow landed on the success target; carries the full landing URL.
    Redirected(Url),
    /// User backed out, or the flow landed on the cancel target.
    Canceled,
    /// Anything else.
    Failed(AuthFlowError),
}

/// Backend-shaped account, not yet normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAccount {
    /// An account linked through an institution login.
    LinkedAccount {
        id: Option<String>,
        display_name: Option<String>,
        institution_name: String,
        last4: Option<String>,
    },
    /// A plain bank account (routing/account number shape).
    BankAccount {
        id: Option<String>,
        bank_name: Option<String>,
        last4: String,
    },
    /// Any shape this client does not understand.
    Unparsable { id: Option<String> },
}

#[derive(Deserialize)]
struct LinkedAccountShape {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    institution_name: String,
    #[serde(default)]
    last4: Option<String>,
}

#[derive(Deserialize)]
struct BankAccountShape {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    bank_name: Option<String>,
    last4: String,
}

impl RawAccount {
    /// Decode one backend account object.
    ///
    /// The `object` field selects the shape. Unknown discriminators and
    /// shapes missing required fields become [`RawAccount::Unparsable`].
    pub fn from_value(value: serde_json::Value) -> Self {
        let id = value.get("id").and_then(|v| v.as_str()).map(str::to_string);
        let object = value
            .get("object")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_default();

        match object.as_str() {
            "linked_account" | "financial_connections.account" => {
                match serde_json::from_value::<LinkedAccountShape>(value) {
                    Ok(shape) => RawAccount::LinkedAccount {
                        id: shape.id,
                        display_name: shape.display_name,
                        institution_name: shape.institution_name,
                        last4: shape.last4,
                    },
                    Err(_) => RawAccount::Unparsable { id },
                }
            }
            "bank_account" => match serde_json::from_value::<BankAccountShape>(value) {
                Ok(shape) => RawAccount::BankAccount {
                    id: shape.id,
                    bank_name: shape.bank_name,
                    last4: shape.last4,
                },
                Err(_) => RawAccount::Unparsable { id },
            },
            _ => RawAccount::Unparsable { id },
        }
    }

    /// Backend id, used as the pagination cursor.
    pub fn id(&self) -> Option<&str> {
        match self {
            RawAccount::LinkedAccount { id, .. }
            | RawAccount::BankAccount { id, .. }
            | RawAccount::Unparsable { id } => id.as_deref(),
        }
    }
}

impl<'de> Deserialize<'de> for RawAccount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(RawAccount::from_value(value))
    }
}

/// One page of accounts as returned by a single RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPage {
    pub items: Vec<RawAccount>,
    /// Id of the last item carrying one; the next page starts after it.
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl AccountPage {
    pub fn new(items: Vec<RawAccount>, has_more: bool) -> Self {
        let next_cursor = items
            .iter()
            .rev()
            .find_map(|item| item.id().map(str::to_string));
        Self {
            items,
            next_cursor,
            has_more,
        }
    }
}

/// Normalized linked account; the only entity leaving this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedBank {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    pub instantly_verified: bool,
}

/// Caller-facing result of one link attempt.
#[derive(Debug)]
pub enum LinkResult {
    Completed(LinkedBank),
    Canceled,
    Failed(LinkError),
}

impl LinkResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, LinkResult::Completed(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, LinkResult::Canceled)
    }

    /// The linked account, if the attempt completed.
    pub fn linked_bank(&self) -> Option<&LinkedBank> {
        match self {
            LinkResult::Completed(bank) => Some(bank),
            _ => None,
        }
    }
}
