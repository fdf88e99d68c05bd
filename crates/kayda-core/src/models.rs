//! Domain models.
//!
//! Acts, Groups and Sections form a strict ownership tree: a Group belongs to
//! one Act, a Section belongs to exactly one [`Parent`] (an Act or a Group).
//! All three carry the [`Jurisdiction`] of the Act at the root of their tree.
//! Every document id is a UUID v4 drawn from one id space per entity type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CatalogError;

// ── Jurisdiction ─────────────────────────────────────────────────────

/// Which statute body a document belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jurisdiction {
    #[default]
    Maharashtra,
    Indian,
}

impl std::fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maharashtra => write!(f, "maharashtra"),
            Self::Indian => write!(f, "indian"),
        }
    }
}

impl std::str::FromStr for Jurisdiction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "maharashtra" => Ok(Self::Maharashtra),
            "indian" | "india" => Ok(Self::Indian),
            other => Err(format!("unknown jurisdiction: {other}")),
        }
    }
}

// ── Acts ─────────────────────────────────────────────────────────────

/// A top-level statute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Act {
    pub id: Uuid,
    pub jurisdiction: Jurisdiction,
    pub name: String,
    /// Free-text body. Acts structured as Groups/Sections usually leave this empty.
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The name and body of an Act, without the rest of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActContent {
    pub name: String,
    pub content: Option<String>,
}

// ── Groups ───────────────────────────────────────────────────────────

/// An intermediate grouping of Sections under an Act (a chapter or part).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub act_id: Uuid,
    pub jurisdiction: Jurisdiction,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Sections ─────────────────────────────────────────────────────────

/// The single owner of a Section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Parent {
    Act(Uuid),
    Group(Uuid),
}

impl Parent {
    /// The parent's document id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Act(id) | Self::Group(id) => *id,
        }
    }

    /// Human-readable kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Act(_) => "act",
            Self::Group(_) => "group",
        }
    }
}

/// A titled text body belonging to exactly one Act or Group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub parent: Parent,
    pub jurisdiction: Jurisdiction,
    pub name: String,
    pub text: String,
    pub description: Option<String>,
    /// Bumped on every update; callers may pass it back for conditional writes.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial Section update. `None` and empty strings leave a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SectionPatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub description: Option<String>,
    pub expected_version: Option<u64>,
}

// ── Accounts & sessions ──────────────────────────────────────────────

/// A stored user account. Never serialized to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Normalised (trimmed, lower-cased) email. This is the storage key.
    pub email: String,
    /// Argon2id PHC string with embedded salt.
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public account listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub email: String,
    pub is_admin: bool,
    pub logged_in: bool,
}

/// A stored login session, keyed by the SHA-256 hash of its token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has passed its expiry time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Returned once from a successful login. The token is never stored.
#[derive(Debug, Clone, Serialize)]
pub struct LoginGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub is_admin: bool,
}

/// The account behind a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub email: String,
    pub is_admin: bool,
}

/// Trim `value` and reject it if nothing is left.
pub(crate) fn require_nonblank(field: &str, value: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidRequest {
            reason: format!("{field} is required"),
        });
    }
    Ok(trimmed.to_owned())
}

/// Treat `None` and blank strings alike: both mean "leave unchanged".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
