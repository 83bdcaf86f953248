//! Domain records for the client pipeline: enquiries, clients (leads included),
//! follow-ups, activities and projects, plus the on-disk `Config`.
//!
//! Every enumerated field is a closed enum. Free-form strings coming from
//! callers are parsed once at the boundary (`FromStr`, serde aliases) and never
//! passed through as raw text.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error returned when a boundary string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Generates `as_str`, `Display` and a case-insensitive `FromStr` (with
/// optional aliases) for a fieldless enum.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($name) $(|| needle.eq_ignore_ascii_case($alias))* {
                        return Ok($ty::$variant);
                    }
                )+
                Err(ParseEnumError {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

// =============================================================================
// Enquiries
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnquiryStatus {
    New,
    Read,
    Hold,
    Dismissed,
}

string_enum!(EnquiryStatus, "enquiry status", {
    New => "new",
    Read => "read",
    Hold => "hold",
    Dismissed => "dismissed",
});

impl EnquiryStatus {
    /// `new` and `read` both live in the inbox.
    pub fn is_inbox(&self) -> bool {
        matches!(self, EnquiryStatus::New | EnquiryStatus::Read)
    }
}

/// Result of the AI relevance check on an inbound enquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub is_relevant: bool,
    pub reason: String,
}

/// An unsolicited contact record, prior to qualification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub message: String,
    #[serde(alias = "date")]
    pub created_at: NaiveDateTime,
    pub status: EnquiryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
}

// =============================================================================
// Clients and leads
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientStatus {
    Lead,
    Active,
    Inactive,
    Pending,
    Churned,
    Dismissed,
}

string_enum!(ClientStatus, "client status", {
    Lead => "Lead",
    Active => "Active",
    Inactive => "Inactive",
    Pending => "Pending",
    Churned => "Churned",
    Dismissed => "Dismissed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadType {
    Hot,
    Warm,
    Cold,
}

string_enum!(LeadType, "lead type", {
    Hot => "Hot",
    Warm => "Warm",
    Cold => "Cold",
});

/// Whether a manually added client is new business or an existing relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    #[serde(alias = "New Client")]
    New,
    #[serde(alias = "Existing Client")]
    Existing,
}

string_enum!(ClientType, "client type", {
    New => "New" | "New Client",
    Existing => "Existing" | "Existing Client",
});

impl ClientType {
    /// Tag prepended to the notes of a manually added client.
    pub fn notes_tag(&self) -> &'static str {
        match self {
            ClientType::New => "[New Client] ",
            ClientType::Existing => "[Existing Client] ",
        }
    }
}

/// A lead or an onboarded client. `status` discriminates the role.
///
/// `lead_type` is only meaningful while `status == Lead` or after conversion
/// (`is_converted`), where it is retained for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub status: ClientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_type: Option<LeadType>,
    #[serde(default)]
    pub is_converted: bool,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub joined_date: NaiveDate,
    pub last_contact: NaiveDate,
}

impl Client {
    /// A lead that has not been onboarded yet.
    pub fn is_pending_lead(&self) -> bool {
        self.status == ClientStatus::Lead && !self.is_converted
    }

    /// Lead-tier label, if the invariant allows showing it.
    pub fn visible_lead_type(&self) -> Option<LeadType> {
        if self.status == ClientStatus::Lead || self.is_converted {
            self.lead_type
        } else {
            None
        }
    }
}

// =============================================================================
// Follow-ups
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpStatus {
    Pending,
    Completed,
}

string_enum!(FollowUpStatus, "follow-up status", {
    Pending => "pending",
    Completed => "completed",
});

impl FollowUpStatus {
    pub fn flipped(self) -> Self {
        match self {
            FollowUpStatus::Pending => FollowUpStatus::Completed,
            FollowUpStatus::Completed => FollowUpStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

string_enum!(Priority, "priority", {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid due date: {0}")]
pub struct DueDateParseError(pub String);

/// Due date of a follow-up: a calendar date, optionally with a time of day.
///
/// Values are wall-clock fields as given. An offset on an RFC 3339 input is
/// dropped after reading the local fields, never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DueDate {
    at: NaiveDateTime,
    has_time: bool,
}

impl DueDate {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            at: date.and_time(NaiveTime::MIN),
            has_time: false,
        }
    }

    pub fn at(at: NaiveDateTime) -> Self {
        Self { at, has_time: true }
    }

    pub fn date(&self) -> NaiveDate {
        self.at.date()
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.at
    }

    pub fn has_time(&self) -> bool {
        self.has_time
    }
}

impl FromStr for DueDate {
    type Err = DueDateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(DueDate::on(date));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(DueDate::at(dt.naive_local()));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(DueDate::at(dt));
            }
        }
        Err(DueDateParseError(s.to_string()))
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_time {
            write!(f, "{}", self.at.format("%Y-%m-%dT%H:%M:%S%.f"))
        } else {
            write!(f, "{}", self.at.format("%Y-%m-%d"))
        }
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A scheduled task tied to one client. `client_id` is a lookup reference
/// only; the client may be deleted independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: String,
    pub client_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: DueDate,
    pub status: FollowUpStatus,
    #[serde(default)]
    pub priority: Priority,
}

impl FollowUp {
    pub fn is_pending(&self) -> bool {
        self.status == FollowUpStatus::Pending
    }
}

// =============================================================================
// Activities
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Call,
    Email,
    Meeting,
    Note,
    System,
}

string_enum!(InteractionType, "interaction type", {
    Call => "call",
    Email => "email",
    Meeting => "meeting",
    Note => "note",
    System => "system",
});

/// Immutable log entry of a past interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub client_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub description: String,
    #[serde(alias = "date")]
    pub timestamp: NaiveDateTime,
}

// =============================================================================
// Projects
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Planning,
    #[serde(rename = "In Progress")]
    InProgress,
    Review,
    Completed,
}

string_enum!(ProjectStatus, "project status", {
    Planning => "Planning",
    InProgress => "In Progress" | "in-progress" | "InProgress",
    Review => "Review",
    Completed => "Completed",
});

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Planning
    }
}

impl ProjectStatus {
    /// Board columns, left to right.
    pub const STAGES: [ProjectStatus; 4] = [
        ProjectStatus::Planning,
        ProjectStatus::InProgress,
        ProjectStatus::Review,
        ProjectStatus::Completed,
    ];
}

/// Delivery-tracking record. The only holder of project attributes; a
/// client's "current project" is derived from these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_document: Option<String>,
    #[serde(default)]
    pub budget: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub progress: u8,
    pub created_at: NaiveDateTime,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration stored in `~/.leadbook/config.json`. Every field is optional
/// on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding `leadbook.db` / `leadbook.json`. Defaults to `~/.leadbook`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub ai: AiConfig,
    /// Organisation name used in AI prompts.
    #[serde(default = "default_organisation")]
    pub organisation: String,
    #[serde(default = "default_email_sign_off")]
    pub email_sign_off: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage: StorageBackend::default(),
            ai: AiConfig::default(),
            organisation: default_organisation(),
            email_sign_off: default_email_sign_off(),
        }
    }
}

fn default_organisation() -> String {
    "Parivartan".to_string()
}

fn default_email_sign_off() -> String {
    "Best, The Parivartan Team".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
    Memory,
}

string_enum!(StorageBackend, "storage backend", {
    Sqlite => "sqlite",
    Json => "json",
    Memory => "memory",
});

/// Text-generation collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    /// Total attempts per call, first try included.
    #[serde(default = "default_ai_attempts")]
    pub max_attempts: u32,
    /// Run relevance triage over the enquiry inbox.
    #[serde(default = "default_true")]
    pub enquiry_analysis: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ai_model(),
            endpoint: default_ai_endpoint(),
            timeout_secs: default_ai_timeout(),
            max_attempts: default_ai_attempts(),
            enquiry_analysis: true,
        }
    }
}

fn default_ai_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout() -> u64 {
    20
}

fn default_ai_attempts() -> u32 {
    2
}

fn default_true() -> bool {
    true
}
