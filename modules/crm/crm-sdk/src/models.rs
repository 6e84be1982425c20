use chrono::{DateTime, Utc};
use crm_security::RowId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The three contact roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Sales,
    Support,
    Staff,
}

impl ContactKind {
    pub const ALL: [Self; 3] = [Self::Sales, Self::Support, Self::Staff];

    /// Group a user joins when a contact of this kind is created.
    #[must_use]
    pub fn group_name(self) -> &'static str {
        match self {
            Self::Sales => "SALES",
            Self::Support => "SUPPORT",
            Self::Staff => "STAFF",
        }
    }

    /// Resource name used in permission codenames, e.g. `view_salescontact`.
    #[must_use]
    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Sales => "salescontact",
            Self::Support => "supportcontact",
            Self::Staff => "staffcontact",
        }
    }
}

/// Public view of a user account. Never carries password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: RowId,
    pub username: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: RowId,
    pub kind: ContactKind,
    pub user: UserAccount,
}

/// Credentials for a new contact's user account.
#[derive(Clone, PartialEq, Eq)]
pub struct NewContact {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for NewContact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewContact")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Password change for an existing contact.
///
/// When `username` is given it must name the contact's own user.
#[derive(Clone, PartialEq, Eq)]
pub struct ContactPatch {
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for ContactPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactPatch")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: RowId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub sales_contact_id: RowId,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub sales_contact_id: RowId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub sales_contact_id: Option<RowId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: RowId,
    pub sales_contact_id: RowId,
    pub client_id: RowId,
    /// Signed or not.
    pub status: bool,
    pub amount: Decimal,
    pub payment_due: DateTime<Utc>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContract {
    pub sales_contact_id: RowId,
    pub client_id: RowId,
    pub status: bool,
    pub amount: Decimal,
    /// Defaults to now.
    pub payment_due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractPatch {
    pub sales_contact_id: Option<RowId>,
    pub client_id: Option<RowId>,
    pub status: Option<bool>,
    pub amount: Option<Decimal>,
    pub payment_due: Option<DateTime<Utc>>,
}

/// Lifecycle stage of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatusCode {
    #[serde(rename = "CREATED")]
    Created,
    #[serde(rename = "IN PROGRESS")]
    InProgress,
    #[serde(rename = "ENDED")]
    Ended,
}

impl EventStatusCode {
    pub const ALL: [Self; 3] = [Self::Created, Self::InProgress, Self::Ended];

    /// One-letter storage code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Created => "C",
            Self::InProgress => "P",
            Self::Ended => "E",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Display label, e.g. `IN PROGRESS`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::InProgress => "IN PROGRESS",
            Self::Ended => "ENDED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatus {
    pub id: RowId,
    pub status: EventStatusCode,
}

/// Nested status label as rendered inside an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatusLabel {
    pub status: EventStatusCode,
}

/// How a caller picks an event status: by row id or by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSelector {
    Id(RowId),
    Code(EventStatusCode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: RowId,
    pub client_id: RowId,
    pub support_contact_id: RowId,
    pub event_status_id: RowId,
    pub event_status: EventStatusLabel,
    pub attendees: i32,
    pub event_date: DateTime<Utc>,
    pub notes: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub client_id: RowId,
    pub support_contact_id: RowId,
    /// Defaults to `CREATED`.
    pub event_status: Option<StatusSelector>,
    pub attendees: i32,
    /// Defaults to now.
    pub event_date: Option<DateTime<Utc>>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub client_id: Option<RowId>,
    pub support_contact_id: Option<RowId>,
    pub event_status: Option<StatusSelector>,
    pub attendees: Option<i32>,
    pub event_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Window over an id-ordered list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_storage_code() {
        for status in EventStatusCode::ALL {
            assert_eq!(EventStatusCode::from_code(status.code()), Some(status));
        }
        assert_eq!(EventStatusCode::from_code("X"), None);
    }

    #[test]
    fn status_label_serializes_with_space() {
        let label = EventStatusLabel {
            status: EventStatusCode::InProgress,
        };
        let json = serde_json::to_value(label).unwrap();
        assert_eq!(json, serde_json::json!({"status": "IN PROGRESS"}));
    }

    #[test]
    fn contact_secrets_are_not_debug_printed() {
        let new = NewContact {
            username: "sales_contact_02".to_owned(),
            password: "N3wpolo6".to_owned(),
        };
        let patch = ContactPatch {
            username: None,
            password: "Tk1nt3r0K".to_owned(),
        };
        assert!(!format!("{new:?}").contains("N3wpolo6"));
        assert!(!format!("{patch:?}").contains("Tk1nt3r0K"));
    }

    #[test]
    fn contact_kind_names() {
        assert_eq!(ContactKind::Sales.group_name(), "SALES");
        assert_eq!(ContactKind::Staff.resource_name(), "staffcontact");
        assert_eq!(
            serde_json::to_value(ContactKind::Support).unwrap(),
            serde_json::json!("support")
        );
    }
}
