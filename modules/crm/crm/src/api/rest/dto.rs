//! Request and response bodies of the REST surface.
//!
//! Request fields are all optional on the wire; `into_*` conversions
//! enforce what create (POST), update (PUT) and partial update (PATCH)
//! require. Unknown fields are ignored so that a retrieved object can be
//! sent back as-is.

use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};
use chrono::{DateTime, Utc};
use crm_sdk::{
    ClientPatch, Contact, ContactPatch, ContractPatch, EventPatch, EventStatusLabel, NewClient,
    NewContact, NewContract, NewEvent, StatusSelector, UserAccount,
};
use crm_security::RowId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::service::LoginSession;

/// Unwrap a JSON body, reporting a malformed one as a validation error.
///
/// # Errors
/// [`DomainError::Validation`] for a missing or malformed body.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, DomainError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| DomainError::validation("body", e.body_text()))
}

/// Unwrap a row id taken from the URL path.
///
/// # Errors
/// [`DomainError::Validation`] when the segment is not an integer.
pub fn row_id(path: Result<Path<RowId>, PathRejection>) -> Result<RowId, DomainError> {
    path.map(|Path(id)| id)
        .map_err(|e| DomainError::validation("id", e.body_text()))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::missing(field))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginReq {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResp {
    pub token: String,
    pub username: String,
    pub groups: Vec<String>,
}

impl From<LoginSession> for LoginResp {
    fn from(s: LoginSession) -> Self {
        Self {
            token: s.token,
            username: s.username,
            groups: s.groups,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResp {
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactUserReq {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `{"user": {"username", "password"}}`
#[derive(Debug, Default, Deserialize)]
pub struct ContactReq {
    pub user: Option<ContactUserReq>,
}

impl ContactReq {
    /// # Errors
    /// `Validation` when the user, username or password is missing.
    pub fn into_new(self) -> Result<NewContact, DomainError> {
        let user = required(self.user, "user")?;
        Ok(NewContact {
            username: required(user.username, "username")?,
            password: required(user.password, "password")?,
        })
    }

    /// # Errors
    /// `Validation` when the user or password is missing.
    pub fn into_patch(self) -> Result<ContactPatch, DomainError> {
        let user = required(self.user, "user")?;
        Ok(ContactPatch {
            username: user.username,
            password: required(user.password, "password")?,
        })
    }
}

/// `{"id", "user": {"id", "username", "groups"}}`
#[derive(Debug, Serialize)]
pub struct ContactResp {
    pub id: RowId,
    pub user: UserAccount,
}

impl From<Contact> for ContactResp {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            user: c.user,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub sales_contact_id: Option<RowId>,
}

impl ClientReq {
    fn check_required(&self) -> Result<(), DomainError> {
        for (present, field) in [
            (self.first_name.is_some(), "first_name"),
            (self.last_name.is_some(), "last_name"),
            (self.email.is_some(), "email"),
            (self.sales_contact_id.is_some(), "sales_contact_id"),
        ] {
            if !present {
                return Err(DomainError::missing(field));
            }
        }
        Ok(())
    }

    /// # Errors
    /// `Validation` when a required field is missing.
    pub fn into_new(self) -> Result<NewClient, DomainError> {
        Ok(NewClient {
            first_name: required(self.first_name, "first_name")?,
            last_name: required(self.last_name, "last_name")?,
            email: required(self.email, "email")?,
            phone: self.phone.unwrap_or_default(),
            mobile: self.mobile.unwrap_or_default(),
            sales_contact_id: required(self.sales_contact_id, "sales_contact_id")?,
        })
    }

    /// Full update: required fields must be present.
    ///
    /// # Errors
    /// `Validation` when a required field is missing.
    pub fn into_full_patch(self) -> Result<ClientPatch, DomainError> {
        self.check_required()?;
        Ok(self.into_patch())
    }

    #[must_use]
    pub fn into_patch(self) -> ClientPatch {
        ClientPatch {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            mobile: self.mobile,
            sales_contact_id: self.sales_contact_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContractReq {
    pub sales_contact_id: Option<RowId>,
    pub client_id: Option<RowId>,
    pub status: Option<bool>,
    pub amount: Option<Decimal>,
    pub payment_due: Option<DateTime<Utc>>,
}

impl ContractReq {
    fn check_required(&self) -> Result<(), DomainError> {
        for (present, field) in [
            (self.sales_contact_id.is_some(), "sales_contact_id"),
            (self.client_id.is_some(), "client_id"),
            (self.amount.is_some(), "amount"),
        ] {
            if !present {
                return Err(DomainError::missing(field));
            }
        }
        Ok(())
    }

    /// # Errors
    /// `Validation` when a required field is missing.
    pub fn into_new(self) -> Result<NewContract, DomainError> {
        Ok(NewContract {
            sales_contact_id: required(self.sales_contact_id, "sales_contact_id")?,
            client_id: required(self.client_id, "client_id")?,
            status: self.status.unwrap_or(false),
            amount: required(self.amount, "amount")?,
            payment_due: self.payment_due,
        })
    }

    /// # Errors
    /// `Validation` when a required field is missing.
    pub fn into_full_patch(self) -> Result<ContractPatch, DomainError> {
        self.check_required()?;
        Ok(self.into_patch())
    }

    #[must_use]
    pub fn into_patch(self) -> ContractPatch {
        ContractPatch {
            sales_contact_id: self.sales_contact_id,
            client_id: self.client_id,
            status: self.status,
            amount: self.amount,
            payment_due: self.payment_due,
        }
    }
}

/// The status may be picked by id or, taking precedence, by label:
/// `{"event_status": {"status": "ENDED"}}`.
#[derive(Debug, Default, Deserialize)]
pub struct EventReq {
    pub client_id: Option<RowId>,
    pub support_contact_id: Option<RowId>,
    pub event_status_id: Option<RowId>,
    pub event_status: Option<EventStatusLabel>,
    pub attendees: Option<i32>,
    pub event_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl EventReq {
    fn selector(&self) -> Option<StatusSelector> {
        self.event_status
            .map(|label| StatusSelector::Code(label.status))
            .or(self.event_status_id.map(StatusSelector::Id))
    }

    fn check_required(&self) -> Result<(), DomainError> {
        if self.client_id.is_none() {
            return Err(DomainError::missing("client_id"));
        }
        if self.support_contact_id.is_none() {
            return Err(DomainError::missing("support_contact_id"));
        }
        Ok(())
    }

    /// # Errors
    /// `Validation` when a required field is missing.
    pub fn into_new(self) -> Result<NewEvent, DomainError> {
        let event_status = self.selector();
        Ok(NewEvent {
            client_id: required(self.client_id, "client_id")?,
            support_contact_id: required(self.support_contact_id, "support_contact_id")?,
            event_status,
            attendees: self.attendees.unwrap_or(0),
            event_date: self.event_date,
            notes: self.notes.unwrap_or_default(),
        })
    }

    /// # Errors
    /// `Validation` when a required field is missing.
    pub fn into_full_patch(self) -> Result<EventPatch, DomainError> {
        self.check_required()?;
        Ok(self.into_patch())
    }

    #[must_use]
    pub fn into_patch(self) -> EventPatch {
        EventPatch {
            event_status: self.selector(),
            client_id: self.client_id,
            support_contact_id: self.support_contact_id,
            attendees: self.attendees,
            event_date: self.event_date,
            notes: self.notes,
        }
    }
}
