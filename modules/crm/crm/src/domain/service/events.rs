use std::sync::Arc;

use chrono::Utc;
use crm_db::Db;
use crm_db::secure::AccessScope;
use crm_sdk::{
    ContactKind, Event, EventPatch, EventStatus, EventStatusCode, ListParams, NewEvent,
    StatusSelector,
};
use crm_security::RowId;
use tracing::{debug, info, instrument};

use super::{Deps, ServiceConfig, authorize, check_text};
use crate::domain::error::DomainError;
use crate::domain::permissions::{Action, Resource};
use crate::domain::profile::Actor;
use crate::domain::repos::{CrmRepository, EventDraft};
use crate::domain::visibility::VisibilityPolicy;

const NOTES_MAX: usize = 2048;

pub struct EventsService<R: CrmRepository> {
    db: Db,
    repo: Arc<R>,
    policy: Arc<VisibilityPolicy<R>>,
    config: Arc<ServiceConfig>,
}

fn validate(draft: &EventDraft) -> Result<(), DomainError> {
    if draft.attendees < 0 {
        return Err(DomainError::validation("attendees", "must not be negative"));
    }
    check_text("notes", &draft.notes, NOTES_MAX, true)
}

impl<R: CrmRepository> EventsService<R> {
    #[must_use]
    pub fn new(deps: Deps<R>) -> Self {
        Self {
            db: deps.db,
            repo: deps.repo,
            policy: deps.policy,
            config: deps.config,
        }
    }

    async fn resolve_status(&self, selector: StatusSelector) -> Result<EventStatus, DomainError> {
        let found = self.repo.find_status(self.db.conn(), selector).await?;
        match (found, selector) {
            (Some(status), _) => Ok(status),
            (None, StatusSelector::Id(id)) => Err(DomainError::not_found("EventStatus", id)),
            (None, StatusSelector::Code(code)) => Err(DomainError::validation(
                "event_status",
                format!("unknown status {}", code.label()),
            )),
        }
    }

    async fn ensure_refs(
        &self,
        client_id: Option<RowId>,
        support_contact_id: Option<RowId>,
    ) -> Result<(), DomainError> {
        let conn = self.db.conn();
        if let Some(id) = client_id {
            self.repo
                .get_client(conn, &AccessScope::allow_all(), id)
                .await?
                .ok_or_else(|| DomainError::not_found("Client", id))?;
        }
        if let Some(id) = support_contact_id {
            self.repo
                .get_contact(conn, ContactKind::Support, id)
                .await?
                .ok_or_else(|| DomainError::not_found("SupportContact", id))?;
        }
        Ok(())
    }

    /// # Errors
    /// `Forbidden` for anonymous callers and callers without `view_event`.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn list(&self, actor: &Actor, params: ListParams) -> Result<Vec<Event>, DomainError> {
        debug!("Listing events");
        authorize(actor, Resource::Event, Action::List)?;
        let conn = self.db.conn();
        let scope = self.policy.event_scope(conn, actor).await?;
        let events = self
            .repo
            .list_events(conn, &scope, self.config.window(params))
            .await?;
        debug!(count = events.len(), "Successfully listed events");
        Ok(events)
    }

    /// # Errors
    /// `NotFound` when the event is missing or outside the caller's scope.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), event_id = id))]
    pub async fn get(&self, actor: &Actor, id: RowId) -> Result<Event, DomainError> {
        debug!("Getting event by id");
        authorize(actor, Resource::Event, Action::Retrieve)?;
        let conn = self.db.conn();
        let scope = self.policy.event_scope(conn, actor).await?;
        let event = self
            .repo
            .get_event(conn, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", id))?;
        debug!("Successfully retrieved event");
        Ok(event)
    }

    /// Create an event; the status defaults to `CREATED` and the date to now.
    ///
    /// # Errors
    /// `Validation` for bad fields, `NotFound` for unknown references.
    #[instrument(skip(self, actor, new_event), fields(user_id = actor.user_id()))]
    pub async fn create(&self, actor: &Actor, new_event: NewEvent) -> Result<Event, DomainError> {
        authorize(actor, Resource::Event, Action::Create)?;
        let now = Utc::now();
        let status = self
            .resolve_status(
                new_event
                    .event_status
                    .unwrap_or(StatusSelector::Code(EventStatusCode::Created)),
            )
            .await?;
        let draft = EventDraft {
            client_id: new_event.client_id,
            support_contact_id: new_event.support_contact_id,
            event_status_id: status.id,
            attendees: new_event.attendees,
            event_date: new_event.event_date.unwrap_or(now),
            notes: new_event.notes,
        };
        validate(&draft)?;
        self.ensure_refs(Some(draft.client_id), Some(draft.support_contact_id))
            .await?;

        let event = self.repo.insert_event(self.db.conn(), &draft, now).await?;
        info!(event_id = event.id, "Created event");
        Ok(event)
    }

    /// Apply `patch` to a visible event.
    ///
    /// # Errors
    /// As for [`Self::create`], plus `NotFound` for an event outside the scope.
    #[instrument(skip(self, actor, patch), fields(user_id = actor.user_id(), event_id = id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: RowId,
        patch: EventPatch,
    ) -> Result<Event, DomainError> {
        authorize(actor, Resource::Event, Action::Update)?;
        let conn = self.db.conn();
        let scope = self.policy.event_scope(conn, actor).await?;
        let stored = self
            .repo
            .get_event(conn, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", id))?;

        let event_status_id = if let Some(selector) = patch.event_status {
            self.resolve_status(selector).await?.id
        } else {
            stored.event_status_id
        };
        let draft = EventDraft {
            client_id: patch.client_id.unwrap_or(stored.client_id),
            support_contact_id: patch.support_contact_id.unwrap_or(stored.support_contact_id),
            event_status_id,
            attendees: patch.attendees.unwrap_or(stored.attendees),
            event_date: patch.event_date.unwrap_or(stored.event_date),
            notes: patch.notes.unwrap_or(stored.notes),
        };
        validate(&draft)?;
        self.ensure_refs(patch.client_id, patch.support_contact_id)
            .await?;

        let event = self
            .repo
            .update_event(conn, id, &draft, Utc::now())
            .await?;
        info!(status = event.event_status.status.label(), "Updated event");
        Ok(event)
    }

    /// # Errors
    /// `NotFound` for an event outside the scope.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), event_id = id))]
    pub async fn delete(&self, actor: &Actor, id: RowId) -> Result<(), DomainError> {
        authorize(actor, Resource::Event, Action::Destroy)?;
        let conn = self.db.conn();
        let scope = self.policy.event_scope(conn, actor).await?;
        if !self.repo.delete_event(conn, &scope, id).await? {
            return Err(DomainError::not_found("Event", id));
        }
        info!("Deleted event");
        Ok(())
    }

    /// Every event status, ordered by id. Open to any authenticated caller.
    ///
    /// # Errors
    /// `Database` if the lookup fails.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn statuses(&self, actor: &Actor) -> Result<Vec<EventStatus>, DomainError> {
        Ok(self.repo.list_statuses(self.db.conn()).await?)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn draft(attendees: i32, notes: &str) -> EventDraft {
        EventDraft {
            client_id: 1,
            support_contact_id: 1,
            event_status_id: 1,
            attendees,
            event_date: Utc::now(),
            notes: notes.to_owned(),
        }
    }

    #[test]
    fn empty_notes_and_zero_attendees_are_fine() {
        assert!(validate(&draft(0, "")).is_ok());
    }

    #[test]
    fn negative_attendees_and_long_notes_are_rejected() {
        assert!(validate(&draft(-1, "")).is_err());
        assert!(validate(&draft(10, &"n".repeat(NOTES_MAX + 1))).is_err());
    }
}
