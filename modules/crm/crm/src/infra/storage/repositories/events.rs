use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_db::secure::{AccessScope, Window, scoped_delete_by_id, scoped_find_by_id, scoped_list};
use crm_sdk::{Event, EventStatus, EventStatusCode, EventStatusLabel, StatusSelector};
use crm_security::RowId;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::OrmCrmRepository;
use crate::domain::repos::{EventDraft, EventsRepository};
use crate::infra::storage::entity::{event, event_status};

fn to_status(m: &event_status::Model) -> Result<EventStatus, DbErr> {
    let status = EventStatusCode::from_code(&m.status)
        .ok_or_else(|| DbErr::Custom(format!("unknown event status code {:?}", m.status)))?;
    Ok(EventStatus { id: m.id, status })
}

async fn status_map<C: ConnectionTrait>(conn: &C) -> Result<HashMap<RowId, EventStatusCode>, DbErr> {
    event_status::Entity::find()
        .all(conn)
        .await?
        .iter()
        .map(|m| to_status(m).map(|s| (s.id, s.status)))
        .collect()
}

fn to_event(m: event::Model, statuses: &HashMap<RowId, EventStatusCode>) -> Result<Event, DbErr> {
    let status = statuses
        .get(&m.event_status_id)
        .copied()
        .ok_or_else(|| DbErr::RecordNotFound(format!("event status {}", m.event_status_id)))?;
    Ok(Event {
        id: m.id,
        client_id: m.client_id,
        support_contact_id: m.support_contact_id,
        event_status_id: m.event_status_id,
        event_status: EventStatusLabel { status },
        attendees: m.attendees,
        event_date: m.event_date,
        notes: m.notes,
        date_created: m.date_created,
        date_updated: m.date_updated,
    })
}

#[async_trait]
impl EventsRepository for OrmCrmRepository {
    async fn list_events<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        window: Window,
    ) -> Result<Vec<Event>, DbErr> {
        let rows = scoped_list::<event::Entity, _>(conn, scope, window).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let statuses = status_map(conn).await?;
        rows.into_iter().map(|m| to_event(m, &statuses)).collect()
    }

    async fn get_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<Option<Event>, DbErr> {
        let Some(m) = scoped_find_by_id::<event::Entity, _>(conn, scope, id).await? else {
            return Ok(None);
        };
        let statuses = status_map(conn).await?;
        to_event(m, &statuses).map(Some)
    }

    async fn insert_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        draft: &EventDraft,
        now: DateTime<Utc>,
    ) -> Result<Event, DbErr> {
        let m = event::ActiveModel {
            client_id: Set(draft.client_id),
            support_contact_id: Set(draft.support_contact_id),
            event_status_id: Set(draft.event_status_id),
            attendees: Set(draft.attendees),
            event_date: Set(draft.event_date),
            notes: Set(draft.notes.clone()),
            date_created: Set(now),
            date_updated: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        to_event(m, &status_map(conn).await?)
    }

    async fn update_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: RowId,
        draft: &EventDraft,
        now: DateTime<Utc>,
    ) -> Result<Event, DbErr> {
        let m = event::ActiveModel {
            id: Unchanged(id),
            client_id: Set(draft.client_id),
            support_contact_id: Set(draft.support_contact_id),
            event_status_id: Set(draft.event_status_id),
            attendees: Set(draft.attendees),
            event_date: Set(draft.event_date),
            notes: Set(draft.notes.clone()),
            date_updated: Set(now),
            ..Default::default()
        }
        .update(conn)
        .await?;
        to_event(m, &status_map(conn).await?)
    }

    async fn delete_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<bool, DbErr> {
        scoped_delete_by_id::<event::Entity, _>(conn, scope, id).await
    }

    async fn client_ids_with_events_for<C: ConnectionTrait>(
        &self,
        conn: &C,
        support_contact_id: RowId,
    ) -> Result<Vec<RowId>, DbErr> {
        event::Entity::find()
            .select_only()
            .column(event::Column::ClientId)
            .filter(event::Column::SupportContactId.eq(support_contact_id))
            .distinct()
            .into_tuple()
            .all(conn)
            .await
    }

    async fn list_statuses<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<EventStatus>, DbErr> {
        event_status::Entity::find()
            .order_by_asc(event_status::Column::Id)
            .all(conn)
            .await?
            .iter()
            .map(to_status)
            .collect()
    }

    async fn find_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        selector: StatusSelector,
    ) -> Result<Option<EventStatus>, DbErr> {
        let query = match selector {
            StatusSelector::Id(id) => event_status::Entity::find_by_id(id),
            StatusSelector::Code(code) => {
                event_status::Entity::find().filter(event_status::Column::Status.eq(code.code()))
            }
        };
        query.one(conn).await?.as_ref().map(to_status).transpose()
    }
}
