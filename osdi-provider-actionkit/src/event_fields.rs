//! An event's custom fields, treated as a map from name to value.
//!
//! ActionKit stores each custom attribute as its own `eventfield` resource
//! and nothing on the server stops two records from sharing a name. All
//! reads and writes go through `EventFields`, which keeps at most one
//! record per name: a write updates the existing record in place when one
//! matches, and only creates a record when none does.

use futures::future::try_join_all;
use osdi_core::{OsdiError, OsdiResult};
use serde_json::json;
use tracing::debug;

use crate::actionkit_event::EventField;
use crate::api::RestClient;

#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    event_id: String,
    records: Vec<EventField>,
}

impl EventFields {
    pub fn new(event_id: &str, records: Vec<EventField>) -> Self {
        Self {
            event_id: event_id.to_string(),
            records,
        }
    }

    /// Fields of an event that was just created and has none yet.
    pub fn empty(event_id: &str) -> Self {
        Self::new(event_id, Vec::new())
    }

    /// Value of the first record named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|f| f.value.as_str())
    }

    pub fn records(&self) -> &[EventField] {
        &self.records
    }

    /// Write one field: update the matching record, or create one.
    pub async fn set<C>(&mut self, client: &C, name: &str, value: &str) -> OsdiResult<()>
    where
        C: RestClient + ?Sized,
    {
        let record = self.write(client, name, value).await?;
        self.remember(record);
        Ok(())
    }

    /// Write several fields concurrently. Names must be distinct; the first
    /// failed write fails the whole call.
    pub async fn set_all<C>(&mut self, client: &C, entries: &[(String, String)]) -> OsdiResult<()>
    where
        C: RestClient + ?Sized,
    {
        let written = try_join_all(
            entries
                .iter()
                .map(|(name, value)| self.write(client, name, value)),
        )
        .await?;

        for record in written {
            self.remember(record);
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&EventField> {
        self.records.iter().find(|f| f.name == name)
    }

    async fn write<C>(&self, client: &C, name: &str, value: &str) -> OsdiResult<EventField>
    where
        C: RestClient + ?Sized,
    {
        if let Some(existing) = self.find(name) {
            debug!(event_id = %self.event_id, name, "updating event field");
            client
                .put(&existing.resource_uri, Some(&json!({ "value": value })))
                .await?;

            return Ok(EventField {
                value: value.to_string(),
                ..existing.clone()
            });
        }

        debug!(event_id = %self.event_id, name, "creating event field");
        let response = client
            .post(
                "eventfield/",
                &json!({
                    "value": value,
                    "event": format!("/rest/v1/event/{}/", self.event_id),
                    "name": name,
                }),
            )
            .await?;

        let resource_uri = response.location.ok_or_else(|| {
            OsdiError::MalformedResponse("eventfield create response has no Location header".into())
        })?;

        Ok(EventField {
            name: name.to_string(),
            value: value.to_string(),
            resource_uri,
        })
    }

    fn remember(&mut self, record: EventField) {
        match self.records.iter_mut().find(|f| f.name == record.name) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }
}
