use osdi_core::{EventContact, EventLocation, StandardEvent, UNKNOWN_EVENT_TYPE};
use tracing::warn;

use super::AkEvent;
use crate::event_fields::EventFields;

pub trait FromActionKit {
    /// Never fails: attributes missing on the ActionKit side are left empty.
    fn from_actionkit(event: &AkEvent, event_url_base: &str) -> Self
    where
        Self: Sized;
}

impl FromActionKit for StandardEvent {
    fn from_actionkit(event: &AkEvent, event_url_base: &str) -> Self {
        let fields = EventFields::new(&event.id, event.fields.clone());

        let location = EventLocation {
            venue: event.venue.clone(),
            address_lines: vec![event.address1.clone(), event.address2.clone()],
            locality: event.city.clone(),
            region: event.state.clone(),
            postal_code: event.zip.clone(),
            location: match (event.latitude, event.longitude) {
                (Some(lat), Some(lon)) => Some([lat, lon]),
                _ => None,
            },
            time_zone: None,
        };

        let event_type = fields
            .get("type")
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_EVENT_TYPE)
            .to_string();

        let contact = EventContact {
            email_address: fields.get("contact_email_address").map(String::from),
            phone_number: fields.get("contact_phone_number").map(String::from),
            name: fields.get("contact_name").map(String::from),
        };

        StandardEvent {
            id: Some(event.id.clone()),
            identifiers: vec![format!("actionkit:{}", event.id)],
            capacity: event.max_attendees,
            location: Some(location),
            browser_url: Some(format!("{}/{}", event_url_base, event.id)),
            name: event.title.as_deref().map(slugify_title),
            title: event.title.clone(),
            start_date: event.starts_at.clone(),
            end_date: event.ends_at.clone(),
            description: event.public_description.clone(),
            instructions: event.directions.clone(),
            organizer_id: event.creator.as_deref().and_then(organizer_from_creator),
            status: Some(event.status.to_osdi(event.is_approved)),
            event_type: Some(event_type),
            tags: Some(decode_tags(&event.id, fields.get("tags"))),
            contact: Some(contact),
        }
    }
}

/// "Block Party Downtown" -> "block-party-downtown"
fn slugify_title(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// The user id is the 5th segment of `/rest/v1/user/{id}/`.
fn organizer_from_creator(creator: &str) -> Option<String> {
    creator
        .split('/')
        .nth(4)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

fn decode_tags(event_id: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => tags,
        Err(e) => {
            warn!(event_id, error = %e, "ignoring undecodable tags field");
            Vec::new()
        }
    }
}
