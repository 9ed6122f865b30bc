use std::str::FromStr;

use chrono_tz::Tz;
use osdi_core::{OsdiResult, StandardEvent};
use tracing::warn;

use super::{AkAttributes, AkEvent, AkStatus, FIELD_PREFIX};
use crate::timezone::{TimezoneLookup, to_ak_datetime};

/// ActionKit event `country` for every event this adaptor writes.
const DEFAULT_COUNTRY: &str = "United States";

/// What the outbound mapping needs besides the event itself.
pub struct OutboundContext<'a> {
    /// Current ActionKit record, when editing. Supplies the postal code if
    /// the edits leave `location` out.
    pub previous: Option<&'a AkEvent>,
    /// Campaign id every created/edited event is attached to
    pub default_campaign: &'a str,
    pub timezones: &'a dyn TimezoneLookup,
}

pub trait ToActionKit {
    fn to_actionkit(&self, ctx: &OutboundContext<'_>) -> OsdiResult<AkAttributes>;
}

impl ToActionKit for StandardEvent {
    fn to_actionkit(&self, ctx: &OutboundContext<'_>) -> OsdiResult<AkAttributes> {
        let location = self.location.as_ref();
        let time_zone = resolve_time_zone(self, ctx);
        let (status, is_approved) = match self.status.map(AkStatus::from_osdi) {
            Some((status, approved)) => (Some(status.as_str()), Some(approved)),
            None => (None, None),
        };

        let mut attrs = AkAttributes::new();

        attrs.set("address1", location.and_then(|l| l.address_line(0)));
        attrs.set("address2", location.and_then(|l| l.address_line(1)));
        attrs.set("city", location.and_then(|l| l.locality.clone()));
        attrs.set("state", location.and_then(|l| l.region.clone()));
        attrs.set("venue", location.and_then(|l| l.venue.clone()));
        attrs.set("zip", location.and_then(|l| l.postal_code.clone()));
        attrs.set("country", Some(DEFAULT_COUNTRY));

        attrs.set("title", self.title.clone());
        attrs.set("public_description", self.description.clone());
        attrs.set("directions", self.instructions.clone());
        attrs.set("max_attendees", self.capacity);
        attrs.set("status", status);
        attrs.set("is_approved", is_approved);
        attrs.set("host_is_confirmed", Some(true));
        attrs.set(
            "creator",
            self.organizer_id
                .as_ref()
                .map(|id| format!("/rest/v1/user/{id}/")),
        );
        attrs.set(
            "campaign",
            Some(format!("/rest/v1/campaign/{}/", ctx.default_campaign)),
        );

        attrs.set(
            "starts_at",
            self.start_date
                .as_deref()
                .map(|d| to_ak_datetime(d, time_zone))
                .transpose()?,
        );
        attrs.set(
            "ends_at",
            self.end_date
                .as_deref()
                .map(|d| to_ak_datetime(d, time_zone))
                .transpose()?,
        );

        let contact = self.contact.as_ref();
        let tags = self.tags.as_ref().map(serde_json::to_string).transpose()?;

        set_field(&mut attrs, "tags", tags);
        set_field(&mut attrs, "type", self.event_type.clone());
        set_field(
            &mut attrs,
            "contact_email_address",
            contact.and_then(|c| c.email_address.clone()),
        );
        set_field(
            &mut attrs,
            "contact_phone_number",
            contact.and_then(|c| c.phone_number.clone()),
        );
        set_field(&mut attrs, "contact_name", contact.and_then(|c| c.name.clone()));

        Ok(attrs)
    }
}

fn set_field(attrs: &mut AkAttributes, name: &str, value: Option<String>) {
    attrs.set(&format!("{FIELD_PREFIX}{name}"), value);
}

/// Caller-supplied `location.time_zone` wins; otherwise look the zone up
/// from the new postal code, falling back to the one already on the event.
fn resolve_time_zone(event: &StandardEvent, ctx: &OutboundContext<'_>) -> Option<Tz> {
    let location = event.location.as_ref();

    if let Some(name) = location.and_then(|l| l.time_zone.as_deref()) {
        match Tz::from_str(name) {
            Ok(tz) => return Some(tz),
            Err(_) => warn!(time_zone = name, "unknown time zone, using postal code instead"),
        }
    }

    let postal_code = location
        .and_then(|l| l.postal_code.as_deref())
        .or_else(|| ctx.previous.and_then(|p| p.zip.as_deref()))?;

    ctx.timezones.lookup(postal_code)
}
