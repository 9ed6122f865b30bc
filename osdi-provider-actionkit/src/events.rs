//! OSDI event operations backed by ActionKit.
//!
//! Every operation reads ActionKit records fresh and maps them to
//! `StandardEvent` on the way out, except `find_all`, which goes through the
//! page cache. Writes reconcile event fields before reading the event back,
//! so callers always get the persisted view rather than their own input.

use std::sync::Arc;

use osdi_core::{OsdiError, OsdiResult, StandardEvent};
use tracing::{debug, info, instrument};

use crate::actionkit_event::{AkEvent, AkList, FromActionKit, OutboundContext, ToActionKit};
use crate::api::{ActionKitClient, RestClient};
use crate::cache::{PageCache, page_key};
use crate::config::ActionKitConfig;
use crate::event_fields::EventFields;
use crate::timezone::{TimezoneLookup, ZipPrefixTimezones};
use crate::users::UserDirectory;

/// Events per `find_all` page.
pub const PAGE_SIZE: u32 = 100;

const CACHE_NAMESPACE: &str = "ak-event";

pub struct ActionKitEvents<C> {
    client: Arc<C>,
    event_url_base: String,
    default_campaign: String,
    timezones: Arc<dyn TimezoneLookup>,
    cache: PageCache<Vec<StandardEvent>>,
    users: UserDirectory,
}

impl ActionKitEvents<ActionKitClient> {
    pub fn from_config(config: &ActionKitConfig) -> OsdiResult<Self> {
        Ok(Self::new(ActionKitClient::new(config)?, config))
    }
}

impl<C> ActionKitEvents<C>
where
    C: RestClient + 'static,
{
    pub fn new(client: C, config: &ActionKitConfig) -> Self {
        Self {
            client: Arc::new(client),
            event_url_base: config.event_url_base.trim_end_matches('/').to_string(),
            default_campaign: config.default_campaign.clone(),
            timezones: Arc::new(ZipPrefixTimezones),
            cache: PageCache::new(),
            users: UserDirectory::new(),
        }
    }

    pub fn with_timezones(mut self, timezones: impl TimezoneLookup + 'static) -> Self {
        self.timezones = Arc::new(timezones);
        self
    }

    pub fn with_cache(mut self, cache: PageCache<Vec<StandardEvent>>) -> Self {
        self.cache = cache;
        self
    }

    /// The listing cache, for callers that need to invalidate pages.
    pub fn cache(&self) -> &PageCache<Vec<StandardEvent>> {
        &self.cache
    }

    /// Total number of events in ActionKit.
    #[instrument(skip(self))]
    pub async fn count(&self) -> OsdiResult<u64> {
        let response = self.client.get("event/", &[]).await?;

        response.body["meta"]["total_count"].as_u64().ok_or_else(|| {
            OsdiError::MalformedResponse("event listing has no meta.total_count".into())
        })
    }

    /// One page (0-indexed) of events, served from the page cache.
    #[instrument(skip(self))]
    pub async fn find_all(&self, page: u32) -> OsdiResult<Vec<StandardEvent>> {
        let key = page_key(CACHE_NAMESPACE, page);
        let client = Arc::clone(&self.client);
        let event_url_base = self.event_url_base.clone();

        let fetch = async move { fetch_page(client.as_ref(), page, &event_url_base).await };

        self.cache.fetch_and_update(&key, fetch).await
    }

    #[instrument(skip(self))]
    pub async fn one(&self, id: &str) -> OsdiResult<StandardEvent> {
        let event = self.fetch_event(id).await?;
        Ok(StandardEvent::from_actionkit(&event, &self.event_url_base))
    }

    /// Create an event and its fields, returning it as ActionKit stored it.
    ///
    /// The organizer is resolved (or created) from `contact.email_address`.
    #[instrument(skip(self, event), fields(title = event.title.as_deref()))]
    pub async fn create(&self, mut event: StandardEvent) -> OsdiResult<StandardEvent> {
        if let Some(email) = event.contact.as_ref().and_then(|c| c.email_address.clone()) {
            let organizer_id = self.users.ensure_user(self.client.as_ref(), &email).await?;
            event.organizer_id = Some(organizer_id);
        }

        let attrs = event.to_actionkit(&self.outbound(None))?;

        let created = self.client.post("event/", &attrs.core()).await?;
        let id = created.created_id()?;
        info!(event_id = %id, "created ActionKit event");

        let mut fields = EventFields::empty(&id);
        fields
            .set_all(self.client.as_ref(), &attrs.field_entries())
            .await?;

        self.one(&id).await
    }

    /// Apply partial `edits` to an event, returning the updated event.
    #[instrument(skip(self, edits))]
    pub async fn edit(&self, id: &str, edits: StandardEvent) -> OsdiResult<StandardEvent> {
        let original = self.fetch_event(id).await?;
        let attrs = edits.to_actionkit(&self.outbound(Some(&original)))?;

        let field_entries = attrs.field_entries();
        debug!(event_id = id, fields = field_entries.len(), "reconciling event fields");

        let mut fields = EventFields::new(&original.id, original.fields.clone());
        fields.set_all(self.client.as_ref(), &field_entries).await?;

        self.client
            .put(&format!("event/{id}/"), Some(&attrs.core()))
            .await?;

        self.one(id).await
    }

    /// Soft-delete through ActionKit's delete endpoint; the record remains.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> OsdiResult<()> {
        self.client.put(&format!("delete/{id}/"), None).await?;
        info!(event_id = id, "deleted ActionKit event");
        Ok(())
    }

    async fn fetch_event(&self, id: &str) -> OsdiResult<AkEvent> {
        let response = self.client.get(&format!("event/{id}/"), &[]).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    fn outbound<'a>(&'a self, previous: Option<&'a AkEvent>) -> OutboundContext<'a> {
        OutboundContext {
            previous,
            default_campaign: &self.default_campaign,
            timezones: self.timezones.as_ref(),
        }
    }
}

async fn fetch_page<C>(client: &C, page: u32, event_url_base: &str) -> OsdiResult<Vec<StandardEvent>>
where
    C: RestClient + ?Sized,
{
    let offset = u64::from(page) * u64::from(PAGE_SIZE);
    let response = client
        .get(
            "event/",
            &[
                ("_offset", offset.to_string()),
                ("_limit", PAGE_SIZE.to_string()),
            ],
        )
        .await?;

    let listing: AkList<AkEvent> = serde_json::from_value(response.body)?;
    debug!(page, count = listing.objects.len(), "fetched event page");

    Ok(listing
        .objects
        .iter()
        .map(|event| StandardEvent::from_actionkit(event, event_url_base))
        .collect())
}
