//! osdi-provider-actionkit - ActionKit adaptor for OSDI events
//!
//! Translates between OSDI `StandardEvent`s and ActionKit event records,
//! whose custom attributes live in separate `eventfield` resources.
//!
//! ```no_run
//! # async fn run() -> osdi_core::OsdiResult<()> {
//! use osdi_provider_actionkit::{ActionKitConfig, ActionKitEvents};
//!
//! let config = ActionKitConfig::from_env()?;
//! let events = ActionKitEvents::from_config(&config)?;
//! let first_page = events.find_all(0).await?;
//! # Ok(())
//! # }
//! ```

pub mod actionkit_event;
pub mod api;
pub mod cache;
pub mod config;
pub mod event_fields;
pub mod events;
pub mod timezone;
pub mod users;

pub use api::{ActionKitClient, RestClient, RestResponse};
pub use cache::PageCache;
pub use config::ActionKitConfig;
pub use event_fields::EventFields;
pub use events::{ActionKitEvents, PAGE_SIZE};
pub use timezone::{TimezoneLookup, ZipPrefixTimezones};
