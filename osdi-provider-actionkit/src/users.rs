//! Resolving an email address to an ActionKit user id.

use std::collections::HashMap;
use std::sync::Arc;

use osdi_core::{OsdiError, OsdiResult};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::info;

use crate::actionkit_event::AkList;
use crate::api::RestClient;

#[derive(Debug, Deserialize)]
struct AkUser {
    id: Value,
}

/// Looks up users by email and creates them when missing.
///
/// ActionKit has no upsert for users, so lookup-then-create would race for
/// two concurrent calls with the same unseen email. Calls for the same
/// email are serialized here; distinct emails proceed in parallel. Another
/// process writing to the same instance can still race.
#[derive(Default)]
pub struct UserDirectory {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ensure_user<C>(&self, client: &C, email: &str) -> OsdiResult<String>
    where
        C: RestClient + ?Sized,
    {
        let key = email.to_lowercase();
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key.clone()).or_default())
        };

        let guard = lock.lock().await;
        let result = find_or_create_user(client, email).await;
        drop(guard);

        // Clones are only taken under the map lock, so a count of two (the
        // map's and ours) means nobody else is waiting on this email.
        let mut locks = self.locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&key);
        }

        result
    }
}

async fn find_or_create_user<C>(client: &C, email: &str) -> OsdiResult<String>
where
    C: RestClient + ?Sized,
{
    if let Some(id) = find_user(client, email).await? {
        return Ok(id);
    }

    let created = client.post("user/", &json!({ "email": email })).await?;
    let id = created.created_id()?;
    info!(user_id = %id, "created ActionKit user");
    Ok(id)
}

async fn find_user<C>(client: &C, email: &str) -> OsdiResult<Option<String>>
where
    C: RestClient + ?Sized,
{
    let response = client.get("user/", &[("email", email.to_string())]).await?;
    let users: AkList<AkUser> = serde_json::from_value(response.body).map_err(|e| {
        OsdiError::MalformedResponse(format!("user listing could not be read: {e}"))
    })?;

    Ok(users.objects.into_iter().next().map(|user| match user.id {
        Value::String(s) => s,
        other => other.to_string(),
    }))
}
