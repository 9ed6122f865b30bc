//! In-memory stand-in for the ActionKit REST resources the adaptor uses:
//! `event`, `eventfield`, `user` and the soft-delete endpoint.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use osdi_core::{OsdiError, OsdiResult};
use osdi_provider_actionkit::{ActionKitConfig, RestClient, RestResponse};
use serde_json::{Map, Value, json};

pub fn test_config() -> ActionKitConfig {
    ActionKitConfig {
        base_url: "https://act.example.org".to_string(),
        username: "ak".to_string(),
        password: "secret".to_string(),
        event_url_base: "https://act.example.org/event/local".to_string(),
        default_campaign: "7".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct StoredField {
    event_id: u64,
    name: String,
    value: String,
}

#[derive(Default)]
struct State {
    last_id: u64,
    events: BTreeMap<u64, Map<String, Value>>,
    fields: BTreeMap<u64, StoredField>,
    users: BTreeMap<u64, String>,
    requests: Vec<Recorded>,
    failing: Option<(&'static str, String)>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn event_json(&self, id: u64) -> Option<Value> {
        let mut event = self.events.get(&id)?.clone();
        let fields: Vec<Value> = self
            .fields
            .iter()
            .filter(|(_, f)| f.event_id == id)
            .map(|(fid, f)| {
                json!({
                    "name": f.name,
                    "value": f.value,
                    "resource_uri": format!("/rest/v1/eventfield/{fid}/"),
                })
            })
            .collect();

        event.insert("id".to_string(), json!(id));
        event.insert("resource_uri".to_string(), json!(format!("/rest/v1/event/{id}/")));
        event.insert("fields".to_string(), Value::Array(fields));
        Some(Value::Object(event))
    }
}

/// Clones share the same store, so a test can keep one while the adaptor
/// owns another.
#[derive(Clone, Default)]
pub struct FakeActionKit {
    state: Arc<Mutex<State>>,
}

impl FakeActionKit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an event directly, as if created in the ActionKit admin.
    pub fn insert_event(&self, attrs: Value) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let attrs = attrs.as_object().cloned().unwrap_or_default();
        state.events.insert(id, attrs);
        id
    }

    pub fn insert_field(&self, event_id: u64, name: &str, value: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.fields.insert(
            id,
            StoredField {
                event_id,
                name: name.to_string(),
                value: value.to_string(),
            },
        );
        id
    }

    pub fn insert_user(&self, email: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.users.insert(id, email.to_string());
        id
    }

    /// Make every `method` request to `path` fail with a 500.
    pub fn fail_on(&self, method: &'static str, path: &str) {
        self.state.lock().unwrap().failing = Some((method, path.to_string()));
    }

    pub fn event(&self, id: u64) -> Map<String, Value> {
        self.state.lock().unwrap().events[&id].clone()
    }

    /// `(name, value)` of every field record of the event, in creation order.
    pub fn fields_of(&self, event_id: u64) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .fields
            .values()
            .filter(|f| f.event_id == event_id)
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    pub fn users(&self) -> Vec<String> {
        self.state.lock().unwrap().users.values().cloned().collect()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn record(&self, method: &'static str, path: &str, body: Value) -> OsdiResult<String> {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        state.requests.push(Recorded {
            method,
            path: path.clone(),
            body,
        });

        if state.failing.as_ref() == Some(&(method, path.clone())) {
            return Err(OsdiError::Upstream {
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(path)
    }
}

fn normalize(path: &str) -> String {
    let path = path.strip_prefix("/rest/v1/").unwrap_or(path);
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// `event/12/` -> `("event", Some(12))`
fn route(path: &str) -> (&str, Option<u64>) {
    let mut parts = path.trim_end_matches('/').split('/');
    let resource = parts.next().unwrap_or_default();
    let id = parts.next().and_then(|p| p.parse().ok());
    (resource, id)
}

fn not_found(path: &str) -> OsdiError {
    OsdiError::Upstream {
        status: 404,
        body: format!("no resource at {path}"),
    }
}

fn ok(status: u16, body: Value, location: Option<String>) -> OsdiResult<RestResponse> {
    Ok(RestResponse {
        status,
        body,
        location,
    })
}

fn query_value<'a>(query: &'a [(&str, String)], key: &str) -> Option<&'a str> {
    query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
}

#[async_trait]
impl RestClient for FakeActionKit {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> OsdiResult<RestResponse> {
        let path = self.record("GET", path, json!(query_pairs(query)))?;
        let state = self.state.lock().unwrap();

        match route(&path) {
            ("event", None) => {
                let offset: usize = query_value(query, "_offset")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let limit: usize = query_value(query, "_limit")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20);
                let objects: Vec<Value> = state
                    .events
                    .keys()
                    .skip(offset)
                    .take(limit)
                    .filter_map(|id| state.event_json(*id))
                    .collect();
                ok(
                    200,
                    json!({"meta": {"total_count": state.events.len()}, "objects": objects}),
                    None,
                )
            }
            ("event", Some(id)) => {
                let event = state.event_json(id).ok_or_else(|| not_found(&path))?;
                ok(200, event, None)
            }
            ("user", None) => {
                let email = query_value(query, "email").unwrap_or_default();
                let objects: Vec<Value> = state
                    .users
                    .iter()
                    .filter(|(_, e)| e.as_str() == email)
                    .map(|(id, e)| json!({"id": id, "email": e}))
                    .collect();
                ok(
                    200,
                    json!({"meta": {"total_count": objects.len()}, "objects": objects}),
                    None,
                )
            }
            _ => Err(not_found(&path)),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> OsdiResult<RestResponse> {
        let path = self.record("POST", path, body.clone())?;
        let mut state = self.state.lock().unwrap();

        match route(&path) {
            ("event", None) => {
                let id = state.next_id();
                let mut attrs = body.as_object().cloned().unwrap_or_default();
                attrs.entry("status").or_insert(json!("active"));
                state.events.insert(id, attrs);
                ok(201, Value::Null, Some(format!("/rest/v1/event/{id}/")))
            }
            ("eventfield", None) => {
                let event_uri = body["event"].as_str().unwrap_or_default();
                let event_id = route(&normalize(event_uri))
                    .1
                    .filter(|id| state.events.contains_key(id))
                    .ok_or_else(|| OsdiError::Upstream {
                        status: 400,
                        body: format!("unknown event {event_uri}"),
                    })?;
                let id = state.next_id();
                state.fields.insert(
                    id,
                    StoredField {
                        event_id,
                        name: body["name"].as_str().unwrap_or_default().to_string(),
                        value: body["value"].as_str().unwrap_or_default().to_string(),
                    },
                );
                ok(201, Value::Null, Some(format!("/rest/v1/eventfield/{id}/")))
            }
            ("user", None) => {
                let id = state.next_id();
                let email = body["email"].as_str().unwrap_or_default().to_string();
                state.users.insert(id, email);
                ok(201, Value::Null, Some(format!("/rest/v1/user/{id}/")))
            }
            _ => Err(not_found(&path)),
        }
    }

    async fn put(&self, path: &str, body: Option<&Value>) -> OsdiResult<RestResponse> {
        let body = body.cloned().unwrap_or(Value::Null);
        let path = self.record("PUT", path, body.clone())?;
        let mut state = self.state.lock().unwrap();

        match route(&path) {
            ("event", Some(id)) => {
                let event = state.events.get_mut(&id).ok_or_else(|| not_found(&path))?;
                if let Value::Object(attrs) = body {
                    event.extend(attrs);
                }
                ok(204, Value::Null, None)
            }
            ("eventfield", Some(id)) => {
                let field = state.fields.get_mut(&id).ok_or_else(|| not_found(&path))?;
                field.value = body["value"].as_str().unwrap_or_default().to_string();
                ok(204, Value::Null, None)
            }
            ("delete", Some(id)) => {
                let event = state.events.get_mut(&id).ok_or_else(|| not_found(&path))?;
                event.insert("status".to_string(), json!("deleted"));
                ok(204, Value::Null, None)
            }
            _ => Err(not_found(&path)),
        }
    }
}

fn query_pairs(query: &[(&str, String)]) -> Map<String, Value> {
    query
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect()
}
