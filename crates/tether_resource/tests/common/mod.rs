//! Shared fixtures for resource integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tether_endpoint::{FnEndpoint, Interface, Request, RunError};
use tether_repository::{Cancellables, ChangeNotifier, Repository, RepositoryCore, Session};
use tether_resource::{Dependency, GetCall, ResourceAccessor, SetCall};

#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

impl Request for MockRequest {
    type Response = Value;
}

#[derive(Debug, thiserror::Error)]
#[error("status {0}")]
pub struct StatusError(pub u16);

#[derive(Clone)]
enum Route {
    Respond(Value),
    Fail(u16),
    Hang,
    Gated(Arc<Notify>, Result<Value, u16>),
}

/// Session answering from a mutable route table keyed by `"METHOD path"`.
#[derive(Default)]
pub struct MockSession {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<MockRequest>>,
    cancellables: Cancellables,
}

impl MockSession {
    pub fn respond(&self, method: &str, path: &str, body: Value) {
        self.route(method, path, Route::Respond(body));
    }

    pub fn fail(&self, method: &str, path: &str, status: u16) {
        self.route(method, path, Route::Fail(status));
    }

    pub fn hang(&self, method: &str, path: &str) {
        self.route(method, path, Route::Hang);
    }

    /// Answers with `body` once the returned gate is notified.
    pub fn gate(&self, method: &str, path: &str, body: Value) -> Arc<Notify> {
        self.gated(method, path, Ok(body))
    }

    /// Fails with `status` once the returned gate is notified.
    pub fn gate_failure(&self, method: &str, path: &str, status: u16) -> Arc<Notify> {
        self.gated(method, path, Err(status))
    }

    fn gated(&self, method: &str, path: &str, outcome: Result<Value, u16>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.route(method, path, Route::Gated(Arc::clone(&gate), outcome));
        gate
    }

    fn route(&self, method: &str, path: &str, route: Route) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), route);
    }

    pub fn calls_to(&self, method: &str, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    pub fn last_body(&self, method: &str, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|call| call.method == method && call.path == path)
            .and_then(|call| call.body.clone())
    }
}

#[async_trait]
impl Session for MockSession {
    type Request = MockRequest;
    type Error = StatusError;

    async fn execute(&self, request: &MockRequest) -> Result<Value, StatusError> {
        self.calls.lock().unwrap().push(request.clone());
        let key = format!("{} {}", request.method, request.path);
        let route = self.routes.lock().unwrap().get(&key).cloned();
        match route {
            Some(Route::Respond(body)) => Ok(body),
            Some(Route::Fail(status)) => Err(StatusError(status)),
            Some(Route::Hang) => futures::future::pending().await,
            Some(Route::Gated(gate, outcome)) => {
                gate.notified().await;
                outcome.map_err(StatusError)
            }
            None => Err(StatusError(404)),
        }
    }

    fn cancellables(&self) -> &Cancellables {
        &self.cancellables
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: String,
}

pub struct DirectoryApi {
    pub backend: &'static str,
    pub profile: FnEndpoint<DirectoryApi, (), Profile>,
    pub settings: FnEndpoint<DirectoryApi, u64, Settings>,
    pub update_settings: FnEndpoint<DirectoryApi, Settings, Value>,
}

impl Interface for DirectoryApi {
    type Request = MockRequest;
    type Error = RunError;
    type Id = &'static str;

    fn id(&self) -> Self::Id {
        self.backend
    }
}

impl DirectoryApi {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            profile: FnEndpoint::new(
                "profile",
                |_: &(), _ctx| Ok(get("/me")),
                |body: Value, _ctx| Ok(serde_json::from_value(body)?),
            ),
            settings: FnEndpoint::new(
                "settings",
                |id: &u64, _ctx| Ok(get(&format!("/users/{id}/settings"))),
                |body: Value, _ctx| Ok(serde_json::from_value(body)?),
            ),
            update_settings: FnEndpoint::new(
                "update_settings",
                |settings: &Settings, _ctx| {
                    Ok(MockRequest {
                        method: "PUT",
                        path: "/settings".to_string(),
                        body: Some(serde_json::to_value(settings)?),
                    })
                },
                |body: Value, _ctx| Ok(body),
            ),
        }
    }
}

fn get(path: &str) -> MockRequest {
    MockRequest {
        method: "GET",
        path: path.to_string(),
        body: None,
    }
}

/// A repository with a `profile` resource and a `settings` resource that
/// depends on it.
pub struct DirectoryRepository {
    pub core: RepositoryCore<DirectoryApi, MockSession>,
    pub profile: ResourceAccessor<DirectoryRepository, Profile>,
    pub settings: ResourceAccessor<DirectoryRepository, Settings>,
}

impl Repository for DirectoryRepository {
    type Interface = DirectoryApi;
    type Session = MockSession;

    fn interface(&self) -> Arc<DirectoryApi> {
        self.core.interface()
    }

    fn session(&self) -> Arc<MockSession> {
        self.core.session()
    }

    fn changes(&self) -> &ChangeNotifier {
        self.core.changes()
    }

    fn cancellables(&self) -> &Cancellables {
        self.core.cancellables()
    }
}

impl DirectoryRepository {
    /// Creates the repository without binding its resources.
    pub fn unbound(session: &Arc<MockSession>) -> Arc<Self> {
        let profile = ResourceAccessor::new(
            "profile",
            GetCall::<DirectoryRepository, Profile>::new(|api| &api.profile),
        );
        let settings = ResourceAccessor::builder(
            "settings",
            GetCall::<DirectoryRepository, Settings>::from_parts(
                |api| &api.settings,
                |repository| repository.profile.latest_value().map(|p| (p.id, ())),
            ),
        )
        .depends_on(Dependency::on(|repository: &DirectoryRepository| &repository.profile))
        .set_depends_on(Dependency::when("signed in", |repository: &DirectoryRepository| {
            repository.profile.has_value()
        }))
        .setter(SetCall::<DirectoryRepository, Settings>::new(|api| &api.update_settings))
        .build();

        Arc::new(Self {
            core: RepositoryCore::with_shared_session(DirectoryApi::new("primary"), Arc::clone(session)),
            profile,
            settings,
        })
    }

    pub fn new(session: &Arc<MockSession>) -> Arc<Self> {
        let repository = Self::unbound(session);
        repository.profile.bind(&repository);
        repository.settings.bind(&repository);
        repository
    }
}

pub fn ada() -> Value {
    json!({ "id": 42, "name": "Ada" })
}

pub fn dark() -> Value {
    json!({ "theme": "dark" })
}

/// Waits until `condition` holds, yielding to spawned tasks in between.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
