//! Shared test helpers for repository integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tether_endpoint::{EndpointError, FnEndpoint, Interface, Request, RunError};
use tether_repository::{Cancellables, RepositoryCore, Session};

/// A request against the in-memory backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    pub path: String,
    pub body: Option<Value>,
}

impl Request for MockRequest {
    type Response = MockResponse;
}

/// A canned backend response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
}

impl MockResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Value::Null,
        }
    }
}

/// Transport failure of the mock session.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("status {0}")]
    Status(u16),
    #[error("no route for {0}")]
    NoRoute(String),
}

enum Route {
    Respond(MockResponse),
    Hang,
}

/// Session answering from a route table and recording every request.
#[derive(Default)]
pub struct MockSession {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<MockRequest>>,
    cancellables: Cancellables,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, response: MockResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route::Respond(response));
    }

    /// Requests to `path` never complete.
    pub fn hang(&self, path: &str) {
        self.routes.lock().unwrap().insert(path.to_string(), Route::Hang);
    }

    pub fn calls(&self) -> Vec<MockRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Session for MockSession {
    type Request = MockRequest;
    type Error = MockError;

    async fn execute(&self, request: &MockRequest) -> Result<MockResponse, MockError> {
        self.calls.lock().unwrap().push(request.clone());
        let response = match self.routes.lock().unwrap().get(&request.path) {
            Some(Route::Respond(response)) => Some(response.clone()),
            Some(Route::Hang) => None,
            None => return Err(MockError::NoRoute(request.path.clone())),
        };
        let Some(response) = response else {
            futures::future::pending::<()>().await;
            unreachable!("pending never resolves");
        };
        if response.status >= 400 {
            return Err(MockError::Status(response.status));
        }
        Ok(response)
    }

    fn cancellables(&self) -> &Cancellables {
        &self.cancellables
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// Endpoint catalog of the user backend.
pub struct UserApi {
    pub backend: &'static str,
    pub get_user: FnEndpoint<UserApi, u64, User>,
    pub list_users: FnEndpoint<UserApi, (), Vec<User>>,
}

impl Interface for UserApi {
    type Request = MockRequest;
    type Error = RunError;
    type Id = &'static str;

    fn id(&self) -> Self::Id {
        self.backend
    }
}

impl UserApi {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            get_user: get_user_endpoint(),
            list_users: FnEndpoint::new(
                "list_users",
                |_: &(), _ctx| {
                    Ok(MockRequest {
                        path: "/users".to_string(),
                        body: None,
                    })
                },
                |response: MockResponse, _ctx| Ok(serde_json::from_value(response.body)?),
            ),
        }
    }
}

pub fn get_user_endpoint() -> FnEndpoint<UserApi, u64, User> {
    FnEndpoint::new(
        "get_user",
        |id: &u64, _ctx| {
            if *id == 0 {
                return Err(EndpointError::invalid_input("user id must be non-zero"));
            }
            Ok(MockRequest {
                path: format!("/users/{id}"),
                body: None,
            })
        },
        |response: MockResponse, _ctx| Ok(serde_json::from_value(response.body)?),
    )
}

pub fn ada() -> Value {
    json!({ "id": 42, "name": "Ada" })
}

pub fn repository(session: &Arc<MockSession>) -> RepositoryCore<UserApi, MockSession> {
    RepositoryCore::with_shared_session(UserApi::new("primary"), Arc::clone(session))
}
