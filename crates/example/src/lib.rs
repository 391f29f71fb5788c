//! Example directory client built with Tether.
//!
//! Talks to a small user-directory HTTP API:
//!
//! ```text
//! GET  /me                     -> Profile
//! GET  /users/{id}/settings    -> Settings
//! PUT  /users/{id}/settings    <- Settings
//! GET  /users?cursor=&limit=   -> { "users": [Profile], "next": cursor? }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  DirectoryRepository                         │
//! │                                              │
//! │  profile ──(depends on)──▶ settings          │
//! │     │                         │              │
//! │     ▼                         ▼              │
//! │  DirectoryApi endpoints ──▶ HttpSession      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! `settings` cannot be fetched until `profile` holds a value, because its URL
//! contains the profile's id. Replacing the interface (e.g. after a token
//! refresh) makes both resources fetch again.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_endpoint::{EndpointError, FnEndpoint, Interface, PaginatedResponse, PartialList, RunError};
use tether_http::{HttpError, HttpRequest, HttpResponse, HttpSession, Method, SessionConfig, bearer_auth, get_json, send_json};
use tether_repository::{Cancellables, ChangeNotifier, Repository, RepositoryCore};
use tether_resource::{Dependency, Fetch, GetCall, ResourceAccessor, ResourceError, ResourceStatus, SetCall};

/// Page size used by [`DirectoryRepository::all_users`].
pub const PAGE_SIZE: u32 = 50;

const SETTLE_POLL: Duration = Duration::from_millis(5);

/// A directory user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User id.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Per-user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// UI theme name.
    pub theme: String,
}

/// Settings addressed to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsUpdate {
    /// Target user.
    #[serde(skip)]
    pub user_id: u64,
    /// New settings.
    #[serde(flatten)]
    pub settings: Settings,
}

/// Page request for the user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Cursor returned by the previous page.
    pub cursor: Option<String>,
    /// Maximum number of users to return.
    pub limit: u32,
}

/// Wire shape of one page of users.
#[derive(Debug, Deserialize)]
struct UsersPage {
    users: Vec<Profile>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    total: Option<u64>,
}

impl PaginatedResponse for UsersPage {
    type Item = Profile;

    fn convert(self) -> Result<PartialList<Profile>, EndpointError> {
        if self.next.as_deref() == Some("") {
            return Err(EndpointError::invalid_response("empty next cursor"));
        }
        Ok(PartialList {
            items: self.users,
            next_cursor: self.next,
            total: self.total,
        })
    }
}

/// The directory API.
#[derive(Debug, Clone)]
pub struct DirectoryApi {
    label: &'static str,
    /// `GET /me`.
    pub me: FnEndpoint<DirectoryApi, (), Profile>,
    /// `GET /users/{id}/settings`.
    pub settings: FnEndpoint<DirectoryApi, u64, Settings>,
    /// `PUT /users/{id}/settings`.
    pub update_settings: FnEndpoint<DirectoryApi, SettingsUpdate, ()>,
    /// `GET /users`, one page at a time.
    pub list_users: FnEndpoint<DirectoryApi, Page, PartialList<Profile>>,
}

impl Interface for DirectoryApi {
    type Request = HttpRequest;
    type Error = RunError;
    type Id = &'static str;

    fn id(&self) -> Self::Id {
        self.label
    }
}

impl DirectoryApi {
    /// Declares the endpoints. `label` identifies this interface instance.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            me: get_json("me", |_: &()| "/me".to_string()),
            settings: get_json("settings", |id: &u64| format!("/users/{id}/settings")),
            update_settings: send_json("update_settings", Method::PUT, |update: &SettingsUpdate| {
                format!("/users/{}/settings", update.user_id)
            }),
            list_users: FnEndpoint::new(
                "list_users",
                |page: &Page, _ctx| {
                    let mut request = HttpRequest::get("/users").query("limit", page.limit);
                    if let Some(cursor) = &page.cursor {
                        request = request.query("cursor", cursor);
                    }
                    Ok(request)
                },
                |response: HttpResponse, _ctx| response.json::<UsersPage>()?.convert(),
            ),
        }
    }

    /// Authenticates every endpoint with `token`.
    #[must_use]
    pub fn with_token(self, token: &str) -> Self {
        bearer_auth(&self.me, token);
        bearer_auth(&self.settings, token);
        bearer_auth(&self.update_settings, token);
        bearer_auth(&self.list_users, token);
        self
    }
}

/// The directory API bound to an HTTP session, with cached resources.
#[derive(Debug)]
pub struct DirectoryRepository {
    core: RepositoryCore<DirectoryApi, HttpSession>,
    /// The signed-in user.
    pub profile: ResourceAccessor<DirectoryRepository, Profile>,
    /// The signed-in user's settings. Fetching and writing both depend on
    /// `profile`.
    pub settings: ResourceAccessor<DirectoryRepository, Settings>,
}

impl Repository for DirectoryRepository {
    type Interface = DirectoryApi;
    type Session = HttpSession;

    fn interface(&self) -> Arc<DirectoryApi> {
        self.core.interface()
    }

    fn session(&self) -> Arc<HttpSession> {
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
    /// Creates the repository and binds its resources.
    pub fn new(api: DirectoryApi, session: HttpSession) -> Arc<Self> {
        let profile = ResourceAccessor::new(
            "profile",
            GetCall::<DirectoryRepository, Profile>::new(|api| &api.me),
        );
        let settings = ResourceAccessor::builder(
            "settings",
            GetCall::<DirectoryRepository, Settings>::from_parts(
                |api| &api.settings,
                |repository| repository.profile.latest_value().map(|profile| (profile.id, ())),
            ),
        )
        .depends_on(Dependency::on(|repository: &DirectoryRepository| &repository.profile))
        .set_depends_on(Dependency::when("profile", |repository: &DirectoryRepository| {
            repository.profile.has_value()
        }))
        .setter(SetCall::<DirectoryRepository, Settings>::from_parts(
            |api| &api.update_settings,
            |repository, settings| {
                repository.profile.latest_value().map(|profile| {
                    let update = SettingsUpdate {
                        user_id: profile.id,
                        settings: settings.clone(),
                    };
                    (update, ())
                })
            },
        ))
        .build();

        let repository = Arc::new(Self {
            core: RepositoryCore::new(api, session),
            profile,
            settings,
        });
        repository.profile.bind(&repository);
        repository.settings.bind(&repository);
        repository
    }

    /// Creates the repository from a session configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP session cannot be created.
    pub fn connect(config: SessionConfig, token: Option<&str>) -> Result<Arc<Self>, HttpError> {
        let mut api = DirectoryApi::new("directory");
        if let Some(token) = token {
            api = api.with_token(token);
        }
        Ok(Self::new(api, HttpSession::new(config)?))
    }

    /// Swaps the interface, e.g. to change credentials. Bound resources
    /// refetch.
    pub fn replace_interface(&self, api: DirectoryApi) {
        self.core.set_interface(api);
    }

    /// Returns the profile and the settings that depend on it, fetching
    /// whichever is not cached yet.
    ///
    /// # Errors
    ///
    /// Returns the first failing get call.
    pub async fn load(&self) -> Result<(Profile, Settings), RunError> {
        let profile = settled(&self.profile).await?;
        // Holding a profile triggers the settings fetch on its own.
        let settings = settled(&self.settings).await?;
        Ok((profile, settings))
    }

    /// Walks every page of the user listing.
    ///
    /// # Errors
    ///
    /// Returns the first failing page request.
    pub async fn all_users(&self) -> Result<Vec<Profile>, RunError> {
        let mut users = Vec::new();
        let mut cursor = None;
        loop {
            let page = Page {
                cursor,
                limit: PAGE_SIZE,
            };
            let list = self.call(|api| &api.list_users, page).await?;
            tracing::debug!(count = list.items.len(), total = ?list.total, "fetched user page");
            let last = list.is_last_page();
            cursor = list.next_cursor;
            users.extend(list.items);
            if last {
                return Ok(users);
            }
        }
    }
}

/// Waits for `accessor` to hold a current value, starting a get call if none
/// is running.
///
/// An unmet dependency fails with [`RunError::MissingInput`]; an accessor
/// without a live repository with [`RunError::Unavailable`].
async fn settled<V>(accessor: &ResourceAccessor<DirectoryRepository, V>) -> Result<V, RunError>
where
    V: Clone + Send + Sync + 'static,
{
    loop {
        if accessor.status() == ResourceStatus::Fetching {
            tokio::time::sleep(SETTLE_POLL).await;
            continue;
        }
        if !accessor.needs_get_call()
            && let Some(value) = accessor.latest_value()
        {
            return Ok(value);
        }
        match accessor.fetch() {
            Fetch::Started(task) => return task.await,
            Fetch::InFlight => tokio::time::sleep(SETTLE_POLL).await,
            Fetch::Blocked => return Err(RunError::MissingInput),
            Fetch::Detached => {
                return Err(RunError::Unavailable(Box::new(ResourceError::detached(accessor.name()))));
            }
        }
    }
}
