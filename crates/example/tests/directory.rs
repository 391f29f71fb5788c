//! The directory client against a local mock server.

use std::sync::Arc;

use example::{DirectoryApi, DirectoryRepository, Settings};
use httpmock::prelude::*;
use serde_json::json;
use tether_endpoint::RunError;
use tether_http::{HttpSession, SessionConfig};

fn connect(server: &MockServer, token: Option<&str>) -> Arc<DirectoryRepository> {
    DirectoryRepository::connect(SessionConfig::new(server.base_url()), token).expect("valid config")
}

fn mock_profile(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/me");
        then.status(200).json_body(json!({ "id": 42, "name": "Ada" }));
    })
}

fn mock_settings<'a>(server: &'a MockServer, theme: &str) -> httpmock::Mock<'a> {
    let theme = theme.to_string();
    server.mock(move |when, then| {
        when.method(GET).path("/users/42/settings");
        then.status(200).json_body(json!({ "theme": theme }));
    })
}

fn dark() -> Settings {
    Settings {
        theme: "dark".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn load_fetches_profile_then_settings() {
    let server = MockServer::start();
    let profile = mock_profile(&server);
    let settings = mock_settings(&server, "light");

    let repository = connect(&server, None);
    let (user, prefs) = repository.load().await.unwrap();

    assert_eq!(user.name, "Ada");
    assert_eq!(prefs.theme, "light");
    profile.assert();
    settings.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn settings_wait_for_profile() {
    let server = MockServer::start();
    let settings = mock_settings(&server, "light");

    let repository = connect(&server, None);

    assert!(repository.settings.fetch().into_task().is_none());
    assert!(repository.settings.needs_get_call());
    assert_eq!(settings.calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn set_theme_puts_settings() {
    let server = MockServer::start();
    mock_profile(&server);
    mock_settings(&server, "light");
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/users/42/settings")
            .json_body(json!({ "theme": "dark" }));
        then.status(204);
    });

    let repository = connect(&server, None);
    repository.load().await.unwrap();
    repository.settings.set(dark()).await.unwrap();

    assert_eq!(repository.settings.latest_value(), Some(dark()));
    update.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_theme_rolls_back() {
    let server = MockServer::start();
    mock_profile(&server);
    mock_settings(&server, "light");
    server.mock(|when, then| {
        when.method(PUT).path("/users/42/settings");
        then.status(500).body("read only");
    });

    let repository = connect(&server, None);
    repository.load().await.unwrap();
    let err = repository.settings.set(dark()).await.unwrap_err();

    assert!(matches!(err, RunError::SetFailed(_)), "got {err:?}");
    assert_eq!(
        repository.settings.latest_value().map(|settings| settings.theme),
        Some("light".to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn all_users_reads_single_page() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/users").query_param("limit", "50");
        then.status(200).json_body(json!({
            "users": [{ "id": 1, "name": "Ada" }, { "id": 2, "name": "Grace" }],
            "total": 2
        }));
    });

    let repository = connect(&server, None);
    let users = repository.all_users().await.unwrap();

    assert_eq!(
        users.iter().map(|user| user.name.as_str()).collect::<Vec<_>>(),
        ["Ada", "Grace"]
    );
    page.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn all_users_follows_cursor_across_pages() {
    let server = MockServer::start();
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/users")
            .query_param("limit", "50")
            .query_param("cursor", "p2");
        then.status(200).json_body(json!({
            "users": [{ "id": 3, "name": "Edsger" }],
            "total": 3
        }));
    });
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/users")
            .query_param("limit", "50")
            .query_param_missing("cursor");
        then.status(200).json_body(json!({
            "users": [{ "id": 1, "name": "Ada" }, { "id": 2, "name": "Grace" }],
            "next": "p2",
            "total": 3
        }));
    });

    let repository = connect(&server, None);
    let users = repository.all_users().await.unwrap();

    assert_eq!(
        users.iter().map(|user| user.id).collect::<Vec<_>>(),
        [1, 2, 3]
    );
    first.assert();
    second.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn set_theme_before_profile_is_refused() {
    let server = MockServer::start();
    let update = server.mock(|when, then| {
        when.method(PUT).path_includes("/settings");
        then.status(204);
    });

    let repository = connect(&server, None);
    let err = repository.settings.set(dark()).await.unwrap_err();

    assert!(matches!(err, RunError::SetFailed(_)), "got {err:?}");
    assert_eq!(repository.settings.latest_value(), None);
    assert_eq!(update.calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn token_is_sent_as_bearer() {
    let server = MockServer::start();
    let profile = server.mock(|when, then| {
        when.method(GET).path("/me").header("authorization", "Bearer t0k3n");
        then.status(200).json_body(json!({ "id": 42, "name": "Ada" }));
    });

    let repository = connect(&server, Some("t0k3n"));
    repository.profile.fetch().into_task().unwrap().await.unwrap();

    profile.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn replacing_interface_refreshes_resources() {
    let server = MockServer::start();
    let profile = mock_profile(&server);
    mock_settings(&server, "light");

    let session = HttpSession::new(SessionConfig::new(server.base_url())).unwrap();
    let repository = DirectoryRepository::new(DirectoryApi::new("first"), session);
    repository.load().await.unwrap();
    assert_eq!(profile.calls(), 1);

    repository.replace_interface(DirectoryApi::new("second"));

    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while profile.calls() < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("profile refetched after interface change");
}
