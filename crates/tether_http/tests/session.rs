//! `HttpSession` against a local mock server.

use std::sync::Arc;

use httpmock::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tether_endpoint::{FnEndpoint, Interface, RunError};
use tether_http::{HttpRequest, HttpResponse, HttpSession, SessionConfig, bearer_auth, get_json, send_json};
use tether_repository::{Repository, RepositoryCore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Book {
    id: u64,
    title: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Shelf {
    books: Vec<Book>,
}

struct LibraryApi {
    book: FnEndpoint<LibraryApi, u64, Book>,
    save_book: FnEndpoint<LibraryApi, Book, ()>,
    search: FnEndpoint<LibraryApi, String, Shelf>,
}

impl Interface for LibraryApi {
    type Request = HttpRequest;
    type Error = RunError;
    type Id = &'static str;

    fn id(&self) -> Self::Id {
        "library"
    }
}

fn library() -> LibraryApi {
    LibraryApi {
        book: get_json("book", |id: &u64| format!("/books/{id}")),
        save_book: send_json("save_book", reqwest::Method::PUT, |book: &Book| {
            format!("/books/{}", book.id)
        }),
        search: FnEndpoint::new(
            "search",
            |term: &String, _ctx| Ok(HttpRequest::get("/books").query("q", term)),
            |response: HttpResponse, _ctx| response.json(),
        ),
    }
}

fn repository(server: &MockServer, config: SessionConfig) -> Arc<RepositoryCore<LibraryApi, HttpSession>> {
    let config = SessionConfig {
        base_url: server.base_url(),
        ..config
    };
    let session = HttpSession::new(config).expect("valid session config");
    Arc::new(RepositoryCore::new(library(), session))
}

fn dune() -> Book {
    Book {
        id: 7,
        title: "Dune".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn get_decodes_json_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/books/7");
        then.status(200).json_body(json!({ "id": 7, "title": "Dune" }));
    });

    let repository = repository(&server, SessionConfig::default());
    let book = repository.call(|api| &api.book, 7).await.unwrap();

    assert_eq!(book, dune());
    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn error_status_is_transport_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/books/8");
        then.status(404).body("no such book");
    });

    let repository = repository(&server, SessionConfig::default());
    let err = repository.call(|api| &api.book, 8).await.unwrap_err();

    assert!(matches!(err, RunError::TransportFailed(_)), "got {err:?}");
    assert!(err.to_string().contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn put_sends_json_body_and_accepts_empty_response() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/books/7")
            .header("content-type", "application/json")
            .json_body(json!({ "id": 7, "title": "Dune" }));
        then.status(204);
    });

    let repository = repository(&server, SessionConfig::default());
    repository.call(|api| &api.save_book, dune()).await.unwrap();

    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn query_parameters_are_encoded() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/books").query_param("q", "sand worms");
        then.status(200).json_body(json!({ "books": [{ "id": 7, "title": "Dune" }] }));
    });

    let repository = repository(&server, SessionConfig::default());
    let shelf = repository
        .call(|api| &api.search, "sand worms".to_string())
        .await
        .unwrap();

    assert_eq!(shelf.books, vec![dune()]);
    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn bearer_transform_adds_authorization() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/books/7")
            .header("authorization", "Bearer s3cret");
        then.status(200).json_body(json!({ "id": 7, "title": "Dune" }));
    });

    let repository = repository(&server, SessionConfig::default());
    bearer_auth(&repository.interface().book, "s3cret");

    let book = repository.call(|api| &api.book, 7).await.unwrap();

    assert_eq!(book.title, "Dune");
    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn default_headers_and_user_agent_are_sent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/books/7")
            .header("x-client", "library-tests")
            .header("user-agent", "library/1.0");
        then.status(200).json_body(json!({ "id": 7, "title": "Dune" }));
    });

    let config = SessionConfig {
        user_agent: "library/1.0".to_string(),
        ..SessionConfig::default()
    }
    .with_header("x-client", "library-tests");
    let repository = repository(&server, config);

    repository.call(|api| &api.book, 7).await.unwrap();

    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_decode_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/books/7");
        then.status(200).body("{ not json");
    });

    let repository = repository(&server, SessionConfig::default());
    let err = repository.call(|api| &api.book, 7).await.unwrap_err();

    assert!(matches!(err, RunError::DecodeFailed(_)), "got {err:?}");
}
