//! JSON endpoint helpers for HTTP interfaces.

use std::borrow::Cow;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tether_endpoint::{FnEndpoint, Interface, MutableEndpoint};

use crate::request::{HttpRequest, HttpResponse};

/// Creates a `GET` endpoint whose path is derived from the input and whose
/// response body is decoded as JSON.
///
/// ```ignore
/// let get_user = get_json::<UserApi, u64, User>("get_user", |id| format!("/users/{id}"));
/// ```
pub fn get_json<Root, Input, Output, P>(
    name: impl Into<Cow<'static, str>>,
    path: P,
) -> FnEndpoint<Root, Input, Output>
where
    Root: Interface<Request = HttpRequest>,
    Output: DeserializeOwned,
    P: Fn(&Input) -> String + Send + Sync + 'static,
{
    FnEndpoint::new(
        name,
        move |input, _ctx| Ok(HttpRequest::get(path(input))),
        |response: HttpResponse, _ctx| response.json(),
    )
}

/// Creates an endpoint that sends its input as a JSON body with `method` and
/// decodes the response body as JSON.
///
/// Use `()` as the output for endpoints answering with an empty body.
pub fn send_json<Root, Input, Output, P>(
    name: impl Into<Cow<'static, str>>,
    method: Method,
    path: P,
) -> FnEndpoint<Root, Input, Output>
where
    Root: Interface<Request = HttpRequest>,
    Input: Serialize,
    Output: DeserializeOwned,
    P: Fn(&Input) -> String + Send + Sync + 'static,
{
    FnEndpoint::new(
        name,
        move |input, _ctx| HttpRequest::new(method.clone(), path(input)).json(input),
        |response: HttpResponse, _ctx| response.json(),
    )
}

/// Adds an `Authorization: Bearer` header to every request `endpoint` builds.
///
/// The transform is labelled `bearer_auth`.
pub fn bearer_auth<E>(endpoint: &E, token: impl Into<String>)
where
    E: MutableEndpoint,
    E::Root: Interface<Request = HttpRequest>,
{
    let token = token.into();
    endpoint.add_build_request_transform("bearer_auth", move |request: HttpRequest, _ctx| {
        request.bearer_auth(&token)
    });
}
