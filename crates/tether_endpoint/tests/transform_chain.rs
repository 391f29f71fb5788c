//! Property tests for endpoint transform chains.
//!
//! - Build transforms append their markers in registration order.
//! - Running the same pure chain twice over the same request yields the same result.

use proptest::prelude::*;
use tether_endpoint::{
    BuildRequestContext, DecodeOutputContext, Endpoint, FnEndpoint, Interface, MutableEndpoint,
    Request, RunError,
};

#[derive(Debug, Clone, PartialEq)]
struct Trace(Vec<String>);

impl Request for Trace {
    type Response = Vec<String>;
}

struct TraceApi;

impl Interface for TraceApi {
    type Request = Trace;
    type Error = RunError;
    type Id = ();

    fn id(&self) -> Self::Id {}
}

fn echo_endpoint() -> FnEndpoint<TraceApi, String, Vec<String>> {
    FnEndpoint::new(
        "echo",
        |input: &String, _ctx: &BuildRequestContext<'_, TraceApi, ()>| {
            Ok(Trace(vec![input.clone()]))
        },
        |response: Vec<String>, _ctx: &DecodeOutputContext<'_, TraceApi, String, ()>| Ok(response),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// With N build transforms each appending a distinct marker, the request
    /// carries the markers in registration order after the endpoint's own entry.
    #[test]
    fn prop_build_markers_follow_registration_order(markers in prop::collection::vec("[a-z]{1,8}", 0..12)) {
        let endpoint = echo_endpoint();
        for marker in &markers {
            let marker = marker.clone();
            endpoint.add_build_request_transform(marker.clone(), move |mut request: Trace, _ctx| {
                request.0.push(marker.clone());
                Ok(request)
            });
        }

        let request = endpoint
            .build_request(&"base".to_string(), &BuildRequestContext::new(&TraceApi, &()))
            .expect("build succeeds");

        let mut expected = vec!["base".to_string()];
        expected.extend(markers.iter().cloned());
        prop_assert_eq!(request.0, expected);
    }

    /// A chain of pure transforms produces identical output when re-run
    /// against the same request/response pair.
    #[test]
    fn prop_pure_chain_is_idempotent(
        input in "[a-z]{0,12}",
        response in prop::collection::vec("[a-z]{0,6}", 0..6),
        suffixes in prop::collection::vec("[0-9]{1,3}", 0..6),
    ) {
        let endpoint = echo_endpoint();
        for suffix in suffixes {
            let build_suffix = suffix.clone();
            endpoint.add_build_request_transform("suffix", move |mut request: Trace, _ctx| {
                request.0.push(build_suffix.clone());
                Ok(request)
            });
            endpoint.add_decode_output_transform("tag", move |mut output: Vec<String>, ctx| {
                output.push(format!("{}:{}", ctx.input, suffix));
                Ok(output)
            });
        }

        let build = || {
            endpoint
                .build_request(&input, &BuildRequestContext::new(&TraceApi, &()))
                .expect("build succeeds")
        };
        let first_request = build();
        let second_request = build();
        prop_assert_eq!(&first_request, &second_request);

        let decode = || {
            let context = DecodeOutputContext {
                root: &TraceApi,
                input: &input,
                options: &(),
                request: &first_request,
            };
            endpoint
                .decode_output(response.clone(), &context)
                .expect("decode succeeds")
        };
        prop_assert_eq!(decode(), decode());
    }
}
