//! End-to-end session lifecycle against a stubbed tenant
//!
//! **Coverage:**
//! - Claims handshake: token request → form sign-in → cookie jar installed
//! - Session cookies sent on subsequent REST calls
//! - Form digest reuse inside the refresh margin and refresh past it
//! - Construction failures never yield a client

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use sprest_domain::{ClientConfig, SpError};
use sprest_infra::{RequestDescriptor, SharePointClient};
use support::{mount_context_info, StubTenant, SITE};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn sign_in_installs_both_cookies_without_fetching_a_digest() {
    let tenant = StubTenant::start().await;
    let client = tenant.connect().await;

    let url = url::Url::parse(&tenant.server.uri()).unwrap();
    let cookies = client.session().cookie_header(&url).expect("session cookies");
    let cookies = cookies.to_str().unwrap();
    assert!(cookies.contains("rtFa=rtfa-cookie"), "{cookies}");
    assert!(cookies.contains("FedAuth=fedauth-cookie"), "{cookies}");

    assert!(!client.session().digest().is_cached().await);
    assert!(tenant.requests_to("_api/contextinfo").await.is_empty());
}

#[tokio::test]
async fn token_request_carries_escaped_credentials_and_target_host() {
    let tenant = StubTenant::start().await;
    let _client = tenant.connect().await;

    let requests = tenant.requests_to("/extSTS.srf").await;
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("<o:Username>ada@contoso.com</o:Username>"));
    assert!(body.contains("<o:Password>p@ss&lt;word&gt;</o:Password>"));
    assert!(body.contains(&format!("<a:Address>{}</a:Address>", tenant.server.uri())));

    let sign_in = tenant.requests_to("/_forms/default.aspx").await;
    assert_eq!(String::from_utf8(sign_in[0].body.clone()).unwrap(), "t=EwBwAk6hBwAUstub&p=");
}

#[tokio::test]
async fn session_cookies_accompany_rest_calls() {
    let tenant = StubTenant::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{SITE}_api/web")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<entry/>"))
        .expect(1)
        .mount(&tenant.server)
        .await;

    let client = tenant.connect().await;
    let text = client.execute(RequestDescriptor::get(tenant.url("_api/web"))).await.unwrap();
    assert_eq!(text.into_text(), "<entry/>");

    let requests = tenant.requests_to("_api/web").await;
    let cookie = requests[0].headers.get("cookie").unwrap().to_str().unwrap();
    assert!(cookie.contains("FedAuth=fedauth-cookie"));
    assert_eq!(requests[0].headers.get("connection").map(|v| v.to_str().unwrap()), Some("close"));
}

#[tokio::test]
async fn digest_is_reused_until_the_refresh_margin() {
    let tenant = StubTenant::start().await;
    mount_context_info(&tenant, 1800, "abc").await;
    let client = tenant.connect().await;

    assert_eq!(client.get_digest().await.unwrap(), "abc");
    assert_eq!(tenant.requests_to("_api/contextinfo").await.len(), 1);

    tenant.clock.advance(1739);
    assert_eq!(client.get_digest().await.unwrap(), "abc");
    assert_eq!(tenant.requests_to("_api/contextinfo").await.len(), 1);

    tenant.clock.advance(2);
    assert_eq!(client.get_digest().await.unwrap(), "abc");
    assert_eq!(tenant.requests_to("_api/contextinfo").await.len(), 2);
}

#[tokio::test]
async fn mutating_calls_send_the_cached_digest() {
    let tenant = StubTenant::start().await;
    mount_context_info(&tenant, 1800, "digest-1").await;
    Mock::given(method("POST"))
        .and(path(format!("{SITE}_api/web/folders")))
        .and(header("x-requestdigest", "digest-1"))
        .and(header("content-type", "application/json;odata=verbose"))
        .and(body_string_contains("\"ServerRelativeUrl\":\"/sites/dev/Shared Documents/new\""))
        .respond_with(ResponseTemplate::new(201).set_body_string("{\"d\":{}}"))
        .expect(2)
        .mount(&tenant.server)
        .await;

    let client = tenant.connect().await;
    client.create_folder("/sites/dev/Shared Documents/new").await.unwrap();
    client.create_folder("/sites/dev/Shared Documents/new").await.unwrap();

    assert_eq!(tenant.requests_to("_api/contextinfo").await.len(), 1);
}

#[tokio::test]
async fn malformed_context_info_is_a_parse_error() {
    let tenant = StubTenant::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SITE}_api/contextinfo")))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<d:X xmlns:d=\"urn:d\"><d:FormDigestValue>abc</d:FormDigestValue></d:X>",
        ))
        .mount(&tenant.server)
        .await;

    let client = tenant.connect().await;
    let err = client.get_digest().await.unwrap_err();
    assert!(matches!(err, SpError::Parse { .. }), "{err}");
    assert!(!client.session().digest().is_cached().await);
}

#[tokio::test]
async fn rejected_credentials_fail_construction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/extSTS.srf"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<S:Envelope xmlns:S=\"http://www.w3.org/2003/05/soap-envelope\"><S:Body><S:Fault>\
             <S:Reason><S:Text>Invalid username or password</S:Text></S:Reason>\
             </S:Fault></S:Body></S:Envelope>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_forms/default.aspx"))
        .respond_with(ResponseTemplate::new(302))
        .expect(0)
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri(), SITE, "ada", "wrong")
        .with_identity_url(format!("{}/extSTS.srf", server.uri()));
    let result = SharePointClient::connect_with_clock(
        config,
        Arc::new(sprest_infra::MockClock::default()),
    )
    .await;

    match result {
        Err(SpError::Authentication(msg)) => {
            assert_eq!(msg, "identity provider response has no wsse:BinarySecurityToken");
        }
        Err(other) => panic!("expected authentication error, got {other}"),
        Ok(_) => panic!("construction must fail"),
    }
}

#[tokio::test]
async fn invalid_config_fails_before_any_request() {
    let server = MockServer::start().await;
    let config = ClientConfig::new(format!("{}/", server.uri()), "sites/dev", "ada", "pw");

    let result = SharePointClient::connect(config).await;
    assert!(matches!(result, Err(SpError::Config(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}
