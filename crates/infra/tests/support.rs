use std::sync::Arc;

use sprest_domain::ClientConfig;
use sprest_infra::{MockClock, SharePointClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const SITE: &str = "/sites/dev/";

const TOKEN_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<S:Envelope xmlns:S="http://www.w3.org/2003/05/soap-envelope" xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd" xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
  <S:Body>
    <wst:RequestSecurityTokenResponse xmlns:wst="http://schemas.xmlsoap.org/ws/2005/02/trust">
      <wst:TokenType>urn:passport:compact</wst:TokenType>
      <wst:RequestedSecurityToken>
        <wsse:BinarySecurityToken Id="Compact0">t=EwBwAk6hBwAUstub&amp;p=</wsse:BinarySecurityToken>
      </wst:RequestedSecurityToken>
    </wst:RequestSecurityTokenResponse>
  </S:Body>
</S:Envelope>"#;

/// Stubbed identity provider plus target host on one mock server.
pub struct StubTenant {
    pub server: MockServer,
    pub clock: MockClock,
}

impl StubTenant {
    /// Start a server answering the claims handshake with two cookies.
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extSTS.srf"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/_forms/default.aspx"))
            .and(query_param("wa", "wsignin1.0"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "/_layouts/15/landing.aspx")
                    .append_header("Set-Cookie", "rtFa=rtfa-cookie; Path=/; HttpOnly")
                    .append_header("Set-Cookie", "FedAuth=fedauth-cookie; Path=/; HttpOnly"),
            )
            .expect(1)
            .mount(&server)
            .await;

        Self { server, clock: MockClock::new(1_000_000) }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.server.uri(), SITE, "ada@contoso.com", "p@ss<word>")
            .with_identity_url(format!("{}/extSTS.srf", self.server.uri()))
    }

    pub async fn connect(&self) -> SharePointClient {
        SharePointClient::connect_with_clock(self.config(), Arc::new(self.clock.clone()))
            .await
            .expect("stub tenant sign-in should succeed")
    }

    pub fn url(&self, rest: &str) -> String {
        format!("{}{SITE}{rest}", self.server.uri())
    }

    /// Requests received so far whose path ends with `suffix`.
    pub async fn requests_to(&self, suffix: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path().ends_with(suffix))
            .collect()
    }
}

pub fn context_info(timeout_secs: i64, digest: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<d:GetContextWebInformation xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" m:type="SP.ContextWebInformation">
  <d:FormDigestTimeoutSeconds m:type="Edm.Int32">{timeout_secs}</d:FormDigestTimeoutSeconds>
  <d:FormDigestValue>{digest}</d:FormDigestValue>
  <d:LibraryVersion>16.0.25919.12007</d:LibraryVersion>
  <d:SiteFullUrl>https://contoso.sharepoint.com/sites/dev</d:SiteFullUrl>
</d:GetContextWebInformation>"#
    )
}

/// Serve `_api/contextinfo` with a fixed digest.
pub async fn mount_context_info(tenant: &StubTenant, timeout_secs: i64, digest: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{SITE}_api/contextinfo")))
        .respond_with(ResponseTemplate::new(200).set_body_string(context_info(timeout_secs, digest)))
        .mount(&tenant.server)
        .await;
}
