use crate::adfs::AdCredentials;
use crate::http::api_client::ApiClient;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Response, StatusCode};

const WORKSTATION: &str = "WORKSTATION";

/// Issues a GET with Windows-integrated (NTLM) authentication: send a
/// Negotiate message, answer the server's Challenge with an NTLMv2
/// Authenticate message on the same cookie-kept session.
///
/// Servers that never answer with an NTLM challenge get a plain GET instead;
/// whatever body comes back is handed to assertion extraction, which decides
/// whether the forms fallback is needed. Only transport failures error here.
pub(crate) async fn negotiate_get(
    client: &ApiClient,
    url: &str,
    credentials: &AdCredentials,
) -> reqwest::Result<Response> {
    let negotiate = match negotiate_header() {
        Some(header) => header,
        None => return client.get(url, None).await,
    };

    let response = client.get(url, Some(negotiate.as_str())).await?;
    if response.status() != StatusCode::UNAUTHORIZED {
        return Ok(response);
    }

    let challenge = response
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|value| value.to_str().ok())
        .and_then(challenge_token);

    let challenge = match challenge {
        Some(token) => token,
        None => {
            debug!("identity provider answered 401 without an NTLM challenge");
            return client.get(url, None).await;
        }
    };

    match authenticate_header(&challenge, credentials) {
        Some(header) => client.get(url, Some(header.as_str())).await,
        None => {
            debug!("could not build an NTLM authenticate message from the challenge");
            client.get(url, None).await
        }
    }
}

fn negotiate_header() -> Option<String> {
    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE
        | ntlmclient::Flags::REQUEST_TARGET
        | ntlmclient::Flags::NEGOTIATE_NTLM
        | ntlmclient::Flags::NEGOTIATE_WORKSTATION_SUPPLIED;
    let message = ntlmclient::Message::Negotiate(ntlmclient::NegotiateMessage {
        flags,
        supplied_domain: String::new(),
        supplied_workstation: WORKSTATION.to_string(),
        os_version: Default::default(),
    });

    message
        .to_bytes()
        .ok()
        .map(|bytes| format!("NTLM {}", BASE64.encode(bytes)))
}

/// Pulls the decoded token out of a `WWW-Authenticate: NTLM <base64>` value.
fn challenge_token(header: &str) -> Option<Vec<u8>> {
    let token = header.strip_prefix("NTLM ")?;
    BASE64.decode(token.trim()).ok()
}

fn authenticate_header(challenge_bytes: &[u8], credentials: &AdCredentials) -> Option<String> {
    let message = ntlmclient::Message::try_from(challenge_bytes).ok()?;
    let challenge = match message {
        ntlmclient::Message::Challenge(challenge) => challenge,
        _ => return None,
    };

    let target_info: Vec<u8> = challenge
        .target_information
        .iter()
        .flat_map(|entry| entry.to_bytes())
        .collect();

    let creds = ntlmclient::Credentials {
        username: credentials.username().to_string(),
        password: credentials.password().to_string(),
        domain: credentials.domain().to_string(),
    };

    let response = ntlmclient::respond_challenge_ntlm_v2(
        challenge.challenge,
        &target_info,
        ntlmclient::get_ntlm_time(),
        &creds,
    );

    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE | ntlmclient::Flags::NEGOTIATE_NTLM;
    let message = response.to_message(&creds, WORKSTATION, flags);

    message
        .to_bytes()
        .ok()
        .map(|bytes| format!("NTLM {}", BASE64.encode(bytes)))
}
