//! Consumption of the ambient access credential.
//!
//! The chat worker may sit behind an access proxy that expects a service
//! token JWT on every request. Chatelet only consumes such a token; acquiring
//! one (browser login, `cloudflared`, etc.) is out of scope.

/// Environment variable holding the ambient access JWT, when one exists.
pub const ACCESS_TOKEN_ENV: &str = "CF_ACCESS_JWT";

/// Header the access proxy reads the JWT from.
pub const ACCESS_TOKEN_HEADER: &str = "CF-Access-JWT-Assertion";

/// Read the ambient access token from the environment. Whitespace-only
/// values count as absent.
pub fn access_token_from_env() -> Option<String> {
    std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Attach the access credential header to an outbound request when a token
/// is present; otherwise return the request untouched.
pub fn add_access_headers(
    request: reqwest::RequestBuilder,
    access_token: Option<&str>,
) -> reqwest::RequestBuilder {
    match access_token {
        Some(token) => request.header(ACCESS_TOKEN_HEADER, token),
        None => request,
    }
}
