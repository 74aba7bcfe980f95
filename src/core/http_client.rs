use biliget_core::models::settings::{AuthSettings, ProxySettings};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};

use crate::error::{PipelineError, Result};

pub fn proxy_url(proxy: &ProxySettings) -> Option<String> {
    if !proxy.enabled || proxy.host.is_empty() {
        return None;
    }
    let scheme = match proxy.proxy_type.as_str() {
        "socks5" => "socks5",
        "https" => "https",
        _ => "http",
    };
    if !proxy.username.is_empty() {
        Some(format!(
            "{}://{}:{}@{}:{}",
            scheme, proxy.username, proxy.password, proxy.host, proxy.port
        ))
    } else {
        Some(format!("{}://{}:{}", scheme, proxy.host, proxy.port))
    }
}

pub fn apply_proxy(
    builder: reqwest::ClientBuilder,
    proxy: &ProxySettings,
) -> reqwest::ClientBuilder {
    let Some(url) = proxy_url(proxy) else {
        return builder;
    };
    match reqwest::Proxy::all(&url) {
        Ok(p) => builder.proxy(p),
        Err(e) => {
            tracing::warn!("Invalid proxy URL: {}", e);
            builder
        }
    }
}

pub fn auth_headers(auth: &AuthSettings) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &auth.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| PipelineError::Config(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| PipelineError::Config(format!("invalid value for '{}': {}", name, e)))?;
        headers.insert(name, value);
    }
    if !auth.cookie.is_empty() {
        let mut cookie = HeaderValue::from_str(&auth.cookie)
            .map_err(|e| PipelineError::Config(format!("invalid cookie: {}", e)))?;
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
    }
    Ok(headers)
}

/// Client carrying the credential bundle on every request. No timeouts are set.
pub fn build_client(auth: &AuthSettings, proxy: &ProxySettings) -> Result<reqwest::Client> {
    let builder = reqwest::Client::builder().default_headers(auth_headers(auth)?);
    apply_proxy(builder, proxy)
        .build()
        .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {}", e)))
}
