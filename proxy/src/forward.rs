//! Executes upstream requests built by the dispatch table.

use mailchimp_core::{HttpMethod, HttpRequest, HttpResponse};
use reqwest::Method;

use crate::error::ProxyError;

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Send `request` and return the upstream response as data, whatever its status.
pub async fn execute(
    client: &reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, ProxyError> {
    let mut builder = client.request(method(request.method), &request.path);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body {
        builder = builder.body(body);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| ProxyError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .text()
        .await
        .map_err(|e| ProxyError::Transport(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
