// Facebook proxy handler
//
// Forwards requests under the proxy mount to the target site with a
// realistic browser header set, intercepts redirects back to the target
// domain, and rewrites target-domain URLs in returned bodies so navigation
// stays inside the mount.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::AppState;

lazy_static! {
    /// Fixed header set presented to the upstream site. Mirrors a current
    /// desktop Chrome so the target serves the ordinary HTML experience.
    static ref BROWSER_HEADERS: HeaderMap = {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            ),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,\
                 image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert("sec-ch-ua", HeaderValue::from_static(
            "\"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
        ));
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Windows\""));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
        headers
    };
}

/// Proxy a request through to the target site.
///
/// Accepts any method, though in practice the frontend only issues GETs.
pub async fn proxy_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let caller_origin = caller_origin(&state, &headers);

    match forward(&state, method, &headers, &uri, &caller_origin).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, uri = %uri, "Proxy request failed");
            let body = Json(serde_json::json!({
                "error": format!("Failed to fetch {} content", state.config.proxy.target_label)
            }));
            with_cors((StatusCode::INTERNAL_SERVER_ERROR, body).into_response())
        }
    }
}

async fn forward(
    state: &AppState,
    method: Method,
    headers: &HeaderMap,
    uri: &Uri,
    caller_origin: &str,
) -> anyhow::Result<Response> {
    let upstream_origin = state
        .config
        .proxy
        .upstream_origin
        .clone()
        .unwrap_or_else(|| format!("https://www.{}", state.config.proxy.target_domain));
    let upstream_url = upstream_url(&upstream_origin, state.rewriter.mount(), uri);

    debug!(method = %method, url = %upstream_url, "Forwarding to upstream");

    let mut request = state
        .proxy_client
        .request(method, &upstream_url)
        .headers(BROWSER_HEADERS.clone())
        .header(
            header::REFERER,
            format!("https://www.{}/", state.config.proxy.target_domain),
        );
    if let Some(cookie) = headers.get(header::COOKIE) {
        request = request.header(header::COOKIE, cookie.clone());
    }

    let upstream = request.send().await?;
    let status = upstream.status();

    // Redirects are not followed; a redirect back into the target domain is
    // translated onto the mount without fetching its body.
    if status.is_redirection() {
        if let Some(location) = upstream
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
        {
            let resolved = upstream.url().join(location)?;
            if let Some(rewritten) = state.rewriter.rewrite_location(&resolved, caller_origin) {
                info!(status = %status, location = %rewritten, "Intercepted upstream redirect");
                return Ok(redirect_response(status, &rewritten)?);
            }
            // Third-party hosts: the redirect passes through untouched.
            debug!(status = %status, location = %resolved, "Passing through third-party redirect");
            return Ok(redirect_response(status, resolved.as_str())?);
        }
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html; charset=utf-8")
        .to_string();

    let body = upstream.text().await?;
    let rewritten = state.rewriter.rewrite(&body, caller_origin);

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(rewritten.into())?;
    Ok(with_cors(response))
}

/// Build the upstream URL from the part of the request path after the mount.
fn upstream_url(origin: &str, mount: &str, uri: &Uri) -> String {
    let path = uri.path().strip_prefix(mount).unwrap_or("");
    let path = if path.is_empty() { "/" } else { path };

    let mut url = format!("{}{}", origin.trim_end_matches('/'), path);
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Origin the rewritten links should resolve against: the configured public
/// URL when present, otherwise derived from the request Host header.
fn caller_origin(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(external) = &state.config.server.external_url {
        return external.trim_end_matches('/').to_string();
    }
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!("http://{}", host))
        .unwrap_or_else(|| "http://localhost".to_string())
}

fn redirect_response(status: StatusCode, location: &str) -> anyhow::Result<Response> {
    let response = Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(axum::body::Body::empty())?;
    Ok(with_cors(response))
}

/// The proxy is called cross-origin from the portfolio frontend.
fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, Cookie"),
    );
    response
}
