//! URL rewriting for proxied HTML bodies.
//!
//! Proxied pages are treated as opaque text; four ordered pattern passes
//! rewrite every link back to the target site so navigation stays inside
//! the proxy mount. No DOM parsing; the same passes work across HTML,
//! inline script, and meta-tag contexts.

use regex::{Captures, Regex};
use reqwest::Url;

/// Rewrites target-domain URLs in proxied content to point back at the
/// proxy mount. Compiled once per process from the proxy configuration.
pub struct UrlRewriter {
    /// `http(s)://[www.]target/...`
    absolute: Regex,
    /// `//[www.]target/...`
    protocol_relative: Regex,
    /// `<meta http-equiv="refresh" content="N;url=...">`
    meta_refresh: Regex,
    /// `window.location.href = "..."` / `window.location.replace("...")`
    script_redirect: Regex,
    target_domain: String,
    alias_domain: String,
    mount: String,
}

impl UrlRewriter {
    pub fn new(
        target_domain: &str,
        alias_domain: &str,
        mount: &str,
    ) -> Result<Self, regex::Error> {
        let domains = format!(
            "(?:{}|{})",
            regex::escape(target_domain),
            regex::escape(alias_domain)
        );

        // A match must end at a path/query separator, a delimiter, or the end
        // of input, so that e.g. `facebook.community` is left alone. The
        // boundary character is captured and re-emitted.
        let absolute = Regex::new(&format!(
            r#"(?i)https?://(?:www\.)?{domains}($|[/?#"'\s<>\\&),;])"#
        ))?;
        let protocol_relative = Regex::new(&format!(
            r#"(?i)//(?:www\.)?{domains}($|[/?#"'\s<>\\&),;])"#
        ))?;
        let meta_refresh = Regex::new(&format!(
            r#"(?i)(content=(["'])\s*\d+\s*;\s*url=\s*)((?:https?:)?(?://)?(?:www\.)?{domains}[^"'\s>]*)"#
        ))?;
        let script_redirect = Regex::new(&format!(
            r#"(?i)(window\.location\.href\s*=\s*|window\.location\.replace\(\s*)(["'])((?:https?:)?(?://)?(?:www\.)?{domains}[^"']*)(["'])"#
        ))?;

        Ok(Self {
            absolute,
            protocol_relative,
            meta_refresh,
            script_redirect,
            target_domain: target_domain.to_ascii_lowercase(),
            alias_domain: alias_domain.to_ascii_lowercase(),
            mount: mount.trim_end_matches('/').to_string(),
        })
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// True when `host` is the target domain, its short alias, or either
    /// with a `www.` prefix.
    pub fn is_target_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        host == self.target_domain || host == self.alias_domain
    }

    /// Rewrite all recognized target-domain URL forms in `body` to
    /// `<caller_origin><mount>/...`. Text without such URLs passes through
    /// unchanged.
    pub fn rewrite(&self, body: &str, caller_origin: &str) -> String {
        let base = self.proxy_base(caller_origin);

        // Absolute forms first: they contain the protocol-relative form as a
        // substring, and once rewritten neither later pass can see them.
        let body = self.absolute.replace_all(body, |caps: &Captures| {
            format!("{}{}", base, boundary(caps, 1))
        });
        let body = self.protocol_relative.replace_all(&body, |caps: &Captures| {
            format!("{}{}", base, boundary(caps, 1))
        });
        let body = self.meta_refresh.replace_all(&body, |caps: &Captures| {
            match path_and_query(&caps[3]) {
                Some(pq) => format!("{}{}{}", &caps[1], base, pq),
                None => caps[0].to_string(),
            }
        });
        let body = self.script_redirect.replace_all(&body, |caps: &Captures| {
            match path_and_query(&caps[3]) {
                Some(pq) => format!("{}{}{}{}{}", &caps[1], &caps[2], base, pq, &caps[4]),
                None => caps[0].to_string(),
            }
        });

        body.into_owned()
    }

    /// Translate an upstream redirect location to the proxy mount, keeping
    /// path and query. Returns None for third-party hosts.
    pub fn rewrite_location(&self, resolved: &Url, caller_origin: &str) -> Option<String> {
        let host = resolved.host_str()?;
        if !self.is_target_host(host) {
            return None;
        }

        let mut location = format!("{}{}", self.proxy_base(caller_origin), resolved.path());
        if let Some(query) = resolved.query() {
            location.push('?');
            location.push_str(query);
        }
        Some(location)
    }

    fn proxy_base(&self, caller_origin: &str) -> String {
        format!("{}{}", caller_origin.trim_end_matches('/'), self.mount)
    }
}

fn boundary<'a>(caps: &'a Captures, index: usize) -> &'a str {
    caps.get(index).map(|m| m.as_str()).unwrap_or("")
}

/// Reduce a URL in any of the recognized surface forms (absolute,
/// protocol-relative, or bare-domain) to its path plus query string.
fn path_and_query(url: &str) -> Option<String> {
    let absolute = if url.starts_with("//") {
        format!("https:{}", url)
    } else if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    let parsed = Url::parse(&absolute).ok()?;
    let mut out = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://proxy.example";

    fn rewriter() -> UrlRewriter {
        UrlRewriter::new("facebook.com", "fb.com", "/api/facebook").unwrap()
    }

    #[test]
    fn absolute_url_keeps_path_and_query() {
        let body = r#"<a href="https://www.facebook.com/groups/123?ref=x">join</a>"#;
        let out = rewriter().rewrite(body, ORIGIN);
        assert!(out.contains("https://proxy.example/api/facebook/groups/123?ref=x"));
        assert!(!out.contains("facebook.com"));
    }

    #[test]
    fn protocol_relative_alias_domain() {
        let out = rewriter().rewrite(r#"src="//fb.com/path""#, ORIGIN);
        assert_eq!(out, r#"src="https://proxy.example/api/facebook/path""#);
    }

    #[test]
    fn bare_domain_url_without_path() {
        let out = rewriter().rewrite("go to https://facebook.com now", ORIGIN);
        assert_eq!(out, "go to https://proxy.example/api/facebook now");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let out = rewriter().rewrite(r#"href="HTTPS://WWW.FACEBOOK.COM/x""#, ORIGIN);
        assert_eq!(out, r#"href="https://proxy.example/api/facebook/x""#);
    }

    #[test]
    fn unrelated_text_passes_through_unchanged() {
        let body = "<html><body><a href=\"https://example.org/a\">x</a></body></html>";
        assert_eq!(rewriter().rewrite(body, ORIGIN), body);
    }

    #[test]
    fn similar_domain_is_not_corrupted() {
        let body = r#"<a href="https://facebook.community/forum">f</a>"#;
        assert_eq!(rewriter().rewrite(body, ORIGIN), body);
    }

    #[test]
    fn meta_refresh_is_reduced_to_path_and_query() {
        let body = r#"<meta http-equiv="refresh" content="0;url=www.facebook.com/login?next=%2Fhome">"#;
        let out = rewriter().rewrite(body, ORIGIN);
        assert_eq!(
            out,
            r#"<meta http-equiv="refresh" content="0;url=https://proxy.example/api/facebook/login?next=%2Fhome">"#
        );
    }

    #[test]
    fn script_href_assignment_preserves_quote_character() {
        let body = "window.location.href = 'fb.com/checkpoint?next=1';";
        let out = rewriter().rewrite(body, ORIGIN);
        assert_eq!(
            out,
            "window.location.href = 'https://proxy.example/api/facebook/checkpoint?next=1';"
        );
    }

    #[test]
    fn script_replace_call_is_rewritten() {
        let body = r#"window.location.replace("www.facebook.com/home")"#;
        let out = rewriter().rewrite(body, ORIGIN);
        assert_eq!(
            out,
            r#"window.location.replace("https://proxy.example/api/facebook/home")"#
        );
    }

    #[test]
    fn caller_origin_trailing_slash_is_tolerated() {
        let out = rewriter().rewrite("https://facebook.com/p", "https://proxy.example/");
        assert_eq!(out, "https://proxy.example/api/facebook/p");
    }

    #[test]
    fn target_host_matching() {
        let r = rewriter();
        assert!(r.is_target_host("facebook.com"));
        assert!(r.is_target_host("www.facebook.com"));
        assert!(r.is_target_host("FB.com"));
        assert!(!r.is_target_host("m.facebook.com"));
        assert!(!r.is_target_host("example.org"));
    }

    #[test]
    fn redirect_location_rewritten_for_target_host() {
        let r = rewriter();
        let url = Url::parse("https://www.facebook.com/login?next=%2Fgroups").unwrap();
        assert_eq!(
            r.rewrite_location(&url, ORIGIN),
            Some("https://proxy.example/api/facebook/login?next=%2Fgroups".to_string())
        );
    }

    #[test]
    fn redirect_location_third_party_is_not_rewritten() {
        let r = rewriter();
        let url = Url::parse("https://accounts.example.org/signin").unwrap();
        assert_eq!(r.rewrite_location(&url, ORIGIN), None);
    }

    #[test]
    fn path_and_query_handles_all_surface_forms() {
        assert_eq!(
            path_and_query("https://www.facebook.com/a/b?c=d").as_deref(),
            Some("/a/b?c=d")
        );
        assert_eq!(path_and_query("//fb.com/x").as_deref(), Some("/x"));
        assert_eq!(path_and_query("facebook.com/y?z=1").as_deref(), Some("/y?z=1"));
    }
}
