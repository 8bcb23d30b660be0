//! GitHub Contents API client for reading and writing repository files.
//!
//! The stock endpoints persist their JSON documents as files in a GitHub
//! repository, authenticated with a minted installation token. Reads return
//! the decoded text plus the blob sha; writes send the sha back to update
//! in place (or omit it to create).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentsError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("GitHub contents request failed: {status} - {message}")]
    Upstream { status: u16, message: String },
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode file content: {0}")]
    Decode(String),
}

/// A repository file with its content decoded to text.
#[derive(Debug, Clone)]
pub struct RepoFile {
    pub text: String,
    pub sha: String,
}

/// Result of a create/update call.
#[derive(Debug, Deserialize)]
pub struct PutFileResponse {
    pub content: Option<FileRef>,
    pub commit: CommitRef,
}

#[derive(Debug, Deserialize)]
pub struct FileRef {
    pub path: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct GetContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutFileRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Contents API client bound to one installation access token.
pub struct ContentsClient {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl ContentsClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch a file and decode its base64 content.
    pub async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: Option<&str>,
    ) -> Result<RepoFile, ContentsError> {
        let mut url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, owner, repo, path
        );
        if let Some(branch) = branch {
            url.push_str("?ref=");
            url.push_str(branch);
        }

        let response = self.request(self.client.get(&url)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ContentsError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ContentsError::Upstream {
                status: status.as_u16(),
                message: body,
            });
        }

        let contents: GetContentsResponse = response.json().await?;
        let text = decode_content(&contents.content)?;

        Ok(RepoFile {
            text,
            sha: contents.sha,
        })
    }

    /// Create or update a file. Passing the current blob `sha` updates in
    /// place; omitting it creates the file.
    pub async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        message: &str,
        content: &str,
        sha: Option<&str>,
        branch: Option<&str>,
    ) -> Result<PutFileResponse, ContentsError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, owner, repo, path
        );

        let body = PutFileRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            sha,
            branch,
        };

        let response = self.request(self.client.put(&url)).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ContentsError::Upstream {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "Deskfolio")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// The Contents API returns base64 with embedded newlines; strip all
/// whitespace before decoding.
fn decode_content(raw: &str) -> Result<String, ContentsError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| ContentsError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ContentsError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_with_embedded_newlines() {
        // "{\"price\": 42}" split across lines the way GitHub returns it
        let raw = "eyJwcmlj\nZSI6IDQy\nfQ==\n";
        assert_eq!(decode_content(raw).unwrap(), "{\"price\": 42}");
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        assert!(matches!(
            decode_content("!!not base64!!"),
            Err(ContentsError::Decode(_))
        ));
    }

    #[test]
    fn put_request_omits_absent_sha_and_branch() {
        let body = PutFileRequest {
            message: "update",
            content: BASE64.encode(b"{}"),
            sha: None,
            branch: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert!(json.get("branch").is_none());

        let body = PutFileRequest {
            message: "update",
            content: BASE64.encode(b"{}"),
            sha: Some("abc123"),
            branch: Some("main"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sha"], "abc123");
        assert_eq!(json["branch"], "main");
    }
}
