use crate::models::{Page, SaveOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    /// Backend answered `{ ok: false }`.
    Rejected,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Rejected,
            message: message.into(),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Runtime configuration injected by the server as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub socket_url: String,
    pub hackmd_uri: Option<String>,
    pub log_level: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        let mut cfg = Self::with_origin(&origin);

        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return cfg;
        };

        // Both `API_URL` and `api_url` spellings are accepted.
        let read = |keys: &[&str]| {
            keys.iter().find_map(|k| {
                js_sys::Reflect::get(&env, &(*k).into())
                    .ok()
                    .and_then(|v| v.as_string())
                    .filter(|s| !s.trim().is_empty())
            })
        };

        if let Some(v) = read(&["API_URL", "api_url"]) {
            cfg.api_url = v;
        }
        if let Some(v) = read(&["SOCKET_URL", "socket_url"]) {
            cfg.socket_url = v;
        }
        if let Some(v) = read(&["HACKMD_URI", "hackmd_uri"]) {
            cfg.hackmd_uri = Some(v);
        }
        if let Some(v) = read(&["LOG_LEVEL", "log_level"]) {
            cfg.log_level = v;
        }

        cfg
    }

    /// Defaults derived from the page origin: same-origin API and socket.io endpoint.
    pub(crate) fn with_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        let socket_base = if let Some(rest) = origin.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = origin.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            origin.to_string()
        };

        Self {
            api_url: origin.to_string(),
            socket_url: format!("{socket_base}/socket.io/?EIO=3&transport=websocket"),
            hackmd_uri: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreatePageRequest<'a> {
    pub path: &'a str,
    pub body: &'a str,
    #[serde(rename = "_csrf", skip_serializing_if = "Option::is_none")]
    pub csrf: Option<&'a str>,
    #[serde(flatten)]
    pub options: &'a SaveOptions,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct UpdatePageRequest<'a> {
    pub page_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<&'a str>,
    pub body: &'a str,
    #[serde(rename = "_csrf", skip_serializing_if = "Option::is_none")]
    pub csrf: Option<&'a str>,
    #[serde(flatten)]
    pub options: &'a SaveOptions,
}

/// `{ ok, page }` / `{ ok: false, error }` envelope of the page endpoints.
#[derive(Deserialize, Clone, Debug)]
pub(crate) struct PageResponse {
    pub ok: bool,
    #[serde(default)]
    pub page: Option<Page>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PageResponse {
    pub(crate) fn into_page(self) -> ApiResult<Page> {
        if !self.ok {
            return Err(ApiError::rejected(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        self.page
            .ok_or_else(|| ApiError::parse("response is missing page"))
    }
}

/// Remote side of page saves.
#[async_trait(?Send)]
pub(crate) trait PageService: Send + Sync {
    async fn create_page(&self, path: &str, body: &str, options: &SaveOptions)
        -> ApiResult<Page>;

    async fn update_page(
        &self,
        page_id: &str,
        revision_id: Option<&str>,
        body: &str,
        options: &SaveOptions,
    ) -> ApiResult<Page>;
}

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) csrf_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            csrf_token: None,
        }
    }

    pub fn set_csrf_token(&mut self, token: String) {
        self.csrf_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let res = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }
}

#[async_trait(?Send)]
impl PageService for ApiClient {
    async fn create_page(
        &self,
        path: &str,
        body: &str,
        options: &SaveOptions,
    ) -> ApiResult<Page> {
        let req = CreatePageRequest {
            path,
            body,
            csrf: self.csrf_token.as_deref(),
            options,
        };
        let res: PageResponse = self.request_api("/_api/pages.create", &req).await?;
        res.into_page()
    }

    async fn update_page(
        &self,
        page_id: &str,
        revision_id: Option<&str>,
        body: &str,
        options: &SaveOptions,
    ) -> ApiResult<Page> {
        let req = UpdatePageRequest {
            page_id,
            revision_id,
            body,
            csrf: self.csrf_token.as_deref(),
            options,
        };
        let res: PageResponse = self.request_api("/_api/pages.update", &req).await?;
        res.into_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Grant;

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:3000".to_string());
        assert_eq!(client.base_url, "http://localhost:3000");
        assert!(client.csrf_token.is_none());
    }

    #[test]
    fn test_api_client_blank_csrf_token_is_dropped() {
        let mut client = ApiClient::new("http://localhost:3000".to_string());
        client.set_csrf_token("  ".to_string());
        assert!(client.csrf_token.is_none());
        client.set_csrf_token("tok".to_string());
        assert_eq!(client.csrf_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_update_request_flattens_options() {
        let options = SaveOptions {
            grant: Grant::Owner,
            socket_client_id: Some("s1".to_string()),
            overwrite_scopes_of_descendants: true,
            ..Default::default()
        };
        let req = UpdatePageRequest {
            page_id: "p1",
            revision_id: Some("r1"),
            body: "# Hello",
            csrf: Some("tok"),
            options: &options,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["page_id"], "p1");
        assert_eq!(v["revision_id"], "r1");
        assert_eq!(v["body"], "# Hello");
        assert_eq!(v["_csrf"], "tok");
        assert_eq!(v["grant"], 4);
        assert_eq!(v["socketClientId"], "s1");
        assert_eq!(v["overwriteScopesOfDescendants"], true);
    }

    #[test]
    fn test_create_request_omits_missing_csrf() {
        let options = SaveOptions::default();
        let req = CreatePageRequest {
            path: "/new",
            body: "",
            csrf: None,
            options: &options,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["path"], "/new");
        assert!(v.get("_csrf").is_none());
    }

    #[test]
    fn test_page_response_ok() {
        let json = r#"{"ok": true, "page": {"_id": "p1", "path": "/a", "revision": {"_id": "r1", "body": "x"}}}"#;
        let res: PageResponse = serde_json::from_str(json).expect("should parse");
        let page = res.into_page().expect("ok response carries a page");
        assert_eq!(page.id, "p1");
        assert_eq!(page.revision.id, "r1");
    }

    #[test]
    fn test_page_response_rejected_surfaces_message() {
        let json = r#"{"ok": false, "error": "Posted param \"revisionId\" is outdated."}"#;
        let res: PageResponse = serde_json::from_str(json).expect("should parse");
        let err = res.into_page().expect_err("ok=false is an error");
        assert_eq!(err.kind, ApiErrorKind::Rejected);
        assert_eq!(err.to_string(), "Posted param \"revisionId\" is outdated.");
    }

    #[test]
    fn test_page_response_ok_without_page_is_parse_error() {
        let res: PageResponse = serde_json::from_str(r#"{"ok": true}"#).expect("should parse");
        let err = res.into_page().expect_err("missing page");
        assert_eq!(err.kind, ApiErrorKind::Parse);
    }

    #[test]
    fn test_env_config_with_origin() {
        let cfg = EnvConfig::with_origin("https://wiki.example.com/");
        assert_eq!(cfg.api_url, "https://wiki.example.com");
        assert_eq!(
            cfg.socket_url,
            "wss://wiki.example.com/socket.io/?EIO=3&transport=websocket"
        );
        assert!(cfg.hackmd_uri.is_none());
        assert_eq!(cfg.log_level, "info");

        let local = EnvConfig::with_origin("http://localhost:3000");
        assert!(local.socket_url.starts_with("ws://localhost:3000/"));
    }
}
