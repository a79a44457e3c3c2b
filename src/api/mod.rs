use serde::Deserialize;
use thiserror::Error;

pub(crate) const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Body,
}

#[derive(Clone, Debug, Error)]
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

    fn body(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Body,
            message: e.to_string(),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// One note submission, ready to send.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NoteRequest {
    pub url: String,
    pub payload_key: String,
    pub text: String,
    pub token: Option<String>,
}

impl NoteRequest {
    pub fn body(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            self.payload_key.clone(),
            serde_json::Value::String(self.text.clone()),
        );
        serde_json::Value::Object(map)
    }
}

/// What came back, before interpretation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SubmissionOutcome {
    Success { fragment_html: String },
    /// 2xx with nothing to render.
    ///
    /// The submitter answers this with a full reload, the one reload case
    /// besides a missing list container: the note was saved but there is no
    /// fragment to merge.
    Empty,
    AuthDenied,
    TransportError { status: Option<u16>, detail: String },
    MalformedResponse { detail: String },
}

#[derive(Deserialize)]
struct FragmentEnvelope {
    #[serde(default)]
    html: Option<String>,
}

/// Maps a transport result onto the outcome the submitter acts on.
///
/// Success accepts `{"html": "..."}` JSON or a raw HTML body. The shape is taken
/// from `Content-Type`; without one, a body that looks like a JSON object is
/// read as JSON.
pub(crate) fn interpret(result: ApiResult<RawResponse>) -> SubmissionOutcome {
    let res = match result {
        Ok(res) => res,
        Err(e) => {
            return SubmissionOutcome::TransportError {
                status: None,
                detail: format!("{:?} error: {e}", e.kind),
            }
        }
    };

    if res.status == 403 {
        return SubmissionOutcome::AuthDenied;
    }
    if !(200..300).contains(&res.status) {
        return SubmissionOutcome::TransportError {
            status: Some(res.status),
            detail: format!("HTTP {}", res.status),
        };
    }

    let is_json = match res.content_type.as_deref() {
        Some(ct) => ct.to_ascii_lowercase().contains("json"),
        None => res.body.trim_start().starts_with('{'),
    };

    let fragment = if is_json {
        match serde_json::from_str::<FragmentEnvelope>(&res.body) {
            Ok(FragmentEnvelope { html: Some(html) }) => html,
            Ok(FragmentEnvelope { html: None }) => {
                return SubmissionOutcome::MalformedResponse {
                    detail: "JSON body has no html field".to_string(),
                }
            }
            Err(e) => {
                return SubmissionOutcome::MalformedResponse {
                    detail: e.to_string(),
                }
            }
        }
    } else {
        res.body
    };

    if fragment.trim().is_empty() {
        SubmissionOutcome::Empty
    } else {
        SubmissionOutcome::Success {
            fragment_html: fragment,
        }
    }
}

/// Resolves `url` against `base` the way the browser resolves a link.
///
/// Falls back to `url` untouched when either part does not parse.
pub(crate) fn resolve_url(url: &str, base: &str) -> String {
    web_sys::Url::new_with_base(url, base)
        .map(|u| u.href())
        .unwrap_or_else(|_| url.to_string())
}

/// Sends note requests. One implementation talks HTTP; tests script their own.
pub(crate) trait NoteTransport {
    async fn post_note(&self, req: &NoteRequest) -> ApiResult<RawResponse>;
}

#[derive(Clone, Default)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Relative endpoints resolve against the current page URL.
    fn absolute_url(url: &str) -> String {
        let href = web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default();
        resolve_url(url, &href)
    }
}

impl NoteTransport for HttpTransport {
    async fn post_note(&self, req: &NoteRequest) -> ApiResult<RawResponse> {
        let mut builder = self
            .client
            .post(Self::absolute_url(&req.url))
            .header("Accept", "application/json, text/html");
        if let Some(token) = &req.token {
            builder = builder.header(CSRF_HEADER, token);
        }

        // `.json()` also sets Content-Type: application/json.
        let res = builder
            .json(&req.body())
            .send()
            .await
            .map_err(ApiError::network)?;

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res.text().await.map_err(ApiError::body)?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
