// Hand-crafted async HTTP client for the staffdesk administrative API.
//
// Every entity type is exposed as a collection endpoint:
//   GET    <endpoint>?PageNumber=..&PageSize=..&<Filter>=..
//   POST   <endpoint>
//   PUT    <endpoint>/<id>
//   DELETE <endpoint>/<id>

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;

// ── Error response shape ─────────────────────────────────────────────

/// Problem-details style error body. Servers in the wild use any of
/// `message`, `title`, or `detail` for the human-readable text.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Map<String, Value>>,
}

impl ErrorResponse {
    fn text(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.detail.clone())
            .or_else(|| self.title.clone())
    }

    /// Flatten `{ "Field": ["msg", ...] | "msg" }` into `(field, msg)` pairs.
    fn field_messages(&self) -> Vec<(String, String)> {
        let Some(errors) = &self.errors else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (field, value) in errors {
            match value {
                Value::Array(messages) => {
                    for m in messages {
                        if let Some(text) = m.as_str() {
                            out.push((field.clone(), text.to_owned()));
                        }
                    }
                }
                Value::String(text) => out.push((field.clone(), text.clone())),
                _ => {}
            }
        }
        out
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the administrative REST API.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted, so
/// list endpoints can move a clone into each `'static` fetch future.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a base URL and transport settings.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join an endpoint path (e.g. `"api/employees"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn item_url(&self, endpoint: &str, id: &str) -> Result<Url, Error> {
        let endpoint = endpoint.trim_end_matches('/');
        self.url(&format!("{endpoint}/{id}"))
    }

    // ── Public API ───────────────────────────────────────────────────

    /// Fetch one page of a collection. `params` are sent in the given
    /// order; callers pass them already canonicalized.
    pub async fn get_list(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value, Error> {
        self.get_with_params(endpoint, params).await
    }

    /// Fetch a collection page and decode it into `T`.
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.url(endpoint)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    /// `POST <endpoint>`; returns the created entity if the server echoes it.
    pub async fn create<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Option<Value>, Error> {
        let url = self.url(endpoint)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_optional(resp).await
    }

    /// `PUT <endpoint>/<id>`; returns the updated entity if the server echoes it.
    pub async fn update<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        id: &str,
        body: &B,
    ) -> Result<Option<Value>, Error> {
        let url = self.item_url(endpoint, id)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_optional(resp).await
    }

    /// `DELETE <endpoint>/<id>`.
    pub async fn delete(&self, endpoint: &str, id: &str) -> Result<(), Error> {
        let url = self.item_url(endpoint, id)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_optional(resp).await.map(|_| ())
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            decode(body)
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    /// Success with an empty body (204, or 200 with no content) is `None`.
    async fn handle_optional(&self, resp: reqwest::Response) -> Result<Option<Value>, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(body).map(Some)
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let path = resp.url().path().to_owned();
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        let message = parsed
            .as_ref()
            .and_then(ErrorResponse::text)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.clone()
                }
            });

        match status.as_u16() {
            401 => Error::Unauthorized { message },
            404 => Error::NotFound { path },
            400 | 422 => Error::Validation {
                message,
                fields: parsed
                    .as_ref()
                    .map(ErrorResponse::field_messages)
                    .unwrap_or_default(),
            },
            code => Error::Server {
                status: code,
                message,
            },
        }
    }
}

fn decode<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client =
            ApiClient::from_reqwest("https://hr.example.com/admin", reqwest::Client::new()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://hr.example.com/admin/");
        assert_eq!(
            client.url("/api/employees").unwrap().as_str(),
            "https://hr.example.com/admin/api/employees"
        );
    }

    #[test]
    fn item_url_appends_id() {
        let client = ApiClient::from_reqwest("https://hr.example.com", reqwest::Client::new()).unwrap();
        assert_eq!(
            client.item_url("api/positions/", "42").unwrap().as_str(),
            "https://hr.example.com/api/positions/42"
        );
    }

    #[test]
    fn field_messages_flatten() {
        let body: ErrorResponse = serde_json::from_str(
            r#"{"title":"One or more validation errors occurred.","errors":{"Name":["Required"],"Code":"Too long"}}"#,
        )
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("One or more validation errors occurred."));
        let mut fields = body.field_messages();
        fields.sort();
        assert_eq!(
            fields,
            vec![
                ("Code".to_owned(), "Too long".to_owned()),
                ("Name".to_owned(), "Required".to_owned()),
            ]
        );
    }
}
