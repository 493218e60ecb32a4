// Request gateway: a small blocking HTTP client that talks to the queue
// service. Every call goes through `ApiClient::send`, which turns transport
// and decoding failures into a printed diagnostic plus `Ok(None)`, so the
// callers only deal with "got a result" or "didn't".

use crate::error::{ClientError, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use serde_json::Value;
use tracing::debug;

/// Request payload accepted by [`ApiClient::send`].
pub enum Body {
    Empty,
    /// Already JSON-encoded text.
    Json(String),
    Multipart(multipart::Form),
}

/// Blocking client bound to one service host. Paths passed to the
/// methods are relative to `http://<host>/srv/v1.0`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `host` (`host:port`, no scheme).
    pub fn new(host: &str) -> Result<Self> {
        let client = Client::builder().build().map_err(ClientError::Request)?;
        Ok(ApiClient {
            client,
            base_url: format!("http://{}/srv/v1.0", host),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and decode the JSON response as `T`.
    ///
    /// Connection problems, bodies that are not JSON and JSON of another
    /// shape than `T` are written to `out` and yield `Ok(None)`. A request
    /// that cannot even be built is returned as an error.
    pub fn send<T: DeserializeOwned>(
        &self,
        out: &mut dyn Write,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<Option<T>> {
        let url = self.url(path);
        debug!(%method, %url, "sending request");

        let builder = self.client.request(method, &url);
        let builder = match body {
            Body::Empty => builder,
            Body::Json(json) => builder.header(CONTENT_TYPE, "application/json").body(json),
            Body::Multipart(form) => builder.multipart(form),
        };
        let request = builder.build().map_err(ClientError::Request)?;

        let response = match self.client.execute(request) {
            Ok(response) => response,
            Err(e) => return connection_error(out, &e),
        };
        let raw = match response.text() {
            Ok(raw) => raw,
            Err(e) => return connection_error(out, &e),
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(%url, error = %e, "undecodable response");
                writeln!(out, "Invalid JSON received: {}", raw)?;
                return Ok(None);
            }
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                debug!(%url, error = %e, "unexpected response shape");
                writeln!(out, "Unexpected response: {}", raw)?;
                Ok(None)
            }
        }
    }

    pub fn get<T: DeserializeOwned>(&self, out: &mut dyn Write, path: &str) -> Result<Option<T>> {
        self.send(out, Method::GET, path, Body::Empty)
    }

    pub fn delete<T: DeserializeOwned>(
        &self,
        out: &mut dyn Write,
        path: &str,
    ) -> Result<Option<T>> {
        self.send(out, Method::DELETE, path, Body::Empty)
    }

    /// POST `payload` serialized as JSON.
    pub fn post_json<T, P>(&self, out: &mut dyn Write, path: &str, payload: &P) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let json = serde_json::to_string(payload)?;
        self.send(out, Method::POST, path, Body::Json(json))
    }

    /// POST a multipart form, used for raw file uploads.
    pub fn post_form<T: DeserializeOwned>(
        &self,
        out: &mut dyn Write,
        path: &str,
        form: multipart::Form,
    ) -> Result<Option<T>> {
        self.send(out, Method::POST, path, Body::Multipart(form))
    }
}

fn connection_error<T>(out: &mut dyn Write, e: &reqwest::Error) -> Result<Option<T>> {
    debug!(error = %e, "request failed");
    writeln!(out, "Connection error: {}", e)?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_includes_api_prefix() {
        let api = ApiClient::new("localhost:5000").unwrap();
        assert_eq!(api.url("/song"), "http://localhost:5000/srv/v1.0/song");
    }

    #[test]
    fn malformed_host_is_a_hard_failure() {
        let api = ApiClient::new("not a host:port").unwrap();
        let mut out = Vec::new();
        let err = api.get::<Value>(&mut out, "/song").unwrap_err();
        assert!(matches!(err, ClientError::Request(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn refused_connection_is_reported() {
        let api = ApiClient::new("127.0.0.1:1").unwrap();
        let mut out = Vec::new();
        let result = api.get::<Value>(&mut out, "/song").unwrap();
        assert!(result.is_none());
        assert!(String::from_utf8(out).unwrap().starts_with("Connection error: "));
    }

    #[allow(dead_code)]
    #[derive(Debug, serde::Deserialize)]
    struct Saved {
        saved: bool,
    }

    #[test]
    fn wrong_shape_is_not_reported_as_invalid_json() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/srv/v1.0/file")
            .with_body(r#"{"saved": "maybe"}"#)
            .create();
        server
            .mock("GET", "/srv/v1.0/song")
            .with_body("not json")
            .create();
        let api = ApiClient::new(&server.host_with_port()).unwrap();

        let mut out = Vec::new();
        assert!(api.get::<Saved>(&mut out, "/file").unwrap().is_none());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Unexpected response: {\"saved\": \"maybe\"}\n"
        );

        let mut out = Vec::new();
        assert!(api.get::<Value>(&mut out, "/song").unwrap().is_none());
        assert_eq!(String::from_utf8(out).unwrap(), "Invalid JSON received: not json\n");
    }
}
