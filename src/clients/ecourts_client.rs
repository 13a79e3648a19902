//! Court portal HTTP client
//!
//! Wraps all raw HTTP traffic with the upstream portal. Each instance owns
//! its own cookie store, so two clients never share an upstream session.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{RequestBuilder, Url};
use tracing::debug;

use crate::clients::response::UpstreamResponse;
use crate::config::Config;
use crate::error::{AppError, AppResult};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Court portal client
pub struct EcourtsClient {
    http: reqwest::Client,
    base_url: String,
}

impl EcourtsClient {
    /// Create a client with a fresh, empty cookie store
    pub fn new(config: &Config) -> AppResult<Self> {
        let base_url = config.base_url().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Ok(origin) = HeaderValue::from_str(&base_url) {
            headers.insert("Origin", origin);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser-visible URL of a portal page (`?p=<page>`)
    pub fn page_url(&self, page: &str) -> String {
        format!("{}/?p={}", self.base_url, page)
    }

    /// Resolve a possibly relative link found in upstream markup
    pub fn resolve(&self, link: &str) -> AppResult<String> {
        let base = Url::parse(&format!("{}/", self.base_url))
            .map_err(|e| AppError::Config(format!("invalid base url {}: {}", self.base_url, e)))?;
        base.join(link)
            .map(|u| u.to_string())
            .map_err(|e| AppError::shape_changed(link, format!("unresolvable link: {}", e)))
    }

    /// GET an absolute URL
    pub async fn get_url(&self, url: &str, referer: Option<&str>) -> AppResult<UpstreamResponse> {
        debug!("GET {}", url);
        let request = self.with_referer(self.http.get(url), referer);
        self.send(url, request).await
    }

    /// GET a portal page with extra query parameters
    pub async fn get_page(
        &self,
        page: &str,
        query: &[(&str, String)],
        referer: Option<&str>,
    ) -> AppResult<UpstreamResponse> {
        let url = format!("{}/", self.base_url);
        debug!("GET ?p={} {:?}", page, query.iter().map(|(k, _)| *k).collect::<Vec<_>>());
        let request = self
            .http
            .get(&url)
            .query(&[("p", page)])
            .query(query);
        self.send(page, self.with_referer(request, referer)).await
    }

    /// POST a form to a portal endpoint (`?p=<page>`)
    pub async fn post_form(&self, page: &str, form: &[(&str, String)]) -> AppResult<UpstreamResponse> {
        let url = format!("{}/", self.base_url);
        debug!("POST ?p={} fields={:?}", page, form.iter().map(|(k, _)| *k).collect::<Vec<_>>());
        let referer = self.page_url("cause_list/");
        let request = self
            .http
            .post(&url)
            .query(&[("p", page)])
            .form(form);
        self.send(page, self.with_referer(request, Some(&referer))).await
    }

    fn with_referer(&self, request: RequestBuilder, referer: Option<&str>) -> RequestBuilder {
        match referer {
            Some(r) => request.header(REFERER, r),
            None => request.header(REFERER, format!("{}/", self.base_url)),
        }
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<UpstreamResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream_unavailable(endpoint, e.to_string()))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::upstream_unavailable(endpoint, e.to_string()))?
            .to_vec();

        debug!("{} -> HTTP {} ({} bytes, {})", endpoint, status, body.len(), content_type);

        if status >= 500 {
            return Err(AppError::upstream_unavailable(
                endpoint,
                format!("HTTP {}", status),
            ));
        }

        Ok(UpstreamResponse {
            status,
            url,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EcourtsClient {
        let config = Config {
            upstream_base_url: "https://portal.example/ecourtindia_v6/".into(),
            ..Config::default()
        };
        EcourtsClient::new(&config).unwrap()
    }

    #[test]
    fn test_page_url() {
        assert_eq!(
            client().page_url("cause_list/"),
            "https://portal.example/ecourtindia_v6/?p=cause_list/"
        );
    }

    #[test]
    fn test_resolve_relative_captcha_link() {
        let c = client();
        assert_eq!(
            c.resolve("vendor/securimage/securimage_show.php?sid=1").unwrap(),
            "https://portal.example/ecourtindia_v6/vendor/securimage/securimage_show.php?sid=1"
        );
        assert_eq!(
            c.resolve("/ecourtindia_v6/securimage/securimage_show.php").unwrap(),
            "https://portal.example/ecourtindia_v6/securimage/securimage_show.php"
        );
    }
}
