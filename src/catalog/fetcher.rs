use crate::catalog::{CategoryDescriptor, ListItem};
use crate::util::{read_limited_body, strip_control_chars, BodyReadError};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors from a single category fetch.
///
/// The `Display` text is what a row shows to the user, so it always carries
/// the underlying failure's description. Request URLs are stripped from
/// network errors because they contain the API key.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, body read)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// Body was not JSON
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// The base URL cannot carry path segments (e.g. `data:` URLs)
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl FetchError {
    fn network(err: reqwest::Error) -> Self {
        FetchError::Network(err.without_url())
    }
}

impl From<BodyReadError> for FetchError {
    fn from(err: BodyReadError) -> Self {
        match err {
            BodyReadError::TooLarge { .. } => FetchError::ResponseTooLarge,
            BodyReadError::Network(e) => FetchError::Network(e),
        }
    }
}

/// Fetches one category of movies from the TMDB v3 API.
///
/// Cheap to clone: the HTTP client and key are shared. Each call to
/// [`CategoryFetcher::fetch`] performs exactly one GET with no retry; the
/// only timeout is the one configured on the client.
#[derive(Clone)]
pub struct CategoryFetcher {
    client: reqwest::Client,
    base_url: Url,
    api_key: Arc<SecretString>,
}

impl std::fmt::Debug for CategoryFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryFetcher")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl CategoryFetcher {
    /// `base_url` should already be validated (see [`crate::util::validate_base_url`]).
    pub fn new(client: reqwest::Client, base_url: Url, api_key: SecretString) -> Self {
        Self {
            client,
            base_url,
            api_key: Arc::new(api_key),
        }
    }

    /// Builds the request URL for a descriptor.
    ///
    /// Unfiltered: `{base}/{endpoint_path}?api_key=K`.
    /// Filtered by genre `g`: the same plus
    /// `with_genres=g&sort_by=popularity.desc&page=1`.
    pub fn request_url(&self, descriptor: &CategoryDescriptor) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FetchError::InvalidEndpoint(format!("{} cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty();
            for segment in descriptor.endpoint_path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", self.api_key.expose_secret());
            if let Some(genre) = descriptor.filter_id {
                query
                    .append_pair("with_genres", &genre.to_string())
                    .append_pair("sort_by", "popularity.desc")
                    .append_pair("page", "1");
            }
        }

        Ok(url)
    }

    /// Fetches and normalizes one category.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - connection, TLS or body read failure
    /// - [`FetchError::ResponseTooLarge`] - body over 10MB
    /// - [`FetchError::Parse`] - body is not JSON
    ///
    /// A JSON body without a usable `results` array is not an error: it
    /// yields an empty list. Non-2xx bodies are parsed the same way, so a
    /// TMDB error envelope (bad key, unknown resource) gives an empty list
    /// and a warning carrying its `status_message`.
    pub async fn fetch(&self, descriptor: &CategoryDescriptor) -> Result<Vec<ListItem>, FetchError> {
        let url = self.request_url(descriptor)?;

        tracing::debug!(
            row = %descriptor.label,
            endpoint = %descriptor.endpoint_path,
            filter_id = ?descriptor.filter_id,
            "Fetching category"
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::network)?;

        let status = response.status();
        let bytes = read_limited_body(response, MAX_BODY_SIZE).await?;
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(
                row = %descriptor.label,
                status = status.as_u16(),
                message = body.get("status_message").and_then(serde_json::Value::as_str),
                "Catalog request rejected"
            );
        }

        let items = parse_results(&body);

        tracing::debug!(row = %descriptor.label, count = items.len(), "Category fetched");
        Ok(items)
    }
}

/// Extracts `ListItem`s from a TMDB list response.
///
/// Missing or non-array `results` yields an empty list. Entries that are
/// not objects or have no usable `id` are skipped, since items are keyed by
/// id when rendered.
pub fn parse_results(body: &Value) -> Vec<ListItem> {
    let Some(entries) = body.get("results").and_then(Value::as_array) else {
        tracing::debug!("Response has no results array, treating as empty");
        return Vec::new();
    };

    let items: Vec<ListItem> = entries.iter().filter_map(parse_entry).collect();
    if items.len() < entries.len() {
        tracing::debug!(
            skipped = entries.len() - items.len(),
            "Skipped result entries without an id"
        );
    }
    items
}

fn parse_entry(entry: &Value) -> Option<ListItem> {
    let obj = entry.as_object()?;

    let id = match obj.get("id")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) if !s.is_empty() => s.clone(),
        _ => return None,
    };

    // Movies carry `title`, TV entries in trending lists carry `name`
    let title = non_empty_str(obj, "title")
        .or_else(|| non_empty_str(obj, "name"))
        .unwrap_or_default();

    Some(ListItem {
        id,
        title: strip_control_chars(title).into_owned(),
        image_path: non_empty_str(obj, "poster_path").map(str::to_owned),
    })
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(base: &str) -> CategoryFetcher {
        CategoryFetcher::new(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            SecretString::from("test-key"),
        )
    }

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_unfiltered_url_has_only_api_key() {
        let fetcher = fetcher_for("https://api.themoviedb.org/3");
        let url = fetcher
            .request_url(&CategoryDescriptor::new("Popular", "movie/popular"))
            .unwrap();
        assert_eq!(url.path(), "/3/movie/popular");
        assert_eq!(query_pairs(&url), vec![("api_key".into(), "test-key".into())]);
    }

    #[test]
    fn test_filtered_url_adds_genre_sort_and_page() {
        let fetcher = fetcher_for("https://api.themoviedb.org/3");
        let url = fetcher
            .request_url(&CategoryDescriptor::new("Action", "discover/movie").with_filter(28))
            .unwrap();
        assert_eq!(url.path(), "/3/discover/movie");
        assert_eq!(
            query_pairs(&url),
            vec![
                ("api_key".into(), "test-key".into()),
                ("with_genres".into(), "28".into()),
                ("sort_by".into(), "popularity.desc".into()),
                ("page".into(), "1".into()),
            ]
        );
    }

    #[test]
    fn test_url_on_root_base() {
        let fetcher = fetcher_for("http://127.0.0.1:8080");
        let url = fetcher
            .request_url(&CategoryDescriptor::new("Trending", "/trending/movie/week"))
            .unwrap();
        assert_eq!(url.path(), "/trending/movie/week");
    }

    #[test]
    fn test_debug_masks_key() {
        let out = format!("{:?}", fetcher_for("https://api.themoviedb.org/3"));
        assert!(!out.contains("test-key"));
    }

    #[test]
    fn test_parse_results_maps_fields() {
        let body = json!({
            "results": [
                {"id": 1, "title": "X", "poster_path": "/a.jpg"},
                {"id": 2, "name": "Show", "poster_path": ""},
                {"id": 3, "title": "", "name": "Fallback", "poster_path": null},
            ]
        });
        assert_eq!(
            parse_results(&body),
            vec![
                ListItem { id: "1".into(), title: "X".into(), image_path: Some("/a.jpg".into()) },
                ListItem { id: "2".into(), title: "Show".into(), image_path: None },
                ListItem { id: "3".into(), title: "Fallback".into(), image_path: None },
            ]
        );
    }

    #[test]
    fn test_parse_results_absent_or_malformed_is_empty() {
        assert!(parse_results(&json!({})).is_empty());
        assert!(parse_results(&json!({"results": null})).is_empty());
        assert!(parse_results(&json!({"results": "nope"})).is_empty());
        assert!(parse_results(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_parse_results_skips_entries_without_id() {
        let body = json!({"results": [{"title": "No id"}, 42, {"id": "tt1", "title": "Ok"}]});
        let items = parse_results(&body);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "tt1");
    }

    #[test]
    fn test_parse_results_strips_control_chars() {
        let body = json!({"results": [{"id": 9, "title": "\u{1b}[2JEvil"}]});
        assert_eq!(parse_results(&body)[0].title, "Evil");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("with_genres", "28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "results": [{"id": 1, "title": "X", "poster_path": "/a.jpg"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server.uri());
        let items = fetcher
            .fetch(&CategoryDescriptor::new("Action", "discover/movie").with_filter(28))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image_path.as_deref(), Some("/a.jpg"));
    }

    #[tokio::test]
    async fn test_fetch_rejected_key_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status_code": 7,
                "status_message": "Invalid API key: You must be granted a valid key.",
                "success": false
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let items = fetcher_for(&mock_server.uri())
            .fetch(&CategoryDescriptor::new("Popular", "movie/popular"))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_status_still_reads_results() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "results": [{"id": 5, "title": "Stray"}]
            })))
            .mount(&mock_server)
            .await;

        let items = fetcher_for(&mock_server.uri())
            .fetch(&CategoryDescriptor::new("Popular", "movie/popular"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Stray");
    }

    #[tokio::test]
    async fn test_fetch_500_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = fetcher_for(&mock_server.uri())
            .fetch(&CategoryDescriptor::new("Popular", "movie/popular"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_oversized_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(" ".repeat(MAX_BODY_SIZE + 1)),
            )
            .mount(&mock_server)
            .await;

        let err = fetcher_for(&mock_server.uri())
            .fetch(&CategoryDescriptor::new("Popular", "movie/popular"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ResponseTooLarge));
    }

    #[tokio::test]
    async fn test_fetch_non_json_is_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let err = fetcher_for(&mock_server.uri())
            .fetch(&CategoryDescriptor::new("Popular", "movie/popular"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_without_results_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": 1})))
            .mount(&mock_server)
            .await;

        let items = fetcher_for(&mock_server.uri())
            .fetch(&CategoryDescriptor::new("Popular", "movie/popular"))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_network_error_hides_api_key() {
        // Bind then release a port so nothing is listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = fetcher_for(&uri)
            .fetch(&CategoryDescriptor::new("Popular", "movie/popular"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn unfiltered_requests_carry_only_the_key(path in "[a-z]{1,8}(/[a-z]{1,8}){0,2}") {
                let fetcher = fetcher_for("https://api.themoviedb.org/3");
                let url = fetcher.request_url(&CategoryDescriptor::new("Row", path.clone())).unwrap();
                prop_assert_eq!(url.path(), format!("/3/{}", path));
                let pairs = query_pairs(&url);
                prop_assert_eq!(pairs, vec![("api_key".to_string(), "test-key".to_string())]);
            }

            #[test]
            fn filtered_requests_carry_genre_sort_and_page(genre in any::<u32>()) {
                let fetcher = fetcher_for("https://api.themoviedb.org/3");
                let descriptor = CategoryDescriptor::new("Row", "discover/movie").with_filter(genre);
                let url = fetcher.request_url(&descriptor).unwrap();
                let pairs = query_pairs(&url);
                let genre_str = genre.to_string();
                prop_assert!(pairs.contains(&("with_genres".to_string(), genre_str)));
                prop_assert!(pairs.contains(&("sort_by".to_string(), "popularity.desc".to_string())));
                prop_assert!(pairs.contains(&("page".to_string(), "1".to_string())));
            }
        }
    }
}
