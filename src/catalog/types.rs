use serde::{Deserialize, Serialize};

/// Which remote collection one home screen row shows.
///
/// Two descriptors are the same row when all three fields match; a row
/// only re-fetches when it is handed a descriptor that differs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryDescriptor {
    pub label: String,
    /// Path under the catalog base URL, e.g. `movie/popular`.
    pub endpoint_path: String,
    /// TMDB genre id. When set, the request is filtered by genre and sorted
    /// by popularity.
    #[serde(default)]
    pub filter_id: Option<u32>,
}

impl CategoryDescriptor {
    pub fn new(label: impl Into<String>, endpoint_path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            endpoint_path: endpoint_path.into(),
            filter_id: None,
        }
    }

    pub fn with_filter(mut self, filter_id: u32) -> Self {
        self.filter_id = Some(filter_id);
        self
    }
}

/// One poster in a row, normalized from a TMDB result entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub id: String,
    pub title: String,
    /// TMDB `poster_path`, e.g. `/a.jpg`. `None` when the source was empty.
    pub image_path: Option<String>,
}

impl ListItem {
    /// Full poster URL for this item, if it has one.
    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        self.image_path
            .as_deref()
            .map(|path| poster_url(image_base, path))
    }
}

/// Joins a poster path onto the image base (`https://image.tmdb.org/t/p/w500`).
pub fn poster_url(image_base: &str, image_path: &str) -> String {
    format!("{}{}", image_base, image_path)
}

/// The rows shown on the home screen when the config does not override them.
pub fn default_rows() -> Vec<CategoryDescriptor> {
    vec![
        CategoryDescriptor::new("Trending", "trending/movie/week"),
        CategoryDescriptor::new("Popular", "movie/popular"),
        CategoryDescriptor::new("Action", "discover/movie").with_filter(28),
        CategoryDescriptor::new("Comedy", "discover/movie").with_filter(35),
        CategoryDescriptor::new("Drama", "discover/movie").with_filter(18),
    ]
}
