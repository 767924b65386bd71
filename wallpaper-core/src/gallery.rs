//! Photo gallery models and the infinite-scroll feed state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{CanvasError, CanvasResult};

/// Photos requested per page when the caller does not say.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Image URLs for one photo at the sizes the photo service provides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoSource {
    /// Original upload.
    pub original: String,
    /// Double-density large.
    pub large2x: String,
    /// Large.
    pub large: String,
    /// Medium.
    pub medium: String,
    /// Small.
    pub small: String,
    /// Portrait crop.
    pub portrait: String,
    /// Landscape crop.
    pub landscape: String,
    /// Thumbnail.
    pub tiny: String,
}

/// A photo as returned by the photo service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Upstream photo ID.
    pub id: u64,
    /// Pixel width.
    #[serde(default)]
    pub width: u32,
    /// Pixel height.
    #[serde(default)]
    pub height: u32,
    /// Photo page URL.
    #[serde(default)]
    pub url: String,
    /// Photographer name.
    #[serde(default)]
    pub photographer: String,
    /// Photographer profile URL.
    #[serde(default)]
    pub photographer_url: String,
    /// Photographer ID.
    #[serde(default)]
    pub photographer_id: u64,
    /// Average color as hex.
    #[serde(default)]
    pub avg_color: Option<String>,
    /// Alt text.
    #[serde(default)]
    pub alt: String,
    /// Image URLs.
    #[serde(default)]
    pub src: PhotoSource,
}

/// One page of photo results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotosPage {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Photos on this page.
    #[serde(default)]
    pub photos: Vec<Photo>,
    /// Total matches, when known.
    #[serde(default)]
    pub total_results: u64,
    /// URL of the next page, absent on the last page.
    #[serde(default)]
    pub next_page: Option<String>,
    /// URL of the previous page.
    #[serde(default)]
    pub prev_page: Option<String>,
}

/// What the feed is listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FeedMode {
    /// Editor-curated photos.
    Curated,
    /// Free-text search.
    Search {
        /// Trimmed search query.
        query: String,
    },
}

/// A page the feed wants loaded next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Curated or search.
    pub mode: FeedMode,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Feed generation the request was issued for; bumped by every new
    /// search so late answers to an old query can be told apart.
    #[serde(default)]
    pub generation: u64,
}

/// Infinite-scroll state for the photo grid.
///
/// Pages are requested one at a time; a page whose photos were already seen
/// contributes only the new ones. Only the answer to the request currently
/// in flight is accepted.
#[derive(Debug, Clone)]
pub struct GalleryFeed {
    mode: FeedMode,
    per_page: u32,
    generation: u64,
    next_page: u32,
    has_more: bool,
    in_flight: Option<PageRequest>,
    photos: Vec<Photo>,
    seen: HashSet<u64>,
}

impl GalleryFeed {
    /// Feed of curated photos.
    #[must_use]
    pub fn curated(per_page: u32) -> Self {
        Self::with_mode(FeedMode::Curated, per_page, 0)
    }

    /// Feed of search results.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::EmptyQuery`] for blank queries.
    pub fn search(query: &str, per_page: u32) -> CanvasResult<Self> {
        Ok(Self::with_mode(search_mode(query)?, per_page, 0))
    }

    fn with_mode(mode: FeedMode, per_page: u32, generation: u64) -> Self {
        Self {
            mode,
            per_page: per_page.max(1),
            generation,
            next_page: 1,
            has_more: true,
            in_flight: None,
            photos: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Switch to a new search and start over.
    ///
    /// Any request still in flight becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::EmptyQuery`] for blank queries; the feed is
    /// left as it was.
    pub fn set_query(&mut self, query: &str) -> CanvasResult<()> {
        let mode = search_mode(query)?;
        *self = Self::with_mode(mode, self.per_page, self.generation.wrapping_add(1));
        Ok(())
    }

    /// The request to issue next, marking the feed as loading.
    ///
    /// Returns `None` while a request is in flight or once the last page
    /// has arrived.
    pub fn next_request(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() || !self.has_more {
            return None;
        }
        let request = PageRequest {
            mode: self.mode.clone(),
            page: self.next_page,
            per_page: self.per_page,
            generation: self.generation,
        };
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// Take in the page loaded for `request`. Returns how many new photos
    /// were appended.
    ///
    /// Pages for any request other than the one in flight (an old query, or
    /// nothing requested) are dropped and count as zero.
    pub fn receive_page(&mut self, request: &PageRequest, page: PhotosPage) -> usize {
        if self.in_flight.as_ref() != Some(request) {
            tracing::debug!(
                page = page.page,
                generation = request.generation,
                current = self.generation,
                "stale gallery page ignored"
            );
            return 0;
        }
        self.in_flight = None;
        self.next_page = page
            .next_page
            .as_deref()
            .and_then(page_from_url)
            .unwrap_or_else(|| page.page.saturating_add(1));
        self.has_more = page.next_page.is_some() && !page.photos.is_empty();

        let before = self.photos.len();
        for photo in page.photos {
            if self.seen.insert(photo.id) {
                self.photos.push(photo);
            }
        }
        let added = self.photos.len() - before;
        tracing::debug!(
            page = page.page,
            added,
            total = self.photos.len(),
            has_more = self.has_more,
            "gallery page received"
        );
        added
    }

    /// `request` failed; allow it to be retried. Failures of stale
    /// requests are ignored.
    pub fn fail(&mut self, request: &PageRequest) {
        if self.in_flight.as_ref() == Some(request) {
            self.in_flight = None;
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> &FeedMode {
        &self.mode
    }

    /// Photos loaded so far, without duplicates.
    #[must_use]
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Whether more pages may follow.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}

fn search_mode(query: &str) -> CanvasResult<FeedMode> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CanvasError::EmptyQuery);
    }
    Ok(FeedMode::Search {
        query: query.to_string(),
    })
}

/// Extract the `page` query parameter from a next-page URL.
fn page_from_url(url: &str) -> Option<u32> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: u64) -> Photo {
        Photo {
            id,
            width: 4000,
            height: 3000,
            url: format!("https://photos.example/{id}"),
            photographer: "Ada".into(),
            photographer_url: String::new(),
            photographer_id: 7,
            avg_color: Some("#336699".into()),
            alt: String::new(),
            src: PhotoSource::default(),
        }
    }

    fn page(number: u32, ids: &[u64], next: bool) -> PhotosPage {
        PhotosPage {
            page: number,
            per_page: 3,
            photos: ids.iter().copied().map(photo).collect(),
            total_results: 100,
            next_page: next.then(|| {
                format!(
                    "https://api.example/v1/search?page={}&per_page=3&query=nature",
                    number + 1
                )
            }),
            prev_page: None,
        }
    }

    #[test]
    fn pages_advance_and_dedupe() {
        let mut feed = GalleryFeed::search("Nature", 3).expect("feed");
        let first = feed.next_request().expect("request");
        assert_eq!(first.page, 1);
        assert!(feed.next_request().is_none());

        assert_eq!(feed.receive_page(&first, page(1, &[1, 2, 3], true)), 3);
        let second = feed.next_request().expect("request");
        assert_eq!(second.page, 2);
        assert_eq!(feed.receive_page(&second, page(2, &[3, 4, 5], true)), 2);

        let ids: Vec<u64> = feed.photos().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn last_page_stops_requests() {
        let mut feed = GalleryFeed::curated(3);
        let request = feed.next_request().expect("request");
        feed.receive_page(&request, page(1, &[1], false));
        assert!(!feed.has_more());
        assert!(feed.next_request().is_none());
    }

    #[test]
    fn failure_allows_retry() {
        let mut feed = GalleryFeed::curated(10);
        let first = feed.next_request().expect("request");
        feed.fail(&first);
        assert_eq!(feed.next_request(), Some(first));
    }

    #[test]
    fn late_page_from_previous_query_is_dropped() {
        let mut feed = GalleryFeed::search("cats", 3).expect("feed");
        let cats = feed.next_request().expect("request");
        feed.set_query("ocean").expect("query");

        assert_eq!(feed.receive_page(&cats, page(1, &[1, 2, 3], true)), 0);
        assert!(feed.photos().is_empty());
        assert!(feed.has_more());

        let ocean = feed.next_request().expect("request");
        assert_eq!(ocean.page, 1);
        assert_ne!(ocean.generation, cats.generation);
        feed.fail(&cats);
        assert!(feed.is_loading());
        assert_eq!(feed.receive_page(&ocean, page(1, &[7, 8], false)), 2);
    }

    #[test]
    fn unsolicited_page_is_dropped() {
        let mut feed = GalleryFeed::curated(3);
        let request = feed.next_request().expect("request");
        feed.receive_page(&request, page(1, &[1], true));

        assert_eq!(feed.receive_page(&request, page(1, &[1, 2], true)), 0);
        assert_eq!(feed.photos().len(), 1);
        assert!(!feed.is_loading());
    }

    #[test]
    fn next_page_link_with_fragment_and_reordered_params() {
        assert_eq!(page_from_url("https://api/x?per_page=3&page=2#top"), Some(2));
        assert_eq!(page_from_url("https://api/x?query=a%26page%3D9&page=4"), Some(4));
        assert_eq!(page_from_url("https://api/x?per_page=3"), None);
        assert_eq!(page_from_url("not a url?page=2"), None);
    }

    #[test]
    fn blank_query_is_rejected() {
        assert!(matches!(
            GalleryFeed::search("   ", 10),
            Err(CanvasError::EmptyQuery)
        ));
        let mut feed = GalleryFeed::curated(10);
        assert!(feed.set_query("").is_err());
        assert_eq!(feed.mode(), &FeedMode::Curated);
        feed.set_query("  ocean ").expect("query");
        assert_eq!(
            feed.mode(),
            &FeedMode::Search {
                query: "ocean".into()
            }
        );
    }

    #[test]
    fn parses_upstream_page_json() {
        let json = r#"{"page":1,"per_page":1,"total_results":5,
            "next_page":"https://api.example/v1/curated/?page=2&per_page=1",
            "photos":[{"id":42,"width":10,"height":20,"photographer":"Lin",
            "src":{"original":"https://img/42.jpg","tiny":"https://img/42t.jpg"}}]}"#;
        let page: PhotosPage = serde_json::from_str(json).expect("parse");
        assert_eq!(page.photos[0].src.tiny, "https://img/42t.jpg");
        assert_eq!(page_from_url(page.next_page.as_deref().expect("next")), Some(2));
    }
}
