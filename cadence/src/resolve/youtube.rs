use std::{borrow::Cow, sync::Arc};

use serde::Deserialize;

use crate::{
    core::{
        konst::provider::{YOUTUBE_SEARCH_URL, YOUTUBE_WATCH_URL},
        statik::regex,
    },
    error::resolve::LookupError,
};

use super::{SearchSource, UrlKind};

/// Classifies `url` as a YouTube video, anything else that may still be
/// playable (playlists, free text), or a malformed YouTube link.
pub fn validate(url: &str) -> UrlKind {
    let url = url.trim();

    if url.contains("list=") {
        if regex::YOUTUBE_PLAYLIST_URL.is_match(url) {
            return UrlKind::Other;
        }
        if let Cow::Owned(stripped) = regex::LIST_PARAMETER.replace(url, "") {
            return validate(&stripped);
        }
    }

    if !url.starts_with("https") {
        return if regex::YOUTUBE_VIDEO_ID.is_match(url) {
            UrlKind::Video
        } else {
            UrlKind::Other
        };
    }

    if !regex::YOUTUBE_VIDEO_URL.is_match(url) {
        return UrlKind::Invalid;
    }

    match video_id(url) {
        Some(id) if regex::YOUTUBE_VIDEO_ID.is_match(id) => UrlKind::Video,
        _ => UrlKind::Invalid,
    }
}

fn video_id(url: &str) -> Option<&str> {
    const PREFIXES: [&str; 5] = [
        "youtu.be/",
        "youtube.com/embed/",
        "youtube.com/shorts/",
        "youtube.com/live/",
        "watch?v=",
    ];

    let rest = PREFIXES
        .iter()
        .find_map(|prefix| url.split_once(prefix).map(|(_, rest)| rest))?;
    rest.split(['?', '/', '&']).next()
}

pub fn watch_url(id: &str) -> String {
    format!("{YOUTUBE_WATCH_URL}{id}")
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

/// The search provider, backed by the YouTube Data API.
#[derive(Clone)]
pub struct YouTubeSearch {
    http: reqwest::Client,
    api_key: Arc<str>,
}

impl YouTubeSearch {
    pub fn new(http: reqwest::Client, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }
}

impl SearchSource for YouTubeSearch {
    #[tracing::instrument(skip(self), err, name = "youtube_search")]
    async fn search(&self, query: &str) -> Result<Option<String>, LookupError> {
        let response = self
            .http
            .get(YOUTUBE_SEARCH_URL)
            .query(&[
                ("part", "id"),
                ("type", "video"),
                ("maxResults", "1"),
                ("q", query),
                ("key", self.api_key.as_ref()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;

        Ok(response
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .map(|id| watch_url(&id)))
    }
}
