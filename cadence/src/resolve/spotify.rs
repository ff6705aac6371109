use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{
    core::{
        konst::provider::{SPOTIFY_API_URL, SPOTIFY_TOKEN_TTL, SPOTIFY_TOKEN_URL},
        statik::regex,
    },
    error::resolve::LookupError,
};

use super::{MetadataSource, TrackMetadata};

pub fn is_track_url(url: &str) -> bool {
    regex::SPOTIFY_TRACK_URL.is_match(url)
}

pub fn track_id(url: &str) -> Option<&str> {
    regex::SPOTIFY_TRACK
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| ::regex::Match::as_str(&m))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TrackResponse {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistResponse>,
}

#[derive(Deserialize)]
struct ArtistResponse {
    name: String,
}

impl TryFrom<TrackResponse> for TrackMetadata {
    type Error = LookupError;

    fn try_from(value: TrackResponse) -> Result<Self, Self::Error> {
        let artist = value
            .artists
            .into_iter()
            .next()
            .ok_or(LookupError::MissingArtist)?
            .name;
        Ok(Self {
            name: value.name,
            artist,
        })
    }
}

struct Credentials {
    client_id: String,
    client_secret: String,
}

struct Endpoints {
    token: String,
    api: String,
}

/// The metadata provider, backed by the Spotify Web API using the
/// client-credentials grant. The access token is cached and re-acquired once
/// it goes stale.
#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    credentials: Arc<Credentials>,
    endpoints: Arc<Endpoints>,
    token: Cache<(), Arc<str>>,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self::with_endpoints(
            http,
            client_id,
            client_secret,
            Endpoints {
                token: SPOTIFY_TOKEN_URL.to_owned(),
                api: SPOTIFY_API_URL.to_owned(),
            },
        )
    }

    fn with_endpoints(
        http: reqwest::Client,
        client_id: String,
        client_secret: String,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            http,
            credentials: Arc::new(Credentials {
                client_id,
                client_secret,
            }),
            endpoints: Arc::new(endpoints),
            token: Cache::builder()
                .max_capacity(1)
                .time_to_live(SPOTIFY_TOKEN_TTL)
                .build(),
        }
    }

    /// Acquires an access token ahead of the first lookup.
    pub async fn warm_up(&self) {
        if let Err(error) = self.token().await {
            tracing::error!(%error, "retrieving a spotify access token failed");
        }
    }

    async fn token(&self) -> Result<Arc<str>, Arc<reqwest::Error>> {
        self.token.try_get_with((), self.authenticate()).await
    }

    #[tracing::instrument(skip_all, err, name = "spotify_authenticate")]
    async fn authenticate(&self) -> Result<Arc<str>, reqwest::Error> {
        let response = self
            .http
            .post(&self.endpoints.token)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;

        tracing::debug!("acquired a new spotify access token");
        Ok(response.access_token.into())
    }

    async fn fetch_track(&self, id: &str) -> Result<reqwest::Response, LookupError> {
        let token = self.token().await?;
        Ok(self
            .http
            .get(format!("{}/tracks/{id}", self.endpoints.api))
            .bearer_auth(&token)
            .send()
            .await?)
    }
}

impl MetadataSource for SpotifyClient {
    #[tracing::instrument(skip(self), err, name = "spotify_track")]
    async fn track(&self, id: &str) -> Result<TrackMetadata, LookupError> {
        let mut response = self.fetch_track(id).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("spotify rejected the cached access token");
            self.token.invalidate(&()).await;
            response = self.fetch_track(id).await?;
        }

        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST
        ) {
            return Err(LookupError::NotFound);
        }

        response
            .error_for_status()?
            .json::<TrackResponse>()
            .await?
            .try_into()
    }
}
