pub mod spotify;
pub mod youtube;

use std::future::Future;

use crate::error::resolve::{
    AcquisitionFailure, InvalidTrackUrl, LookupError, Provider, ResolveError,
};

/// How the direct-stream provider classifies a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Video,
    Other,
    Invalid,
}

/// Name and primary artist of a track, as reported by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub name: String,
    pub artist: String,
}

impl TrackMetadata {
    pub fn query(&self) -> String {
        format!("{} {}", self.name, self.artist)
    }
}

pub trait DirectSource: Send + Sync {
    type Resource: Send;

    fn validate(&self, url: &str) -> UrlKind;
    fn open(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Resource, AcquisitionFailure>> + Send;
}

pub trait MetadataSource: Send + Sync {
    fn track(&self, id: &str) -> impl Future<Output = Result<TrackMetadata, LookupError>> + Send;
}

pub trait SearchSource: Send + Sync {
    /// Returns a playable URL for the best match of `query`, if there is one.
    fn search(&self, query: &str)
    -> impl Future<Output = Result<Option<String>, LookupError>> + Send;
}

pub trait Resolve: Send + Sync + 'static {
    type Resource: Send + 'static;

    fn resolve(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Resource, ResolveError>> + Send;
}

/// Turns an arbitrary URL into a playable resource: direct sources first,
/// then metadata-only links mapped onto a direct source through search.
pub struct TrackResolver<D, M, S> {
    direct: D,
    metadata: M,
    search: S,
}

impl<D, M, S> TrackResolver<D, M, S> {
    pub const fn new(direct: D, metadata: M, search: S) -> Self {
        Self {
            direct,
            metadata,
            search,
        }
    }
}

impl<D: DirectSource, M: MetadataSource, S: SearchSource> TrackResolver<D, M, S> {
    async fn open_direct(&self, url: &str) -> Result<D::Resource, ResolveError> {
        match self.direct.validate(url) {
            UrlKind::Video => Ok(self.direct.open(url).await?),
            UrlKind::Other | UrlKind::Invalid => Err(InvalidTrackUrl::Unsupported.into()),
        }
    }
}

impl<D, M, S> Resolve for TrackResolver<D, M, S>
where
    D: DirectSource + 'static,
    D::Resource: 'static,
    M: MetadataSource + 'static,
    S: SearchSource + 'static,
{
    type Resource = D::Resource;

    #[tracing::instrument(skip(self), err, name = "resolve")]
    async fn resolve(&self, url: &str) -> Result<Self::Resource, ResolveError> {
        if self.direct.validate(url) == UrlKind::Video {
            return Ok(self.direct.open(url).await?);
        }

        if !spotify::is_track_url(url) {
            return Err(InvalidTrackUrl::Unsupported.into());
        }
        let id = spotify::track_id(url).ok_or(InvalidTrackUrl::MissingTrackId)?;

        let metadata = self
            .metadata
            .track(id)
            .await
            .map_err(|source| ResolveError::Lookup {
                provider: Provider::Spotify,
                source,
            })?;

        let query = metadata.query();
        let found = self
            .search
            .search(&query)
            .await
            .map_err(|source| ResolveError::Lookup {
                provider: Provider::YouTube,
                source,
            })?
            .ok_or_else(|| ResolveError::NoMatchFound {
                query: query.clone(),
            })?;
        tracing::debug!(%query, %found, "mapped metadata-only link");

        self.open_direct(&found).await
    }
}
