use crate::extractor::{ExtractorError, MediaExtractor, ProbeKind};
use itertools::Itertools;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("{url} is not a valid URL: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{url} uses unsupported scheme {scheme:?}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("Could not read metadata for {url}: {source}")]
    Probe {
        url: String,
        #[source]
        source: ExtractorError,
    },

    #[error("{url} is a collection with no downloadable items")]
    EmptyCollection { url: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Single,
    Collection,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedSource {
    pub url: String,
    pub kind: SourceKind,
    pub title: Option<String>,
    /// Item URLs in collection order; a single item resolves to itself.
    pub items: Vec<String>,
    pub duration: Option<Duration>,
    pub size_estimate: Option<u64>,
}

pub fn validate_source_url(input: &str) -> Result<url::Url, ResolutionError> {
    let url = url::Url::parse(input.trim()).map_err(|source| ResolutionError::InvalidUrl {
        url: input.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ResolutionError::UnsupportedScheme {
            url: input.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

pub async fn resolve_source(
    extractor: &dyn MediaExtractor,
    input: &str,
) -> Result<ResolvedSource, ResolutionError> {
    let url = validate_source_url(input)?.to_string();

    tracing::info!(url = %url, "Analysing source");
    let info = extractor
        .probe(&url)
        .await
        .map_err(|source| ResolutionError::Probe {
            url: url.clone(),
            source,
        })?;

    let (kind, items) = match info.kind {
        ProbeKind::Single => (SourceKind::Single, vec![url.clone()]),
        ProbeKind::Collection { members } => {
            let members: Vec<String> = members.into_iter().unique().collect();
            if members.is_empty() {
                return Err(ResolutionError::EmptyCollection { url });
            }
            (SourceKind::Collection, members)
        }
    };

    tracing::info!(
        url = %url,
        kind = ?kind,
        items = items.len(),
        title = info.title.as_deref().unwrap_or("<untitled>"),
        "Source resolved"
    );

    Ok(ResolvedSource {
        url,
        kind,
        title: info.title,
        items,
        duration: info.duration,
        size_estimate: info.size_estimate,
    })
}
