use url::Url;

use crate::error::{UnigeError, UnigeResult};

/// A parsed `/play/<id>` page URL.
#[derive(Debug, Clone)]
pub struct PlayUrl {
    url: Url,
    id: String,
}

impl PlayUrl {
    pub fn parse(url: &str) -> UnigeResult<Self> {
        let parsed = Url::parse(url)?;
        let id = media_server_id(&parsed, "play")
            .ok_or_else(|| UnigeError::UnsupportedUrl(url.to_string()))?;
        Ok(Self { url: parsed, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Machine name under which credentials for this video are looked up.
    pub fn machine(&self) -> String {
        format!("unige-mediaserver-{}", self.id)
    }

    /// The endpoint that answers 401 when the video is gated, and accepts the
    /// login form when it is.
    pub fn secure_url(&self) -> String {
        format!(
            "{}/proxy/{id}/secure.php?view=play&id={id}",
            self.origin(),
            id = self.id
        )
    }
}

/// A parsed `/collection/<id>` page URL.
#[derive(Debug, Clone)]
pub struct CollectionUrl {
    url: Url,
    id: String,
}

impl CollectionUrl {
    pub fn parse(url: &str) -> UnigeResult<Self> {
        let parsed = Url::parse(url)?;
        let id = media_server_id(&parsed, "collection")
            .ok_or_else(|| UnigeError::UnsupportedUrl(url.to_string()))?;
        Ok(Self { url: parsed, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// The `.rss` sibling of the collection page.
    pub fn feed_url(&self) -> String {
        format!("{}/collection/{}.rss", self.origin(), self.id)
    }
}

fn media_server_id(url: &Url, kind: &str) -> Option<String> {
    let mut segments = url.path_segments()?;
    if segments.next()? != kind {
        return None;
    }
    let id = segments.next()?;
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// Playable video metadata, handed to the host for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub media_url: String,
}

/// An expanded collection: deferred video references in feed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub title: Option<String>,
    pub entries: Vec<String>,
}
