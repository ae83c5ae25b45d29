use std::sync::LazyLock;

use regex::Regex;
use shirabe_plugin::*;

use crate::client::UnigeClient;
use crate::model::{CollectionUrl, PlayUrl};

static PLAY_URL_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://mediaserver\.unige\.ch/play/\d+").unwrap());

static COLLECTION_URL_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://mediaserver\.unige\.ch/collection/\d+").unwrap());

pub struct UnigeInspector;

impl InspectorBuilder for UnigeInspector {
    fn name(&self) -> String {
        "unige".to_string()
    }

    fn help(&self) -> Vec<String> {
        [
            "Extracts videos from the mediaserver of the University of Geneva.",
            "",
            "Available for URLs starting with:",
            "- https://mediaserver.unige.ch/play/",
            "",
            "Arguments:",
            "- unige_username: Username for access-restricted videos.",
            "- unige_password: Password for access-restricted videos.",
            "",
            "Credentials scoped to a single video win over the pair above:",
            "- unige-mediaserver-<id>.username / unige-mediaserver-<id>.password",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn build(&self, args: &InspectorArgs) -> anyhow::Result<Box<dyn Inspect>> {
        Ok(Box::new(UnigeInspectorImpl {
            username: args.get("unige_username"),
            password: args.get("unige_password"),
            args: args.clone(),
        }))
    }
}

struct UnigeInspectorImpl {
    username: Option<String>,
    password: Option<String>,
    args: InspectorArgs,
}

impl UnigeInspectorImpl {
    fn credentials(&self, page: &PlayUrl) -> Option<(String, String)> {
        self.args
            .login_info(&page.machine())
            .or_else(|| self.username.clone().zip(self.password.clone()))
    }
}

#[async_trait]
impl Inspect for UnigeInspectorImpl {
    async fn matches(&self, url: &str) -> bool {
        PLAY_URL_REGEXP.is_match(url)
    }

    async fn inspect(&self, url: &str) -> anyhow::Result<InspectResult> {
        let page = PlayUrl::parse(url)?;
        let login = self.credentials(&page);

        let client = UnigeClient::new();
        let video = client.extract_video(&page, login).await?;
        let playlist_type = media_playlist_type(&video.media_url);

        Ok(InspectResult::Playlist(InspectPlaylist {
            title: Some(video.title),
            playlist_url: video.media_url,
            playlist_type,
            ..Default::default()
        }))
    }
}

pub struct UnigeCollectionInspector;

impl InspectorBuilder for UnigeCollectionInspector {
    fn name(&self) -> String {
        "unige-collection".to_string()
    }

    fn help(&self) -> Vec<String> {
        [
            "Expands collections of the University of Geneva mediaserver",
            "into their videos, in feed order.",
            "",
            "Available for URLs starting with:",
            "- https://mediaserver.unige.ch/collection/",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn build(&self, _args: &InspectorArgs) -> anyhow::Result<Box<dyn Inspect>> {
        Ok(Box::new(UnigeCollectionInspectorImpl))
    }
}

struct UnigeCollectionInspectorImpl;

#[async_trait]
impl Inspect for UnigeCollectionInspectorImpl {
    async fn matches(&self, url: &str) -> bool {
        COLLECTION_URL_REGEXP.is_match(url)
    }

    async fn inspect(&self, url: &str) -> anyhow::Result<InspectResult> {
        let collection = CollectionUrl::parse(url)?;

        let client = UnigeClient::new();
        let collection = client.extract_collection(&collection).await?;

        Ok(InspectResult::Queue(InspectQueue {
            id: Some(collection.id),
            title: collection.title,
            entries: collection.entries,
        }))
    }
}

fn media_playlist_type(media_url: &str) -> PlaylistType {
    let extension = url::Url::parse(media_url).ok().and_then(|url| {
        let file = url
            .path_segments()?
            .rev()
            .find(|segment| !segment.is_empty())?
            .to_string();
        let (_, extension) = file.rsplit_once('.')?;
        Some(extension.to_ascii_lowercase())
    });

    match extension.as_deref() {
        Some("m3u8") => PlaylistType::HLS,
        Some("mpd") => PlaylistType::DASH,
        Some(extension) => PlaylistType::Raw(extension.to_string()),
        None => PlaylistType::Raw("mp4".to_string()),
    }
}
