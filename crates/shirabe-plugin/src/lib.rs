pub use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Key/value configuration handed to inspectors by the host.
#[derive(Clone)]
pub struct InspectorArgs {
    inner: HashMap<String, String>,
}

impl InspectorArgs {
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.to_string())
    }

    pub fn env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    /// Netrc-style credential lookup for a machine name.
    ///
    /// Tries the explicit arguments `{machine}.username` / `{machine}.password`
    /// first, then the environment variables `{MACHINE}_USERNAME` /
    /// `{MACHINE}_PASSWORD`. Yields a pair only when both halves resolve.
    pub fn login_info(&self, machine: &str) -> Option<(String, String)> {
        let env_machine = env_key(machine);
        let username = self
            .get(&format!("{machine}.username"))
            .or_else(|| self.env(&format!("{env_machine}_USERNAME")))?;
        let password = self
            .get(&format!("{machine}.password"))
            .or_else(|| self.env(&format!("{env_machine}_PASSWORD")))?;
        Some((username, password))
    }

    pub fn from_key_value(input: &[String]) -> Self {
        let args: HashMap<String, String> = input
            .iter()
            .map(|s| {
                let (key, value) = s.split_once('=').unwrap();
                (key.to_string(), value.to_string())
            })
            .collect();
        Self { inner: args }
    }
}

fn env_key(machine: &str) -> String {
    machine
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub trait InspectorBuilder {
    fn name(&self) -> String;

    fn help(&self) -> Vec<String> {
        vec!["No help available".to_string()]
    }

    fn build(&self, args: &InspectorArgs) -> anyhow::Result<Box<dyn Inspect>>;
}

#[async_trait]
pub trait Inspect: Send + Sync {
    /// Check if this handler can handle the URL
    async fn matches(&self, url: &str) -> bool;

    /// Inspect the URL and return the result
    async fn inspect(&self, url: &str) -> anyhow::Result<InspectResult>;
}

#[derive(Serialize, Deserialize, Debug)]
pub enum InspectResult {
    /// This site handler can not handle this URL
    NotMatch,
    /// Inspect data is found
    Playlist(InspectPlaylist),
    /// Multiple URLs are found, each to be inspected separately
    Queue(InspectQueue),
    /// Redirect happens
    Redirect(String),
    /// Inspect data is not found
    None,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub enum PlaylistType {
    #[default]
    HLS,
    DASH,
    /// A raw media file with the given extension
    Raw(String),
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InspectPlaylist {
    /// Metadata of the resource
    pub title: Option<String>,

    /// URL of the playlist
    pub playlist_url: String,

    /// Type of the playlist
    pub playlist_type: PlaylistType,

    /// Key used to decrypt the media
    pub key: Option<String>,

    /// Headers to use when requesting
    pub headers: Vec<String>,

    /// Cookies to use when requesting
    pub cookies: Vec<String>,

    /// Initial data of the playlist
    ///
    /// Inspector may have already sent a request to the server, in which case we can reuse the data
    pub initial_playlist_data: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InspectQueue {
    /// Identifier of the expanded resource
    pub id: Option<String>,

    /// Metadata of the resource
    pub title: Option<String>,

    /// Deferred references, resolved by running inspection on each of them
    pub entries: Vec<String>,
}

/// Ordered collection of inspector builders and the dispatch loop over them.
#[derive(Default)]
pub struct Inspectors {
    builders: Vec<Box<dyn InspectorBuilder>>,
}

impl Inspectors {
    pub fn new() -> Self {
        Self {
            builders: Vec::new(),
        }
    }

    pub fn add(&mut self, builder: impl InspectorBuilder + 'static) -> &mut Self {
        self.builders.push(Box::new(builder));
        self
    }

    pub fn help(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for builder in &self.builders {
            lines.push(format!("[{}]", builder.name()));
            lines.extend(builder.help());
            lines.push(String::new());
        }
        lines
    }

    /// Walk the inspectors in registration order and return the first result.
    ///
    /// A `Redirect` substitutes the URL for the inspectors that follow; it does
    /// not restart the walk.
    pub async fn inspect(
        &self,
        url: &str,
        args: &InspectorArgs,
    ) -> anyhow::Result<(String, InspectResult)> {
        let mut inspectors = Vec::with_capacity(self.builders.len());
        for builder in &self.builders {
            inspectors.push((builder.name(), builder.build(args)?));
        }

        let mut url = Cow::Borrowed(url);
        for (name, inspector) in inspectors {
            if inspector.matches(&url).await {
                match inspector.inspect(&url).await? {
                    InspectResult::NotMatch => continue,
                    InspectResult::Redirect(redirect_url) => {
                        url = Cow::Owned(redirect_url);
                    }
                    result @ (InspectResult::Playlist(_) | InspectResult::Queue(_)) => {
                        return Ok((name, result))
                    }
                    InspectResult::None => anyhow::bail!("Not found"),
                }
            }
        }

        anyhow::bail!("No inspector matched")
    }
}
