use std::sync::{Arc, LazyLock};

use fake_user_agent::get_chrome_rua;
use regex::Regex;
use reqwest::{header::REFERER, Client, StatusCode};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use url::Url;

use crate::error::{UnigeError, UnigeResult};
use crate::model::{Collection, CollectionUrl, PlayUrl, Video};

static MEDIA_SOURCE_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<source src="([^"]+)""#).unwrap());

static PAGE_TITLE_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title>(.*?)</title>").unwrap());

static FEED_TITLE_REGEXP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<title>\s*(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?\s*</title>").unwrap()
});

static FEED_ITEM_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").unwrap());

static FEED_LINK_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<link>\s*(.*?)\s*</link>").unwrap());

pub struct UnigeClient {
    client: Client,
}

impl UnigeClient {
    pub fn new() -> Self {
        // A successful login lives in session cookies; they must survive
        // until the page is fetched again.
        let cookies = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let client = Client::builder()
            .user_agent(get_chrome_rua())
            .cookie_provider(cookies)
            .build()
            .unwrap();

        Self { client }
    }

    /// Extract the playable media record from a `/play/<id>` page.
    ///
    /// `login` is consulted only when the secure probe says the video is
    /// gated; a gated video without credentials fails with
    /// [`UnigeError::LoginRequired`].
    pub async fn extract_video(
        &self,
        page: &PlayUrl,
        login: Option<(String, String)>,
    ) -> UnigeResult<Video> {
        let mut body = self.video_page(page).await?;

        if self.needs_login(page).await? {
            log::info!("authentication required for video {}", page.id());
            let Some((username, password)) = login else {
                return Err(UnigeError::LoginRequired(page.machine()));
            };
            self.login(page, &username, &password).await?;
            // The gated body carries no media source; fetch once more now
            // that the session is authenticated.
            body = self.video_page(page).await?;
        }

        let media_url = extract_media_url(&body, page.url())?;
        let title = extract_title(&body).unwrap_or_else(|| format!("Video {}", page.id()));

        Ok(Video {
            id: page.id().to_string(),
            title,
            media_url,
        })
    }

    /// Expand a `/collection/<id>` page through its RSS feed.
    pub async fn extract_collection(&self, collection: &CollectionUrl) -> UnigeResult<Collection> {
        let feed = self.collection_feed(collection).await?;
        let (title, entries) = parse_collection_feed(&feed);
        log::debug!(
            "collection {} expanded to {} entries",
            collection.id(),
            entries.len()
        );

        Ok(Collection {
            id: collection.id().to_string(),
            title,
            entries,
        })
    }

    async fn video_page(&self, page: &PlayUrl) -> UnigeResult<String> {
        let response = self.client.get(page.url().clone()).send().await?;
        if !response.status().is_success() {
            return Err(UnigeError::HttpError(response.status()));
        }
        Ok(response.text().await?)
    }

    /// Probe the secure endpoint. Whether a video is gated varies from one
    /// video to the next; only a 401 answer means a login stands in the way.
    async fn needs_login(&self, page: &PlayUrl) -> UnigeResult<bool> {
        let response = self.client.get(page.secure_url()).send().await?;
        log::debug!("secure probe for video {}: {}", page.id(), response.status());
        Ok(response.status() == StatusCode::UNAUTHORIZED)
    }

    async fn login(&self, page: &PlayUrl, username: &str, password: &str) -> UnigeResult<()> {
        let secure_url = page.secure_url();
        let response = self
            .client
            .post(&secure_url)
            .header(REFERER, &secure_url)
            .form(&[("httpd_username", username), ("httpd_password", password)])
            .send()
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST => Err(UnigeError::LoginFailed),
            status if !status.is_success() => Err(UnigeError::HttpError(status)),
            _ => {
                log::debug!("logged in for video {}", page.id());
                Ok(())
            }
        }
    }

    async fn collection_feed(&self, collection: &CollectionUrl) -> UnigeResult<String> {
        let response = self.client.get(collection.feed_url()).send().await?;
        if !response.status().is_success() {
            return Err(UnigeError::HttpError(response.status()));
        }
        Ok(response.text().await?)
    }
}

impl Default for UnigeClient {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_media_url(body: &str, page_url: &Url) -> UnigeResult<String> {
    let src = MEDIA_SOURCE_REGEXP
        .captures(body)
        .and_then(|cap| cap.get(1))
        .map(|src| html_escape::decode_html_entities(src.as_str()).to_string())
        .ok_or(UnigeError::MediaNotFound)?;

    Ok(page_url.join(&src)?.to_string())
}

fn extract_title(body: &str) -> Option<String> {
    let title = PAGE_TITLE_REGEXP.captures(body).and_then(|cap| cap.get(1))?;
    let title = html_escape::decode_html_entities(title.as_str());
    // The site appends " - Mediaserver - ..." breadcrumbs to page titles.
    let title = title.split('-').next().unwrap_or_default().trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

fn parse_collection_feed(feed: &str) -> (Option<String>, Vec<String>) {
    // The first <title> of the document belongs to the channel header.
    let title = FEED_TITLE_REGEXP
        .captures(feed)
        .and_then(|cap| cap.get(1))
        .map(|title| {
            html_escape::decode_html_entities(title.as_str().trim())
                .trim()
                .to_string()
        })
        .filter(|title| !title.is_empty());

    let entries = FEED_ITEM_REGEXP
        .captures_iter(feed)
        .filter_map(|item| {
            FEED_LINK_REGEXP
                .captures(item.get(1)?.as_str())
                .and_then(|cap| cap.get(1))
                .map(|link| html_escape::decode_html_entities(link.as_str()).to_string())
        })
        .collect();

    (title, entries)
}
