//! Megalobiz source
//!
//! Page-scrape fallback: search results link to a lyrics page whose
//! `lrc_text` span carries raw LRC. No structured API, so this does a
//! minimal HTML scan: find the first `entity_name` anchor on the search
//! page, then extract the span contents from the lyrics page.

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct MegalobizSource {
    http: reqwest::Client,
    base_url: String,
}

impl MegalobizSource {
    const DEFAULT_BASE_URL: &'static str = "https://www.megalobiz.com";

    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Search for synced lyrics. `Ok(None)` when no result page or no
    /// `lrc_text` span was found; `Err` on transport failure.
    pub async fn search(&self, title: &str, artist: &str) -> anyhow::Result<Option<String>> {
        let query = format!("{title} {artist}");
        let search_url = format!(
            "{}/search/all?qry={}",
            self.base_url,
            urlencoding::encode(&query)
        );

        let page = self
            .http
            .get(&search_url)
            .send()
            .await
            .context("send megalobiz search")?
            .error_for_status()
            .context("megalobiz search status")?
            .text()
            .await
            .context("read megalobiz search body")?;

        let Some(href) = first_entity_href(&page) else {
            return Ok(None);
        };

        let lyrics_url = format!("{}{}", self.base_url, href);
        let page = self
            .http
            .get(&lyrics_url)
            .send()
            .await
            .context("send megalobiz lyrics page")?
            .error_for_status()
            .context("megalobiz lyrics status")?
            .text()
            .await
            .context("read megalobiz lyrics body")?;

        Ok(extract_lrc_text(&page))
    }
}

/// Find the href of the first `<a class="entity_name" ...>` anchor.
fn first_entity_href(html: &str) -> Option<&str> {
    let anchor = html.find("class=\"entity_name\"")?;
    // href may sit before or after the class attribute within the tag.
    let tag_start = html[..anchor].rfind("<a")?;
    let tag_end = tag_start + html[tag_start..].find('>')?;
    let tag = &html[tag_start..tag_end];
    let href = tag.find("href=\"")? + "href=\"".len();
    let rel = &tag[href..];
    let end = rel.find('"')?;
    Some(&rel[..end])
}

/// Extract the text content of `<span id="lrc_text">...</span>`, with
/// tags collapsed to newlines and common entities decoded.
fn extract_lrc_text(html: &str) -> Option<String> {
    let marker = html.find("id=\"lrc_text\"")?;
    let open_end = marker + html[marker..].find('>')? + 1;
    let close = open_end + html[open_end..].find("</span>")?;
    let inner = &html[open_end..close];

    let mut out = String::with_capacity(inner.len());
    let mut in_tag = false;
    for ch in inner.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push('\n');
            }
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    let decoded = decode_entities(&out);
    if decoded.trim().is_empty() {
        None
    } else {
        Some(decoded)
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
