use std::path::Path;

use chrono::NaiveDateTime;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TranscriptError};
use crate::{Action, Activity, Link};

/// Takeout prints timestamps like `Jan 3, 2025, 1:56:41 PM PST`. The
/// timezone abbreviation is consumed but not resolved to an offset.
pub(crate) const TIMESTAMP_FORMAT: &str = "%b %d, %Y, %I:%M:%S %p %Z";

static BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="outer-cell mdl-cell mdl-cell--12-col mdl-shadow--2dp">.*?</div>\s*</div>\s*</div>"#)
        .unwrap()
});

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div class="content-cell mdl-cell mdl-cell--6-col mdl-typography--body-1">([^<]+?)(?:https://|<a href=")"#)
        .unwrap()
});

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<br>([^<]+(?:AM|PM) [A-Z]+)"#).unwrap());

static VIDEO_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="(?:https://)?www\.youtube\.com/watch\?v=([^"]+)">([^<]+)</a>"#).unwrap()
});

static VIDEO_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https://www\.youtube\.com/watch\?v=([^<\s]+)"#).unwrap());

static POST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="(?:https://)?www\.youtube\.com/post/([^"]+)">([^<]+)</a>"#).unwrap()
});

static CHANNEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="(?:https://)?www\.youtube\.com/channel/([^"]+)">([^<]+)</a>"#).unwrap()
});

static PLAYLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="(?:https://)?www\.youtube\.com/playlist\?list=([^"]+)">([^<]+)</a>"#).unwrap()
});

static SEARCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="(?:https://)?www\.youtube\.com/results\?search_query=([^"]+)">([^<]+)</a>"#).unwrap()
});

/// Link classifiers tried in order; the first match wins.
const LINK_MATCHERS: &[fn(&str) -> Option<Link>] =
    &[video_link, post_link, channel_link, playlist_link, search_link];

/// Parse a Takeout watch-history export file.
pub fn parse_activity_file(path: &Path) -> Result<Vec<Activity>> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8(bytes).map_err(|_| TranscriptError::InvalidHtmlFormat)?;
    parse_activities(&content)
}

/// Parse every activity block in an export, in document order. The first
/// block that fails aborts the whole parse, so a drifted export format
/// surfaces immediately instead of silently dropping entries.
pub fn parse_activities(content: &str) -> Result<Vec<Activity>> {
    let mut activities = Vec::new();

    for block in BLOCK.find_iter(content) {
        activities.push(parse_activity_block(block.as_str())?);
    }

    debug!("Parsed {} activities", activities.len());
    Ok(activities)
}

fn parse_activity_block(block: &str) -> Result<Activity> {
    let action_caps = ACTION
        .captures(block)
        .ok_or_else(|| parse_error(block, "Could not extract action"))?;
    let action_text = action_caps[1].trim().to_lowercase();
    let action = Action::parse(&action_text)
        .ok_or_else(|| parse_error(block, &format!("Unsupported activity type: {action_text}")))?;

    let link = LINK_MATCHERS
        .iter()
        .find_map(|matcher| matcher(block))
        .ok_or_else(|| parse_error(block, "Could not extract URL"))?;

    let timestamp = TIMESTAMP
        .captures(block)
        .and_then(|caps| NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT).ok())
        .ok_or_else(|| parse_error(block, "Could not extract timestamp"))?;

    Ok(Activity { action, link, timestamp })
}

fn parse_error(block: &str, reason: &str) -> TranscriptError {
    TranscriptError::ActivityParse {
        block: block.to_string(),
        reason: reason.to_string(),
    }
}

fn video_link(block: &str) -> Option<Link> {
    if let Some(caps) = VIDEO_ANCHOR.captures(block) {
        let id = caps[1].to_string();
        let text = &caps[2];
        // Removed videos anchor the bare URL as their own display text.
        let title = if text == format!("https://www.youtube.com/watch?v={id}") {
            None
        } else {
            Some(html_escape::decode_html_entities(text).to_string())
        };
        return Some(Link::Video { id, title });
    }

    VIDEO_BARE.captures(block).map(|caps| Link::Video {
        id: caps[1].to_string(),
        title: None,
    })
}

fn post_link(block: &str) -> Option<Link> {
    POST.captures(block).map(|caps| Link::Post {
        id: caps[1].to_string(),
        text: html_escape::decode_html_entities(&caps[2]).to_string(),
    })
}

fn channel_link(block: &str) -> Option<Link> {
    CHANNEL.captures(block).map(|caps| Link::Channel {
        id: caps[1].to_string(),
        name: html_escape::decode_html_entities(&caps[2]).to_string(),
    })
}

fn playlist_link(block: &str) -> Option<Link> {
    PLAYLIST.captures(block).map(|caps| Link::Playlist {
        id: caps[1].to_string(),
        title: html_escape::decode_html_entities(&caps[2]).to_string(),
    })
}

fn search_link(block: &str) -> Option<Link> {
    // The query comes from the href, not the anchor text.
    SEARCH.captures(block).map(|caps| Link::Search {
        query: html_escape::decode_html_entities(&caps[1]).to_string(),
    })
}
