pub mod activity;
pub mod config;
pub mod entities;
pub mod error;
pub mod output;
pub mod transcript;
pub mod youtube;

pub use error::{Result, TranscriptError};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use url::Url;

/// Metadata scraped from a watch page. Pages vary in which fields they
/// expose; every field is independently optional and absence is not an
/// error.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    /// Length in whole seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Vec<VideoThumbnail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcripts: Option<Vec<TranscriptContainer>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoThumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// One caption track's fully decoded transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptContainer {
    pub language_code: String,
    pub vss_id: String,
    pub moments: Vec<TranscriptMoment>,
}

/// One timed caption cue.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptMoment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

/// One entry from a Takeout watch-history export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub action: Action,
    pub link: Link,
    /// The export's timezone abbreviation is matched but not resolved to
    /// an offset; abbreviations do not map one-to-one to offsets.
    pub timestamp: NaiveDateTime,
}

/// Verb of a history entry, exactly as Takeout prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    #[serde(rename = "watched")]
    Watched,
    #[serde(rename = "watched story")]
    WatchedStory,
    #[serde(rename = "viewed")]
    Viewed,
    #[serde(rename = "liked")]
    Liked,
    #[serde(rename = "disliked")]
    Disliked,
    #[serde(rename = "subscribed to")]
    SubscribedTo,
    #[serde(rename = "answered")]
    Answered,
    #[serde(rename = "voted on")]
    VotedOn,
    #[serde(rename = "saved")]
    Saved,
    #[serde(rename = "searched for")]
    SearchedFor,
}

impl Action {
    /// Parse the lowercased display text that precedes an entry's link.
    pub fn parse(text: &str) -> Option<Action> {
        match text {
            "watched" => Some(Action::Watched),
            "watched story" => Some(Action::WatchedStory),
            "viewed" => Some(Action::Viewed),
            "liked" => Some(Action::Liked),
            "disliked" => Some(Action::Disliked),
            "subscribed to" => Some(Action::SubscribedTo),
            "answered" => Some(Action::Answered),
            "voted on" => Some(Action::VotedOn),
            "saved" => Some(Action::Saved),
            "searched for" => Some(Action::SearchedFor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Watched => "watched",
            Action::WatchedStory => "watched story",
            Action::Viewed => "viewed",
            Action::Liked => "liked",
            Action::Disliked => "disliked",
            Action::SubscribedTo => "subscribed to",
            Action::Answered => "answered",
            Action::VotedOn => "voted on",
            Action::Saved => "saved",
            Action::SearchedFor => "searched for",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a history entry points at. Exactly one variant per activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Link {
    Video {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Post { id: String, text: String },
    Channel { id: String, name: String },
    Playlist { id: String, title: String },
    Search { query: String },
}

impl Link {
    /// Canonical URL of the linked resource.
    pub fn url(&self) -> String {
        match self {
            Link::Video { id, .. } => format!("https://www.youtube.com/watch?v={id}"),
            Link::Post { id, .. } => format!("https://www.youtube.com/post/{id}"),
            Link::Channel { id, .. } => format!("https://www.youtube.com/channel/{id}"),
            Link::Playlist { id, .. } => format!("https://www.youtube.com/playlist?list={id}"),
            Link::Search { query } => format!("https://www.youtube.com/results?search_query={query}"),
        }
    }

    /// Display text the export attached to the link, when any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Link::Video { title, .. } => title.as_deref(),
            Link::Post { text, .. } => Some(text),
            Link::Channel { name, .. } => Some(name),
            Link::Playlist { title, .. } => Some(title),
            Link::Search { query } => Some(query),
        }
    }
}

/// Turn a user-supplied video ID or URL into a watch-page URL.
///
/// Anything that mentions youtube.com or youtu.be and parses as a URL is
/// used verbatim; everything else is treated as a bare video ID.
pub fn resolve_watch_url(input: &str) -> Result<Url> {
    let input = input.trim();

    if input.contains("youtube.com") || input.contains("youtu.be") {
        if let Ok(url) = Url::parse(input) {
            return Ok(url);
        }
    }

    if input.is_empty() {
        return Err(TranscriptError::InvalidVideoId);
    }

    Url::parse(&format!("https://www.youtube.com/watch?v={input}")).map_err(|_| TranscriptError::InvalidUrl)
}
