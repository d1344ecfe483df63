use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::debug;
use serde::Deserialize;
use url::Url;

use crate::error::{Result, TranscriptError};
use crate::{VideoInfo, VideoThumbnail, transcript};

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const PLAYER_RESPONSE_MARKER: &str = "var ytInitialPlayerResponse = ";
const PLAYER_RESPONSE_END: &str = ";</script>";

/// Language codes tried first when ordering caption tracks.
pub const DEFAULT_PRIORITY_LANGS: &[&str] = &["en", "en-US"];

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
    microformat: Option<Microformat>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "lengthSeconds")]
    length_seconds: Option<String>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
    #[serde(rename = "shortDescription")]
    short_description: Option<String>,
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    author: Option<String>,
    thumbnail: Option<ThumbnailContainer>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailContainer {
    thumbnails: Option<Vec<Thumbnail>>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct Microformat {
    #[serde(rename = "playerMicroformatRenderer")]
    player_microformat_renderer: Option<PlayerMicroformat>,
}

#[derive(Debug, Deserialize)]
struct PlayerMicroformat {
    title: Option<TextRuns>,
    description: Option<TextRuns>,
    #[serde(rename = "lengthSeconds")]
    length_seconds: Option<String>,
    #[serde(rename = "externalChannelId")]
    external_channel_id: Option<String>,
    category: Option<String>,
    #[serde(rename = "publishDate")]
    publish_date: Option<String>,
    #[serde(rename = "uploadDate")]
    upload_date: Option<String>,
    #[serde(rename = "ownerChannelName")]
    owner_channel_name: Option<String>,
    #[serde(rename = "liveBroadcastDetails")]
    live_broadcast_details: Option<LiveBroadcastDetails>,
}

#[derive(Debug, Deserialize)]
struct TextRuns {
    runs: Option<Vec<TextRun>>,
}

impl TextRuns {
    fn concat(&self) -> Option<String> {
        let runs = self.runs.as_ref()?;
        if runs.is_empty() {
            return None;
        }
        Some(runs.iter().map(|run| run.text.as_str()).collect())
    }
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

#[derive(Debug, Deserialize)]
struct LiveBroadcastDetails {
    #[serde(rename = "isLiveNow")]
    is_live_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "vssId")]
    pub vss_id: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
}

/// Every embedded player-response JSON document in the page, in document
/// order. Pages inline the payload more than once; each candidate is
/// decoded independently downstream.
fn player_response_blobs(html: &str) -> Vec<&str> {
    let mut blobs = Vec::new();
    let mut rest = html;

    while let Some(start) = rest.find(PLAYER_RESPONSE_MARKER) {
        let after_marker = &rest[start + PLAYER_RESPONSE_MARKER.len()..];
        match after_marker.find(PLAYER_RESPONSE_END) {
            Some(end) => {
                blobs.push(&after_marker[..end]);
                rest = &after_marker[end + PLAYER_RESPONSE_END.len()..];
            }
            None => break,
        }
    }

    blobs
}

/// Decode video metadata from watch-page HTML. Candidates that fail to
/// parse, or parse without a details section, are skipped; the first
/// usable one wins.
pub fn extract_video_info(html: &str) -> Result<VideoInfo> {
    let blobs = player_response_blobs(html);
    debug!("Found {} embedded player response candidates", blobs.len());

    for blob in blobs {
        let response: PlayerResponse = match serde_json::from_str(blob) {
            Ok(response) => response,
            Err(_) => continue,
        };

        if let Some(info) = build_video_info(response) {
            return Ok(info);
        }
    }

    Err(TranscriptError::NoVideoInfo)
}

/// Normalize one decoded player response. Older pages ship no microformat
/// block; everything it would supply stays unset. Returns None when the
/// details section is missing entirely.
fn build_video_info(response: PlayerResponse) -> Option<VideoInfo> {
    let details = response.video_details?;
    let microformat = response.microformat.and_then(|m| m.player_microformat_renderer);

    let title = details
        .title
        .or_else(|| microformat.as_ref().and_then(|m| m.title.as_ref()).and_then(TextRuns::concat));
    let description = details
        .short_description
        .or_else(|| microformat.as_ref().and_then(|m| m.description.as_ref()).and_then(TextRuns::concat));
    let channel_id = details
        .channel_id
        .or_else(|| microformat.as_ref().and_then(|m| m.external_channel_id.clone()));
    let channel_name = details
        .author
        .or_else(|| microformat.as_ref().and_then(|m| m.owner_channel_name.clone()));

    let duration = details
        .length_seconds
        .as_deref()
        .and_then(|s| s.parse().ok())
        .or_else(|| {
            microformat
                .as_ref()
                .and_then(|m| m.length_seconds.as_deref())
                .and_then(|s| s.parse().ok())
        });
    let view_count = details.view_count.as_deref().and_then(|s| s.parse().ok());

    let thumbnails = details.thumbnail.and_then(|t| t.thumbnails).map(|thumbs| {
        thumbs
            .into_iter()
            .map(|t| VideoThumbnail {
                url: t.url,
                width: t.width,
                height: t.height,
            })
            .collect()
    });

    let published_at = microformat
        .as_ref()
        .and_then(|m| m.publish_date.as_deref())
        .and_then(parse_upstream_date);
    let uploaded_at = microformat
        .as_ref()
        .and_then(|m| m.upload_date.as_deref())
        .and_then(parse_upstream_date);
    let category = microformat.as_ref().and_then(|m| m.category.clone());
    let is_live = microformat
        .as_ref()
        .and_then(|m| m.live_broadcast_details.as_ref())
        .and_then(|l| l.is_live_now);

    let channel_url = channel_id.as_ref().map(|id| format!("https://www.youtube.com/channel/{id}"));
    let video_url = details
        .video_id
        .as_ref()
        .map(|id| format!("https://www.youtube.com/watch?v={id}"));

    Some(VideoInfo {
        video_id: details.video_id,
        title,
        channel_id,
        channel_name,
        description,
        published_at,
        uploaded_at,
        view_count,
        duration,
        category,
        is_live,
        thumbnails,
        channel_url,
        video_url,
        transcripts: None,
    })
}

/// Microformat dates arrive as RFC 3339 on newer pages and bare
/// `yyyy-mm-dd` on older ones.
fn parse_upstream_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Collect caption tracks from every embedded candidate and order them by
/// language priority.
pub(crate) fn extract_caption_tracks(html: &str, priority_langs: &[String]) -> Result<Vec<CaptionTrack>> {
    let mut tracks: Vec<CaptionTrack> = Vec::new();

    for blob in player_response_blobs(html) {
        let response: PlayerResponse = match serde_json::from_str(blob) {
            Ok(response) => response,
            Err(_) => continue,
        };

        let found = response
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();
        tracks.extend(found);
    }

    if tracks.is_empty() {
        return Err(TranscriptError::NoCaptionData);
    }

    debug!("Found {} caption tracks", tracks.len());
    tracks.sort_by_key(|track| track_order(track, priority_langs));
    Ok(tracks)
}

/// Sort key: priority-language rank first, and within one priority
/// language the auto-generated variants (vssId prefixed `a`) last. Tracks
/// outside the priority list share a constant key, so the stable sort
/// keeps their relative order.
fn track_order(track: &CaptionTrack, priority_langs: &[String]) -> (usize, bool) {
    for (rank, lang) in priority_langs.iter().enumerate() {
        if track.language_code == *lang {
            return (rank, track.vss_id.starts_with('a'));
        }
    }
    (priority_langs.len(), false)
}

/// Fetch a watch page and decode it as UTF-8 text.
pub async fn fetch_watch_page(client: &reqwest::Client, url: &Url) -> Result<String> {
    debug!("Fetching watch page: {url}");

    let bytes = client
        .get(url.as_str())
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    String::from_utf8(bytes.to_vec()).map_err(|_| TranscriptError::InvalidHtmlFormat)
}

/// Fetch video metadata for a watch URL. With `include_transcripts` set,
/// caption transcripts are gathered from the same page; a transcript
/// failure leaves that field unset rather than failing the fetch.
pub async fn fetch_video_info(
    client: &reqwest::Client,
    url: &Url,
    include_transcripts: bool,
    priority_langs: &[String],
) -> Result<VideoInfo> {
    let html = fetch_watch_page(client, url).await?;
    let mut info = extract_video_info(&html)?;

    if include_transcripts {
        match transcript::collect_from_page(client, &html, priority_langs).await {
            Ok(containers) => info.transcripts = Some(containers),
            Err(err) => debug!("Transcript gathering failed, leaving transcripts unset: {err}"),
        }
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json: &str) -> String {
        format!("<html><body><script>var ytInitialPlayerResponse = {json};</script></body></html>")
    }

    fn default_langs() -> Vec<String> {
        DEFAULT_PRIORITY_LANGS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_blob_extraction_finds_all_occurrences() {
        let html = "junk var ytInitialPlayerResponse = {\"a\":1};</script> mid var ytInitialPlayerResponse = {\"b\":2};</script> tail";
        let blobs = player_response_blobs(html);
        assert_eq!(blobs, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_blob_extraction_ignores_unterminated_marker() {
        let html = "var ytInitialPlayerResponse = {\"a\":1} no terminator here";
        assert!(player_response_blobs(html).is_empty());
    }

    #[test]
    fn test_blob_extraction_none() {
        assert!(player_response_blobs("<html><body>nothing embedded</body></html>").is_empty());
    }

    #[test]
    fn test_extract_video_info_full_shape() {
        let html = page(
            r#"{
                "videoDetails": {
                    "videoId": "abc123",
                    "title": "A Video",
                    "lengthSeconds": "212",
                    "channelId": "UC777",
                    "shortDescription": "about things",
                    "viewCount": "123456",
                    "author": "Some Channel",
                    "thumbnail": {"thumbnails": [{"url": "https://i.ytimg.com/vi/abc123/hq720.jpg", "width": 1280, "height": 720}]}
                },
                "microformat": {
                    "playerMicroformatRenderer": {
                        "category": "Education",
                        "publishDate": "2025-01-03T08:00:00-08:00",
                        "uploadDate": "2025-01-02",
                        "liveBroadcastDetails": {"isLiveNow": false}
                    }
                }
            }"#,
        );

        let info = extract_video_info(&html).unwrap();
        assert_eq!(info.video_id.as_deref(), Some("abc123"));
        assert_eq!(info.title.as_deref(), Some("A Video"));
        assert_eq!(info.channel_id.as_deref(), Some("UC777"));
        assert_eq!(info.channel_name.as_deref(), Some("Some Channel"));
        assert_eq!(info.description.as_deref(), Some("about things"));
        assert_eq!(info.view_count, Some(123456));
        assert_eq!(info.duration, Some(212));
        assert_eq!(info.category.as_deref(), Some("Education"));
        assert_eq!(info.is_live, Some(false));
        assert_eq!(info.channel_url.as_deref(), Some("https://www.youtube.com/channel/UC777"));
        assert_eq!(info.video_url.as_deref(), Some("https://www.youtube.com/watch?v=abc123"));

        let thumbs = info.thumbnails.unwrap();
        assert_eq!(thumbs.len(), 1);
        assert_eq!(thumbs[0].width, 1280);

        let published = info.published_at.unwrap();
        assert_eq!(published.to_rfc3339(), "2025-01-03T16:00:00+00:00");
        let uploaded = info.uploaded_at.unwrap();
        assert_eq!(uploaded.to_rfc3339(), "2025-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_extract_video_info_details_only() {
        let html = page(r#"{"videoDetails": {"videoId": "xyz", "title": "Old Shape"}}"#);

        let info = extract_video_info(&html).unwrap();
        assert_eq!(info.video_id.as_deref(), Some("xyz"));
        assert_eq!(info.title.as_deref(), Some("Old Shape"));
        assert!(info.category.is_none());
        assert!(info.published_at.is_none());
        assert!(info.is_live.is_none());
        assert!(info.channel_url.is_none());
    }

    #[test]
    fn test_extract_video_info_microformat_fallbacks() {
        let html = page(
            r#"{
                "videoDetails": {"videoId": "xyz"},
                "microformat": {
                    "playerMicroformatRenderer": {
                        "title": {"runs": [{"text": "Part "}, {"text": "One"}]},
                        "description": {"runs": [{"text": "desc"}]},
                        "lengthSeconds": "90",
                        "externalChannelId": "UC42",
                        "ownerChannelName": "Owner"
                    }
                }
            }"#,
        );

        let info = extract_video_info(&html).unwrap();
        assert_eq!(info.title.as_deref(), Some("Part One"));
        assert_eq!(info.description.as_deref(), Some("desc"));
        assert_eq!(info.duration, Some(90));
        assert_eq!(info.channel_id.as_deref(), Some("UC42"));
        assert_eq!(info.channel_name.as_deref(), Some("Owner"));
        assert_eq!(info.channel_url.as_deref(), Some("https://www.youtube.com/channel/UC42"));
    }

    #[test]
    fn test_extract_video_info_skips_malformed_candidate() {
        let html = format!(
            "var ytInitialPlayerResponse = {{broken json;</script>{}",
            page(r#"{"videoDetails": {"videoId": "good"}}"#)
        );

        let info = extract_video_info(&html).unwrap();
        assert_eq!(info.video_id.as_deref(), Some("good"));
    }

    #[test]
    fn test_extract_video_info_skips_candidate_without_details() {
        let html = format!(
            "var ytInitialPlayerResponse = {{\"captions\": {{}}}};</script>{}",
            page(r#"{"videoDetails": {"videoId": "second"}}"#)
        );

        let info = extract_video_info(&html).unwrap();
        assert_eq!(info.video_id.as_deref(), Some("second"));
    }

    #[test]
    fn test_extract_video_info_missing() {
        let result = extract_video_info("<html><body>plain page</body></html>");
        assert!(matches!(result, Err(TranscriptError::NoVideoInfo)));
    }

    #[test]
    fn test_numeric_garbage_becomes_none() {
        let html = page(
            r#"{"videoDetails": {"videoId": "xyz", "viewCount": "not-a-number", "lengthSeconds": "12.5"}}"#,
        );

        let info = extract_video_info(&html).unwrap();
        assert!(info.view_count.is_none());
        assert!(info.duration.is_none());
    }

    #[test]
    fn test_unparseable_dates_become_none() {
        let html = page(
            r#"{
                "videoDetails": {"videoId": "xyz"},
                "microformat": {"playerMicroformatRenderer": {"publishDate": "January 3rd", "uploadDate": ""}}
            }"#,
        );

        let info = extract_video_info(&html).unwrap();
        assert!(info.published_at.is_none());
        assert!(info.uploaded_at.is_none());
    }

    #[test]
    fn test_extract_video_info_idempotent() {
        let html = page(
            r#"{"videoDetails": {"videoId": "abc123", "title": "A Video", "viewCount": "7"}}"#,
        );

        let first = serde_json::to_string(&extract_video_info(&html).unwrap()).unwrap();
        let second = serde_json::to_string(&extract_video_info(&html).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_track_ordering() {
        let html = page(
            r#"{
                "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                    {"baseUrl": "/t1", "vssId": ".fr", "languageCode": "fr"},
                    {"baseUrl": "/t2", "vssId": "a.en", "languageCode": "en"},
                    {"baseUrl": "/t3", "vssId": ".en", "languageCode": "en"}
                ]}}
            }"#,
        );

        let tracks = extract_caption_tracks(&html, &default_langs()).unwrap();
        let order: Vec<(&str, &str)> = tracks
            .iter()
            .map(|t| (t.language_code.as_str(), t.vss_id.as_str()))
            .collect();
        assert_eq!(order, vec![("en", ".en"), ("en", "a.en"), ("fr", ".fr")]);
    }

    #[test]
    fn test_track_ordering_priority_rank() {
        let html = page(
            r#"{
                "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                    {"baseUrl": "/t1", "vssId": ".de", "languageCode": "de"},
                    {"baseUrl": "/t2", "vssId": ".en-US", "languageCode": "en-US"},
                    {"baseUrl": "/t3", "vssId": ".en", "languageCode": "en"}
                ]}}
            }"#,
        );

        let tracks = extract_caption_tracks(&html, &default_langs()).unwrap();
        let langs: Vec<&str> = tracks.iter().map(|t| t.language_code.as_str()).collect();
        assert_eq!(langs, vec!["en", "en-US", "de"]);
    }

    #[test]
    fn test_non_priority_tracks_keep_relative_order() {
        let html = page(
            r#"{
                "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                    {"baseUrl": "/t1", "vssId": "a.fr", "languageCode": "fr"},
                    {"baseUrl": "/t2", "vssId": ".de", "languageCode": "de"},
                    {"baseUrl": "/t3", "vssId": ".fr", "languageCode": "fr"}
                ]}}
            }"#,
        );

        let tracks = extract_caption_tracks(&html, &default_langs()).unwrap();
        let order: Vec<&str> = tracks.iter().map(|t| t.vss_id.as_str()).collect();
        assert_eq!(order, vec!["a.fr", ".de", ".fr"]);
    }

    #[test]
    fn test_tracks_concatenate_across_candidates() {
        let first = r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
            {"baseUrl": "/t1", "vssId": ".fr", "languageCode": "fr"}
        ]}}}"#;
        let second = r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
            {"baseUrl": "/t2", "vssId": ".en", "languageCode": "en"}
        ]}}}"#;
        let html = format!("{}{}", page(first), page(second));

        let tracks = extract_caption_tracks(&html, &default_langs()).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language_code, "en");
        assert_eq!(tracks[1].language_code, "fr");
    }

    #[test]
    fn test_tracks_skip_malformed_candidate() {
        let html = format!(
            "var ytInitialPlayerResponse = {{oops;</script>{}",
            page(
                r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                    {"baseUrl": "/t1", "vssId": ".en", "languageCode": "en"}
                ]}}}"#
            )
        );

        let tracks = extract_caption_tracks(&html, &default_langs()).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].vss_id, ".en");
    }

    #[test]
    fn test_no_caption_data() {
        let html = page(r#"{"videoDetails": {"videoId": "abc"}}"#);
        let result = extract_caption_tracks(&html, &default_langs());
        assert!(matches!(result, Err(TranscriptError::NoCaptionData)));
    }
}
