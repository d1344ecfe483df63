use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::entities;
use crate::error::{Result, TranscriptError};
use crate::youtube::{self, CaptionTrack};
use crate::{TranscriptContainer, TranscriptMoment};

static TEXT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<text start="([^"]+)" dur="([^"]+)">(.*?)</text>"#).unwrap());

/// Parse a caption track body into timed moments. The payload is a flat
/// tag stream, so a sequential regex scan is enough; cues whose start or
/// dur values do not parse as seconds are skipped. Cue text is
/// entity-decoded twice since the payload is double-escaped.
pub fn parse_transcript_xml(xml: &str) -> Vec<TranscriptMoment> {
    let mut moments = Vec::new();

    for caps in TEXT_TAG.captures_iter(xml) {
        let (start, duration) = match (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
            (Ok(start), Ok(duration)) => (start, duration),
            _ => continue,
        };

        moments.push(TranscriptMoment {
            start,
            duration,
            text: entities::decode_twice(&caps[3]),
        });
    }

    moments
}

/// Fetch one caption track body and parse it into a container. Track URLs
/// may be page-relative.
async fn fetch_container(client: &reqwest::Client, track: &CaptionTrack) -> Result<TranscriptContainer> {
    let url = if track.base_url.starts_with("http") {
        track.base_url.clone()
    } else {
        format!("https://www.youtube.com{}", track.base_url)
    };
    debug!("Fetching caption track: lang={} vssId={}", track.language_code, track.vss_id);

    let bytes = client
        .get(&url)
        .header("User-Agent", youtube::USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let xml = String::from_utf8(bytes.to_vec()).map_err(|_| TranscriptError::InvalidXmlFormat)?;

    Ok(TranscriptContainer {
        language_code: track.language_code.clone(),
        vss_id: track.vss_id.clone(),
        moments: parse_transcript_xml(&xml),
    })
}

/// Attempt every track once, sequentially and in priority order. Failed
/// tracks are skipped; an empty yield is `NoTranscriptData`.
async fn collect_containers(
    client: &reqwest::Client,
    tracks: &[CaptionTrack],
) -> Result<Vec<TranscriptContainer>> {
    let mut containers = Vec::new();

    for track in tracks {
        match fetch_container(client, track).await {
            Ok(container) => containers.push(container),
            Err(err) => {
                debug!("Skipping caption track {}: {err}", track.vss_id);
            }
        }
    }

    if containers.is_empty() {
        return Err(TranscriptError::NoTranscriptData);
    }

    Ok(containers)
}

/// Gather transcript containers from already-fetched watch-page HTML.
pub(crate) async fn collect_from_page(
    client: &reqwest::Client,
    html: &str,
    priority_langs: &[String],
) -> Result<Vec<TranscriptContainer>> {
    let tracks = youtube::extract_caption_tracks(html, priority_langs)?;
    collect_containers(client, &tracks).await
}

/// Fetch every available transcript for a watch URL, ordered by language
/// priority.
pub async fn fetch_transcripts(
    client: &reqwest::Client,
    url: &Url,
    priority_langs: &[String],
) -> Result<Vec<TranscriptContainer>> {
    let html = youtube::fetch_watch_page(client, url).await?;
    collect_from_page(client, &html, priority_langs).await
}

/// Fetch the single best transcript for a watch URL: walk the priority
/// order and accept the first track that fetches and parses.
pub async fn fetch_transcript(
    client: &reqwest::Client,
    url: &Url,
    priority_langs: &[String],
) -> Result<TranscriptContainer> {
    let html = youtube::fetch_watch_page(client, url).await?;
    let tracks = youtube::extract_caption_tracks(&html, priority_langs)?;

    for track in &tracks {
        match fetch_container(client, track).await {
            Ok(container) => return Ok(container),
            Err(err) => {
                debug!("Caption track {} failed, trying next: {err}", track.vss_id);
            }
        }
    }

    Err(TranscriptError::NoTranscriptData)
}
