use serde::Serialize;

use crate::{Activity, TranscriptContainer, VideoInfo};

/// Render video metadata as key/value lines, skipping absent fields.
pub fn render_info_text(info: &VideoInfo) -> String {
    let mut lines = Vec::new();

    push_line(&mut lines, "Title", info.title.as_deref());
    push_line(&mut lines, "Video ID", info.video_id.as_deref());
    push_line(&mut lines, "Channel", info.channel_name.as_deref());
    push_line(&mut lines, "Channel ID", info.channel_id.as_deref());
    if let Some(published) = info.published_at {
        lines.push(format!("Published: {}", published.format("%Y-%m-%d")));
    }
    if let Some(uploaded) = info.uploaded_at {
        lines.push(format!("Uploaded: {}", uploaded.format("%Y-%m-%d")));
    }
    if let Some(views) = info.view_count {
        lines.push(format!("Views: {views}"));
    }
    if let Some(duration) = info.duration {
        lines.push(format!("Duration: {duration}s"));
    }
    push_line(&mut lines, "Category", info.category.as_deref());
    if let Some(is_live) = info.is_live {
        lines.push(format!("Live: {is_live}"));
    }
    push_line(&mut lines, "URL", info.video_url.as_deref());
    if let Some(transcripts) = &info.transcripts {
        let langs: Vec<&str> = transcripts.iter().map(|t| t.language_code.as_str()).collect();
        lines.push(format!("Transcripts: {}", langs.join(", ")));
    }
    if let Some(description) = &info.description {
        lines.push(format!("Description:\n{description}"));
    }

    lines.join("\n")
}

fn push_line(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(format!("{label}: {value}"));
    }
}

/// Render one transcript as plain text (one moment per line, no timestamps)
pub fn render_transcript_text(container: &TranscriptContainer) -> String {
    container
        .moments
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render several transcripts, each under a language header.
pub fn render_transcripts_text(containers: &[TranscriptContainer]) -> String {
    if containers.len() == 1 {
        return render_transcript_text(&containers[0]);
    }

    containers
        .iter()
        .map(|c| format!("[{} {}]\n{}", c.language_code, c.vss_id, render_transcript_text(c)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One line per activity: timestamp, verb, then the link label or URL.
pub fn render_activities_text(activities: &[Activity]) -> String {
    activities
        .iter()
        .map(|a| {
            let target = match a.link.label() {
                Some(label) => label.to_string(),
                None => a.link.url(),
            };
            format!("{}  {} {}", a.timestamp.format("%Y-%m-%d %H:%M:%S"), a.action, target)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Render one transcript as SubRip cues.
pub fn render_srt(container: &TranscriptContainer) -> String {
    let mut output = String::new();

    for (index, moment) in container.moments.iter().enumerate() {
        let start = srt_timestamp(moment.start);
        let end = srt_timestamp(moment.start + moment.duration);
        output.push_str(&format!("{}\n{} --> {}\n{}\n\n", index + 1, start, end, moment.text));
    }

    output
}

/// SRT timestamp: HH:MM:SS,mmm
fn srt_timestamp(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round() as u64;
    let seconds = millis / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes % 60, seconds % 60, millis % 1000)
}
