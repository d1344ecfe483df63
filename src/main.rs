use std::path::{Path, PathBuf};

use clap::ValueEnum;
use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, Commands, OutputFormat};
use ytkit::{TranscriptContainer, TranscriptError};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytkit.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytkit")
        .join("logs")
}

fn build_after_help() -> String {
    let log_path = log_dir().join("ytkit.log");
    format!("\nLogs are written to: {}", log_path.display())
}

fn priority_langs(cli: &Cli, config: &ytkit::config::Config) -> Vec<String> {
    if !cli.lang.is_empty() {
        return cli.lang.clone();
    }
    if let Some(languages) = &config.languages {
        if !languages.is_empty() {
            return languages.clone();
        }
    }
    ytkit::youtube::DEFAULT_PRIORITY_LANGS.iter().map(|s| s.to_string()).collect()
}

fn emit(rendered: &str, output: Option<&Path>, verbose: bool) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, rendered)?;
        if verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }
    Ok(())
}

fn render_containers(containers: &[TranscriptContainer], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => ytkit::output::render_transcripts_text(containers),
        OutputFormat::Json => ytkit::output::render_json(&containers)?,
        // SRT describes a single track; the best-ranked one wins.
        OutputFormat::Srt => match containers.first() {
            Some(container) => ytkit::output::render_srt(container),
            None => String::new(),
        },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = ytkit::config::Config::load().unwrap_or_default();

    if cli.verbose {
        let config_path = ytkit::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    // CLI flags take priority over config, then built-in defaults
    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|name| OutputFormat::from_str(name, true).ok())
        })
        .unwrap_or(OutputFormat::Text);
    let langs = priority_langs(&cli, &config);
    debug!("Caption language priority: {langs:?}");

    let client = reqwest::Client::new();

    let rendered = match &cli.command {
        Commands::Info { target, no_transcript } => {
            let url = ytkit::resolve_watch_url(target)?;
            let info = ytkit::youtube::fetch_video_info(&client, &url, !no_transcript, &langs).await?;

            if cli.verbose {
                if let Some(transcripts) = &info.transcripts {
                    eprintln!("Transcripts gathered: {}", transcripts.len());
                }
            }

            match format {
                OutputFormat::Text => ytkit::output::render_info_text(&info),
                OutputFormat::Json => ytkit::output::render_json(&info)?,
                OutputFormat::Srt => bail!("srt output only applies to transcripts"),
            }
        }
        Commands::Transcript { target, first } => {
            let url = ytkit::resolve_watch_url(target)?;
            let containers = if *first {
                vec![ytkit::transcript::fetch_transcript(&client, &url, &langs).await?]
            } else {
                ytkit::transcript::fetch_transcripts(&client, &url, &langs).await?
            };

            if cli.verbose {
                for container in &containers {
                    eprintln!(
                        "Track: lang={} vssId={} moments={}",
                        container.language_code,
                        container.vss_id,
                        container.moments.len(),
                    );
                }
            }

            render_containers(&containers, format)?
        }
        Commands::Activity { file } => {
            let activities = match ytkit::activity::parse_activity_file(file) {
                Ok(activities) => activities,
                Err(TranscriptError::ActivityParse { block, reason }) => {
                    bail!("activity parse failed: {reason}\n\nOffending block:\n{block}");
                }
                Err(err) => return Err(err.into()),
            };

            if cli.verbose {
                eprintln!("Entries parsed: {}", activities.len());
            }

            match format {
                OutputFormat::Text => ytkit::output::render_activities_text(&activities),
                OutputFormat::Json => ytkit::output::render_json(&activities)?,
                OutputFormat::Srt => bail!("srt output only applies to transcripts"),
            }
        }
    };

    emit(&rendered, cli.output.as_deref(), cli.verbose)?;

    Ok(())
}
