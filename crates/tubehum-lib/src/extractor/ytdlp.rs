use super::{
    ExtractorError, FetchOptions, FetchedMedia, MediaExtractor, ProbeInfo, ProbeKind, seconds,
};
use crate::download::{OutputFormat, Quality, Strategy};
use async_trait::async_trait;
use itertools::Itertools;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
const RESULT_TEMPLATE: &str = "after_move:%(.{title,filepath,filesize,filesize_approx,duration})j";
const DEGRADED_AUDIO_QUALITY: &str = "128K";

#[derive(Clone, Debug)]
pub struct YtDlpSettings {
    pub ffmpeg_location: Option<PathBuf>,
    pub retries: u32,
    pub fragment_retries: u32,
    pub socket_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for YtDlpSettings {
    fn default() -> Self {
        Self {
            ffmpeg_location: None,
            retries: 10,
            fragment_retries: 10,
            socket_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(120),
        }
    }
}

pub struct YtDlpExtractor {
    program: PathBuf,
    settings: YtDlpSettings,
}

impl YtDlpExtractor {
    pub fn new(program: PathBuf, settings: YtDlpSettings) -> Self {
        Self { program, settings }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    pub fn probe_args(&self, url: &str) -> Vec<String> {
        vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--no-check-certificates".to_string(),
            "--socket-timeout".to_string(),
            self.settings.socket_timeout.as_secs().to_string(),
            "--".to_string(),
            url.to_string(),
        ]
    }

    pub fn fetch_args(&self, options: &FetchOptions) -> Vec<String> {
        let degraded = options.strategy == Strategy::DegradedQuality;
        let mut args: Vec<String> = vec![
            "--no-warnings".into(),
            "--no-check-certificates".into(),
            "--no-playlist".into(),
            "--no-simulate".into(),
            "--newline".into(),
            "--retries".into(),
            self.settings.retries.to_string(),
            "--fragment-retries".into(),
            self.settings.fragment_retries.to_string(),
            "--socket-timeout".into(),
            self.settings.socket_timeout.as_secs().to_string(),
            "-o".into(),
            options
                .destination
                .join(OUTPUT_TEMPLATE)
                .to_string_lossy()
                .into_owned(),
            "--print".into(),
            RESULT_TEMPLATE.into(),
        ];

        if let Some(ffmpeg_location) = &self.settings.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg_location.to_string_lossy().into_owned());
        }

        match options.format {
            OutputFormat::Audio => {
                let (selector, audio_quality) = if degraded {
                    ("worstaudio/worst".to_string(), DEGRADED_AUDIO_QUALITY.to_string())
                } else {
                    let audio_quality = match options.quality {
                        Quality::AudioBitrate(kbps) => format!("{kbps}K"),
                        Quality::MaxHeight(_) | Quality::Best => "0".to_string(),
                    };
                    ("bestaudio/best".to_string(), audio_quality)
                };
                args.extend([
                    "-f".into(),
                    selector,
                    "-x".into(),
                    "--audio-format".into(),
                    "mp3".into(),
                    "--audio-quality".into(),
                    audio_quality,
                    "--embed-metadata".into(),
                    "--embed-thumbnail".into(),
                ]);
            }
            OutputFormat::Video => {
                let selector = if degraded {
                    "worst[ext=mp4]/worst".to_string()
                } else {
                    video_selector(options.quality)
                };
                args.extend([
                    "-f".into(),
                    selector,
                    "--merge-output-format".into(),
                    "mp4".into(),
                    "--recode-video".into(),
                    "mp4".into(),
                    "--embed-metadata".into(),
                ]);
            }
        }

        if let Some(user_agent) = &options.user_agent {
            args.push("--user-agent".into());
            args.push(user_agent.clone());
        }

        if let Some(browser) = &options.cookies_from_browser {
            args.push("--cookies-from-browser".into());
            args.push(browser.clone());
        }

        if let Some(accelerator) = &options.accelerator {
            // Fragmented protocols stay on the native downloader.
            args.extend([
                "--downloader".into(),
                accelerator.program.clone(),
                "--downloader".into(),
                "dash,m3u8:native".into(),
                "--downloader-args".into(),
                format!(
                    "aria2c:-x {} -s {} -k {}",
                    accelerator.connections, accelerator.split, accelerator.min_split_size
                ),
            ]);
        }

        args.push("--".into());
        args.push(options.url.clone());
        args
    }

    async fn run(&self, args: &[String]) -> Result<Output, ExtractorError> {
        tracing::trace!(program = %self.program.display(), args = %args.iter().join(" "), "Running extractor");

        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractorError::Launch {
                program: self.program_name(),
                source,
            })
    }

    fn check_status(&self, output: &Output) -> Result<(), ExtractorError> {
        if output.status.success() {
            Ok(())
        } else {
            Err(ExtractorError::Exited {
                program: self.program_name(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn probe(&self, url: &str) -> Result<ProbeInfo, ExtractorError> {
        let args = self.probe_args(url);
        let output = tokio::time::timeout(self.settings.probe_timeout, self.run(&args))
            .await
            .map_err(|_| ExtractorError::TimedOut {
                program: self.program_name(),
                timeout: self.settings.probe_timeout,
            })??;
        self.check_status(&output)?;
        parse_probe_output(&output.stdout)
    }

    async fn fetch(&self, options: &FetchOptions) -> Result<FetchedMedia, ExtractorError> {
        let args = self.fetch_args(options);
        let output = self.run(&args).await?;
        self.check_status(&output)?;

        let mut fetched = parse_fetch_output(&output.stdout);
        if let Some(path) = &fetched.path {
            match tokio::fs::metadata(path).await {
                Ok(metadata) => fetched.bytes = metadata.len(),
                Err(e) => {
                    tracing::debug!(path = %path.display(), "Could not stat fetched file: {}", e)
                }
            }
        }
        Ok(fetched)
    }
}

fn video_selector(quality: Quality) -> String {
    match quality {
        Quality::MaxHeight(height) => format!(
            "bestvideo[height<={height}][ext=mp4]+bestaudio[ext=m4a]/best[height<={height}][ext=mp4]/best[height<={height}]"
        ),
        Quality::AudioBitrate(_) | Quality::Best => {
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    entries: Option<Vec<Option<RawEntry>>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    webpage_url: Option<String>,
    url: Option<String>,
}

pub(crate) fn parse_probe_output(stdout: &[u8]) -> Result<ProbeInfo, ExtractorError> {
    let raw: RawProbe = serde_json::from_slice(stdout).map_err(|e| ExtractorError::Malformed {
        reason: format!("probe output is not valid JSON: {e}"),
    })?;

    let is_collection = raw.kind.as_deref() == Some("playlist") || raw.entries.is_some();
    let kind = if is_collection {
        let members = raw
            .entries
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.webpage_url.or(entry.url))
            .filter(|url| !url.trim().is_empty())
            .collect();
        ProbeKind::Collection { members }
    } else {
        ProbeKind::Single
    };

    Ok(ProbeInfo {
        title: raw.title,
        kind,
        duration: seconds(raw.duration),
        size_estimate: raw
            .filesize
            .or(raw.filesize_approx)
            .filter(|size| *size >= 0.0)
            .map(|size| size as u64),
    })
}

#[derive(Debug, Deserialize)]
struct RawFetched {
    title: Option<String>,
    filepath: Option<PathBuf>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    duration: Option<f64>,
}

/// Reads the JSON line printed after the file was moved into place. A
/// missing or unreadable line still means the fetch succeeded.
pub(crate) fn parse_fetch_output(stdout: &[u8]) -> FetchedMedia {
    let stdout = String::from_utf8_lossy(stdout);
    let Some(line) = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
    else {
        tracing::debug!("Extractor printed no result line");
        return FetchedMedia::default();
    };

    match serde_json::from_str::<RawFetched>(line) {
        Ok(raw) => FetchedMedia {
            title: raw.title,
            path: raw.filepath,
            bytes: raw
                .filesize
                .or(raw.filesize_approx)
                .filter(|size| *size >= 0.0)
                .map(|size| size as u64)
                .unwrap_or(0),
            duration: seconds(raw.duration),
        },
        Err(e) => {
            tracing::debug!("Could not parse extractor result line: {}", e);
            FetchedMedia::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Accelerator;

    fn extractor() -> YtDlpExtractor {
        YtDlpExtractor::new(PathBuf::from("yt-dlp"), YtDlpSettings::default())
    }

    fn options(format: OutputFormat, quality: Quality, strategy: Strategy) -> FetchOptions {
        FetchOptions {
            url: "https://media.test/watch?v=abc".to_string(),
            format,
            quality,
            destination: PathBuf::from("/tmp/out"),
            strategy,
            user_agent: None,
            cookies_from_browser: None,
            accelerator: None,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|index| args.get(index + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_audio_primary_args() {
        let args = extractor().fetch_args(&options(
            OutputFormat::Audio,
            Quality::AudioBitrate(256),
            Strategy::Primary,
        ));

        assert_eq!(value_after(&args, "-f"), Some("bestaudio/best"));
        assert_eq!(value_after(&args, "--audio-format"), Some("mp3"));
        assert_eq!(value_after(&args, "--audio-quality"), Some("256K"));
        assert!(args.contains(&"--embed-thumbnail".to_string()));
        assert_eq!(value_after(&args, "-o"), Some("/tmp/out/%(title)s.%(ext)s"));
        assert_eq!(
            &args[args.len() - 2..],
            ["--", "https://media.test/watch?v=abc"]
        );
    }

    #[test]
    fn test_video_height_cap() {
        let args = extractor().fetch_args(&options(
            OutputFormat::Video,
            Quality::MaxHeight(720),
            Strategy::Primary,
        ));

        let selector = value_after(&args, "-f").unwrap();
        assert!(selector.starts_with("bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]"));
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert!(!args.contains(&"-x".to_string()));
    }

    #[test]
    fn test_degraded_selects_worst() {
        let audio = extractor().fetch_args(&options(
            OutputFormat::Audio,
            Quality::AudioBitrate(320),
            Strategy::DegradedQuality,
        ));
        assert_eq!(value_after(&audio, "-f"), Some("worstaudio/worst"));
        assert_eq!(value_after(&audio, "--audio-quality"), Some("128K"));

        let video = extractor().fetch_args(&options(
            OutputFormat::Video,
            Quality::Best,
            Strategy::DegradedQuality,
        ));
        assert_eq!(value_after(&video, "-f"), Some("worst[ext=mp4]/worst"));
    }

    #[test]
    fn test_credentials_and_user_agent() {
        let mut opts = options(
            OutputFormat::Audio,
            Quality::AudioBitrate(192),
            Strategy::AlternateCredentials,
        );
        opts.user_agent = Some("Agent/1.0".to_string());
        opts.cookies_from_browser = Some("firefox".to_string());

        let args = extractor().fetch_args(&opts);
        assert_eq!(value_after(&args, "--user-agent"), Some("Agent/1.0"));
        assert_eq!(value_after(&args, "--cookies-from-browser"), Some("firefox"));
    }

    #[test]
    fn test_accelerator_keeps_fragmented_protocols_native() {
        let mut opts = options(OutputFormat::Video, Quality::Best, Strategy::Primary);
        opts.accelerator = Some(Accelerator {
            program: "aria2c".to_string(),
            connections: 16,
            split: 16,
            min_split_size: "1M".to_string(),
        });

        let args = extractor().fetch_args(&opts);
        let downloaders: Vec<&str> = args
            .iter()
            .enumerate()
            .filter(|(_, arg)| *arg == "--downloader")
            .map(|(index, _)| args[index + 1].as_str())
            .collect();
        assert_eq!(downloaders, ["aria2c", "dash,m3u8:native"]);
        assert_eq!(
            value_after(&args, "--downloader-args"),
            Some("aria2c:-x 16 -s 16 -k 1M")
        );
    }

    #[test]
    fn test_no_accelerator_by_default() {
        let args = extractor().fetch_args(&options(
            OutputFormat::Video,
            Quality::Best,
            Strategy::Primary,
        ));
        assert!(!args.contains(&"--downloader".to_string()));
        assert!(!args.contains(&"--cookies-from-browser".to_string()));
    }

    #[test]
    fn test_parse_probe_single() {
        let info = parse_probe_output(
            br#"{"_type": "video", "title": "Song", "duration": 200.5, "filesize_approx": 4096}"#,
        )
        .unwrap();

        assert_eq!(info.kind, ProbeKind::Single);
        assert_eq!(info.title.as_deref(), Some("Song"));
        assert_eq!(info.duration, Some(Duration::from_secs_f64(200.5)));
        assert_eq!(info.size_estimate, Some(4096));
    }

    #[test]
    fn test_parse_probe_ignores_out_of_range_duration() {
        let info =
            parse_probe_output(br#"{"title": "Endless", "duration": 1e30, "filesize": 1e30}"#)
                .unwrap();

        assert_eq!(info.kind, ProbeKind::Single);
        assert_eq!(info.duration, None);
    }

    #[test]
    fn test_parse_probe_playlist_skips_null_entries() {
        let info = parse_probe_output(
            br#"{
                "_type": "playlist",
                "title": "Mix",
                "entries": [
                    {"url": "https://media.test/watch?v=a", "webpage_url": "https://media.test/watch?v=a"},
                    null,
                    {"url": "https://media.test/watch?v=b"},
                    {"id": "no-url"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            info.kind,
            ProbeKind::Collection {
                members: vec![
                    "https://media.test/watch?v=a".to_string(),
                    "https://media.test/watch?v=b".to_string(),
                ]
            }
        );
        assert_eq!(info.title.as_deref(), Some("Mix"));
    }

    #[test]
    fn test_parse_probe_empty_playlist() {
        let info = parse_probe_output(br#"{"_type": "playlist", "entries": []}"#).unwrap();
        assert_eq!(info.kind, ProbeKind::Collection { members: vec![] });
    }

    #[test]
    fn test_parse_probe_garbage_is_malformed() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ExtractorError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_fetch_output_reads_last_json_line() {
        let fetched = parse_fetch_output(
            b"[info] noise\n{\"title\": \"Song\", \"filepath\": \"/tmp/out/Song.mp3\", \"filesize\": 1234, \"duration\": 61}\n",
        );

        assert_eq!(fetched.title.as_deref(), Some("Song"));
        assert_eq!(fetched.path, Some(PathBuf::from("/tmp/out/Song.mp3")));
        assert_eq!(fetched.bytes, 1234);
        assert_eq!(fetched.duration, Some(Duration::from_secs(61)));
    }

    #[test]
    fn test_parse_fetch_output_without_result_line() {
        assert_eq!(parse_fetch_output(b""), FetchedMedia::default());
    }
}
