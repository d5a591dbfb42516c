use crate::batch::BatchOptions;
use crate::cli::args::Command;
use crate::cli::params::{DownloadParams, ProbeParams};
use crate::config::{Config, load_config};
use crate::download::{AUDIO_BITRATES, OutputFormat, Quality};
use crate::error::TubeHumError;
use itertools::Itertools;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Download(DownloadParams),
    Probe(ProbeParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, TubeHumError> {
    match command {
        Command::Download {
            config_path,
            url,
            output_dir,
            format,
            quality,
            workers,
            accelerator,
            cookies_from_browser,
            item_timeout_secs,
            summary_path,
        } => {
            let mut app_config = load_config(config_path.as_deref())?;

            if let Some(output_dir) = output_dir {
                app_config.output.base_dir = PathBuf::from(output_dir);
            }
            if let Some(workers) = workers {
                app_config.download.workers = workers;
            }
            if let Some(item_timeout_secs) = item_timeout_secs {
                app_config.download.item_timeout_secs = item_timeout_secs;
            }
            if accelerator {
                app_config.accelerator.enabled = true;
            }
            if cookies_from_browser.is_some() {
                app_config.credentials.cookies_from_browser = cookies_from_browser;
            }

            let quality = resolve_quality(format, quality, &app_config)?;
            let batch = resolve_batch_options(&app_config)?;

            Ok(ResolvedCommand::Download(DownloadParams {
                app_config,
                url,
                format,
                quality,
                batch,
                summary_path: summary_path.map(PathBuf::from),
            }))
        }
        Command::Probe { config_path, url } => {
            let app_config = load_config(config_path.as_deref())?;
            Ok(ResolvedCommand::Probe(ProbeParams { app_config, url }))
        }
    }
}

fn resolve_quality(
    format: OutputFormat,
    quality: Option<u32>,
    app_config: &Config,
) -> Result<Quality, TubeHumError> {
    match format {
        OutputFormat::Audio => {
            let bitrate = quality.unwrap_or(app_config.download.audio_bitrate);
            if !AUDIO_BITRATES.contains(&bitrate) {
                return Err(TubeHumError::CliArgumentValidation {
                    details: format!(
                        "Audio bitrate must be one of {} kbps, got {}.",
                        AUDIO_BITRATES.iter().join(", "),
                        bitrate
                    ),
                });
            }
            Ok(Quality::AudioBitrate(bitrate))
        }
        OutputFormat::Video => match quality {
            Some(0) => Err(TubeHumError::CliArgumentValidation {
                details: "Video height must be greater than 0.".to_string(),
            }),
            Some(height) => Ok(Quality::MaxHeight(height)),
            None => Ok(Quality::Best),
        },
    }
}

fn resolve_batch_options(app_config: &Config) -> Result<BatchOptions, TubeHumError> {
    let download = &app_config.download;

    for (name, value) in [
        ("workers", download.workers as u64),
        ("item-timeout", download.item_timeout_secs),
    ] {
        if value == 0 {
            return Err(TubeHumError::CliArgumentValidation {
                details: format!("{name} must be greater than 0."),
            });
        }
    }

    Ok(BatchOptions {
        workers: download.workers,
        item_timeout: Duration::from_secs(download.item_timeout_secs),
        cancel_grace: Duration::from_secs(download.cancel_grace_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_command() -> Command {
        Command::Download {
            config_path: None,
            url: "https://media.test/watch?v=a".to_string(),
            output_dir: None,
            format: OutputFormat::Audio,
            quality: None,
            workers: None,
            accelerator: false,
            cookies_from_browser: None,
            item_timeout_secs: None,
            summary_path: None,
        }
    }

    fn resolve_download(command: Command) -> Result<DownloadParams, TubeHumError> {
        match resolve_command(command)? {
            ResolvedCommand::Download(params) => Ok(params),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_defaults_come_from_config() {
        let params = resolve_download(download_command()).unwrap();

        assert_eq!(params.quality, Quality::AudioBitrate(192));
        assert_eq!(params.batch.workers, 4);
        assert_eq!(params.batch.item_timeout, Duration::from_secs(1800));
        assert!(params.summary_path.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let mut command = download_command();
        if let Command::Download {
            output_dir,
            workers,
            accelerator,
            cookies_from_browser,
            item_timeout_secs,
            quality,
            ..
        } = &mut command
        {
            *output_dir = Some("/srv/media".to_string());
            *workers = Some(9);
            *accelerator = true;
            *cookies_from_browser = Some("chrome".to_string());
            *item_timeout_secs = Some(45);
            *quality = Some(320);
        }

        let params = resolve_download(command).unwrap();

        assert_eq!(params.app_config.output.base_dir, PathBuf::from("/srv/media"));
        assert_eq!(params.batch.workers, 9);
        assert_eq!(params.batch.item_timeout, Duration::from_secs(45));
        assert!(params.app_config.accelerator.enabled);
        assert_eq!(
            params.app_config.credentials.cookies_from_browser.as_deref(),
            Some("chrome")
        );
        assert_eq!(params.quality, Quality::AudioBitrate(320));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let mut command = download_command();
        if let Command::Download { workers, .. } = &mut command {
            *workers = Some(0);
        }

        assert!(matches!(
            resolve_download(command),
            Err(TubeHumError::CliArgumentValidation { .. })
        ));
    }

    #[test]
    fn test_unsupported_bitrate_is_rejected() {
        let mut command = download_command();
        if let Command::Download { quality, .. } = &mut command {
            *quality = Some(160);
        }

        match resolve_download(command) {
            Err(TubeHumError::CliArgumentValidation { details }) => {
                assert!(details.contains("128, 192, 256, 320"), "{details}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_video_quality_is_a_height() {
        let mut command = download_command();
        if let Command::Download {
            format, quality, ..
        } = &mut command
        {
            *format = OutputFormat::Video;
            *quality = Some(720);
        }
        assert_eq!(
            resolve_download(command).unwrap().quality,
            Quality::MaxHeight(720)
        );

        let mut command = download_command();
        if let Command::Download { format, .. } = &mut command {
            *format = OutputFormat::Video;
        }
        assert_eq!(resolve_download(command).unwrap().quality, Quality::Best);
    }
}
