use crate::classify::{FailureClass, classify_failure, failure_reason};
use crate::download::{DownloadRequest, ItemOutcome, ItemResult, Strategy};
use crate::extractor::{Accelerator, FetchOptions, FetchedMedia, MediaExtractor, UserAgentPool};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// One complete fetch operation: whatever happens, it yields exactly one
/// [`ItemResult`].
#[async_trait]
pub trait ItemFetch: Send + Sync + 'static {
    async fn fetch_item(&self, request: &DownloadRequest) -> ItemResult;
}

#[derive(Debug, Default)]
pub struct FetcherSettings {
    /// Enables the alternate-credentials strategy.
    pub cookies_from_browser: Option<String>,
    /// Only used by the primary strategy.
    pub accelerator: Option<Accelerator>,
    pub user_agents: UserAgentPool,
}

pub struct ItemFetcher {
    extractor: Arc<dyn MediaExtractor>,
    settings: FetcherSettings,
}

impl ItemFetcher {
    pub fn new(extractor: Arc<dyn MediaExtractor>, settings: FetcherSettings) -> Self {
        Self {
            extractor,
            settings,
        }
    }

    /// The strategy to fall back to after `current` failed with `class`.
    /// Only access-denied failures are worth retrying differently.
    fn next_strategy(&self, current: Strategy, class: FailureClass) -> Option<Strategy> {
        match (current, class) {
            (Strategy::Primary, FailureClass::AccessDenied)
                if self.settings.cookies_from_browser.is_some() =>
            {
                Some(Strategy::AlternateCredentials)
            }
            (Strategy::Primary, FailureClass::AccessDenied) => Some(Strategy::DegradedQuality),
            (Strategy::AlternateCredentials, _) => Some(Strategy::DegradedQuality),
            _ => None,
        }
    }

    fn options_for(&self, request: &DownloadRequest, strategy: Strategy) -> FetchOptions {
        let (user_agent, cookies_from_browser, accelerator) = match strategy {
            Strategy::Primary => (
                self.settings.user_agents.next_agent(),
                None,
                self.settings.accelerator.clone(),
            ),
            Strategy::AlternateCredentials => (
                self.settings.user_agents.next_agent(),
                self.settings.cookies_from_browser.clone(),
                None,
            ),
            Strategy::DegradedQuality => (None, None, None),
        };

        FetchOptions {
            url: request.source_url.clone(),
            format: request.format,
            quality: request.quality,
            destination: request.destination.clone(),
            strategy,
            user_agent,
            cookies_from_browser,
            accelerator,
        }
    }

    fn succeeded(
        request: &DownloadRequest,
        started: Instant,
        strategy: Strategy,
        media: FetchedMedia,
    ) -> ItemResult {
        let outcome = match strategy {
            Strategy::Primary => ItemOutcome::Success,
            strategy => ItemOutcome::Degraded { strategy },
        };
        ItemResult {
            source_url: request.source_url.clone(),
            elapsed: started.elapsed(),
            outcome,
            title: media
                .title
                .unwrap_or_else(|| request.source_url.clone()),
            bytes: media.bytes,
            duration: media.duration,
        }
    }
}

#[async_trait]
impl ItemFetch for ItemFetcher {
    async fn fetch_item(&self, request: &DownloadRequest) -> ItemResult {
        let started = Instant::now();
        let mut strategy = Strategy::Primary;

        loop {
            tracing::debug!(url = %request.source_url, strategy = %strategy, "Fetching");
            let options = self.options_for(request, strategy);

            let err = match self.extractor.fetch(&options).await {
                Ok(media) => return Self::succeeded(request, started, strategy, media),
                Err(err) => err,
            };

            let detail = err.detail();
            let class = classify_failure(&detail);

            match self.next_strategy(strategy, class) {
                Some(next) => {
                    tracing::warn!(
                        url = %request.source_url,
                        strategy = %strategy,
                        class = %class,
                        "Fetch failed, falling back to {}",
                        next
                    );
                    strategy = next;
                }
                None => {
                    return ItemResult::failed(
                        request.source_url.clone(),
                        started.elapsed(),
                        class,
                        failure_reason(class, &detail),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{OutputFormat, Quality};
    use crate::extractor::{ExtractorError, ProbeInfo};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Answers each strategy with a fixed stderr (failure) or success.
    struct ScriptedExtractor {
        failures: HashMap<Strategy, &'static str>,
        calls: Mutex<Vec<FetchOptions>>,
    }

    impl ScriptedExtractor {
        fn new(failures: &[(Strategy, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                failures: failures.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn strategies(&self) -> Vec<Strategy> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|options| options.strategy)
                .collect()
        }
    }

    #[async_trait]
    impl MediaExtractor for ScriptedExtractor {
        async fn probe(&self, _url: &str) -> Result<ProbeInfo, ExtractorError> {
            unreachable!("the fetcher never probes")
        }

        async fn fetch(&self, options: &FetchOptions) -> Result<FetchedMedia, ExtractorError> {
            self.calls.lock().unwrap().push(options.clone());
            match self.failures.get(&options.strategy) {
                Some(stderr) => Err(ExtractorError::Exited {
                    program: "yt-dlp".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: stderr.to_string(),
                }),
                None => Ok(FetchedMedia {
                    title: Some("Song".to_string()),
                    path: None,
                    bytes: 42,
                    duration: None,
                }),
            }
        }
    }

    const DENIED: &str = "ERROR: unable to download video data: HTTP Error 403: Forbidden";
    const MISSING: &str = "ERROR: [youtube] abc: Video unavailable";

    fn request() -> DownloadRequest {
        DownloadRequest {
            source_url: "https://media.test/watch?v=abc".to_string(),
            format: OutputFormat::Audio,
            quality: Quality::AudioBitrate(192),
            destination: PathBuf::from("/tmp/out"),
        }
    }

    fn fetcher(extractor: Arc<ScriptedExtractor>, with_cookies: bool) -> ItemFetcher {
        ItemFetcher::new(
            extractor,
            FetcherSettings {
                cookies_from_browser: with_cookies.then(|| "firefox".to_string()),
                accelerator: Some(Accelerator {
                    program: "aria2c".to_string(),
                    connections: 16,
                    split: 16,
                    min_split_size: "1M".to_string(),
                }),
                user_agents: UserAgentPool::new(vec!["UA-1".into(), "UA-2".into()]),
            },
        )
    }

    #[tokio::test]
    async fn test_primary_success() {
        let extractor = ScriptedExtractor::new(&[]);
        let result = fetcher(extractor.clone(), true).fetch_item(&request()).await;

        assert_eq!(result.outcome, ItemOutcome::Success);
        assert_eq!(result.title, "Song");
        assert_eq!(result.bytes, 42);
        assert_eq!(extractor.strategies(), vec![Strategy::Primary]);
    }

    #[tokio::test]
    async fn test_access_denied_tries_alternate_credentials_next() {
        let extractor = ScriptedExtractor::new(&[(Strategy::Primary, DENIED)]);
        let result = fetcher(extractor.clone(), true).fetch_item(&request()).await;

        assert_eq!(
            result.outcome,
            ItemOutcome::Degraded {
                strategy: Strategy::AlternateCredentials
            }
        );
        assert_eq!(
            extractor.strategies(),
            vec![Strategy::Primary, Strategy::AlternateCredentials]
        );

        let calls = extractor.calls.lock().unwrap();
        assert_eq!(calls[1].cookies_from_browser.as_deref(), Some("firefox"));
        assert!(calls[1].accelerator.is_none());
        assert!(calls[0].accelerator.is_some());
        assert_ne!(calls[0].user_agent, calls[1].user_agent);
    }

    #[tokio::test]
    async fn test_degraded_quality_only_after_alternate_fails() {
        let extractor = ScriptedExtractor::new(&[
            (Strategy::Primary, DENIED),
            (Strategy::AlternateCredentials, DENIED),
        ]);
        let result = fetcher(extractor.clone(), true).fetch_item(&request()).await;

        assert_eq!(
            result.outcome,
            ItemOutcome::Degraded {
                strategy: Strategy::DegradedQuality
            }
        );
        assert_eq!(
            extractor.strategies(),
            vec![
                Strategy::Primary,
                Strategy::AlternateCredentials,
                Strategy::DegradedQuality
            ]
        );
        let calls = extractor.calls.lock().unwrap();
        assert!(calls[2].cookies_from_browser.is_none());
        assert!(calls[2].user_agent.is_none());
    }

    #[tokio::test]
    async fn test_without_cookie_source_goes_straight_to_degraded() {
        let extractor = ScriptedExtractor::new(&[(Strategy::Primary, DENIED)]);
        let result = fetcher(extractor.clone(), false).fetch_item(&request()).await;

        assert!(result.outcome.is_success());
        assert_eq!(
            extractor.strategies(),
            vec![Strategy::Primary, Strategy::DegradedQuality]
        );
    }

    #[tokio::test]
    async fn test_other_failures_skip_the_chain() {
        let extractor = ScriptedExtractor::new(&[(Strategy::Primary, MISSING)]);
        let result = fetcher(extractor.clone(), true).fetch_item(&request()).await;

        assert_eq!(extractor.strategies(), vec![Strategy::Primary]);
        match result.outcome {
            ItemOutcome::Failed { class, reason } => {
                assert_eq!(class, FailureClass::NotFound);
                assert_eq!(reason, "not found: [youtube] abc: Video unavailable");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(result.title, "https://media.test/watch?v=abc");
        assert_eq!(result.bytes, 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_last_failure() {
        let extractor = ScriptedExtractor::new(&[
            (Strategy::Primary, DENIED),
            (Strategy::AlternateCredentials, DENIED),
            (Strategy::DegradedQuality, MISSING),
        ]);
        let result = fetcher(extractor.clone(), true).fetch_item(&request()).await;

        assert_eq!(extractor.strategies().len(), 3);
        assert!(matches!(
            result.outcome,
            ItemOutcome::Failed {
                class: FailureClass::NotFound,
                ..
            }
        ));
    }
}
