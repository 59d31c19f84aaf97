//! Chromium render session over the DevTools protocol

use crate::config::{BrowserConfig, IdleConfig, IdleStrategy};
use crate::render::idle::{IdleTracker, NetworkEvent};
use crate::render::{RenderError, RenderSession};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How often the idle condition is re-checked while nothing else happens
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lower bound for a single idle wait, so a satisfied window never spins
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A single Chromium instance with one page
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: Option<JoinHandle<()>>,
    idle: IdleConfig,
}

impl ChromeSession {
    /// Launches the browser and opens the page every navigation will use
    ///
    /// `request_timeout` bounds each individual DevTools command; it should be
    /// at least the navigation timeout so a slow `goto` is reported by the
    /// session's own idle deadline instead.
    pub async fn launch(
        config: &BrowserConfig,
        idle: &IdleConfig,
        request_timeout: Duration,
    ) -> Result<Self, RenderError> {
        let mut builder = LaunchConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(request_timeout);

        if config.no_sandbox {
            builder = builder.no_sandbox();
        }

        if config.headless {
            tracing::info!("Launching browser in headless mode");
        } else {
            tracing::info!("Launching browser in visible mode");
            builder = builder.with_head();
        }

        let executable = config
            .executable
            .clone()
            .or_else(|| std::env::var_os("CHROME_BIN").map(Into::into));
        if let Some(executable) = executable {
            tracing::info!("Using Chrome binary: {}", executable.display());
            builder = builder.chrome_executable(executable);
        }

        let launch_config = builder
            .build()
            .map_err(|e| RenderError::Launch(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(format!("failed to open page: {}", e)))?;

        page.execute(EnableParams::default())
            .await
            .map_err(|e| RenderError::Launch(format!("failed to enable network events: {}", e)))?;

        Ok(Self {
            browser,
            page,
            handler_task: Some(handler_task),
            idle: idle.clone(),
        })
    }

    /// Fails if the DevTools connection is gone (crash, or already closed)
    fn ensure_alive(&self) -> Result<(), RenderError> {
        match &self.handler_task {
            Some(task) if !task.is_finished() => Ok(()),
            Some(_) => Err(RenderError::SessionLost(
                "browser connection closed unexpectedly".to_string(),
            )),
            None => Err(RenderError::SessionLost("session already closed".to_string())),
        }
    }

    /// Upgrades an error to `SessionLost` when the browser died underneath it
    fn classify(&self, error: RenderError) -> RenderError {
        match self.ensure_alive() {
            Ok(()) => error,
            Err(_) => RenderError::SessionLost(error.to_string()),
        }
    }

    async fn load_and_settle(&self, url: &str) -> Result<(), RenderError> {
        match self.idle.strategy {
            IdleStrategy::Load => {
                self.page
                    .goto(url)
                    .await
                    .map_err(|e| RenderError::Navigation(e.to_string()))?;
            }
            IdleStrategy::NetworkIdle => self.load_until_network_idle(url).await?,
        }

        if self.idle.settle {
            self.settle().await?;
        }

        Ok(())
    }

    /// Navigates and returns once the load event fired and the network is quiet
    async fn load_until_network_idle(&self, url: &str) -> Result<(), RenderError> {
        // Subscribe first so requests issued by the navigation are not missed
        let mut events = self.network_events().await?;
        let mut tracker = IdleTracker::new(
            self.idle.max_inflight,
            self.idle.quiet_window(),
            Instant::now(),
        );

        let navigation = self.page.goto(url);
        tokio::pin!(navigation);
        let mut loaded = false;

        loop {
            let now = Instant::now();
            if loaded && tracker.is_idle(now) {
                tracing::debug!(
                    "Network idle on {} ({} requests still in flight)",
                    url,
                    tracker.inflight()
                );
                return Ok(());
            }

            let nap = tracker
                .remaining(now)
                .unwrap_or(IDLE_POLL_INTERVAL)
                .max(MIN_POLL_INTERVAL);

            tokio::select! {
                result = &mut navigation, if !loaded => {
                    result.map_err(|e| RenderError::Navigation(e.to_string()))?;
                    loaded = true;
                }
                Some(event) = events.next() => tracker.record(event, Instant::now()),
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }

    /// Merges the request lifecycle events of the page into one stream
    async fn network_events(&self) -> Result<BoxStream<'static, NetworkEvent>, RenderError> {
        let listen_error = |e: chromiumoxide::error::CdpError| {
            RenderError::Navigation(format!("failed to subscribe to network events: {}", e))
        };

        let started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listen_error)?
            .map(|event| NetworkEvent::Started(event.request_id.inner().clone()));
        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(listen_error)?
            .map(|event| NetworkEvent::Finished(event.request_id.inner().clone()));
        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listen_error)?
            .map(|event| NetworkEvent::Finished(event.request_id.inner().clone()));

        Ok(stream::select_all([started.boxed(), finished.boxed(), failed.boxed()]).boxed())
    }

    /// Gives post-load scripts a chance to run before the DOM is read
    async fn settle(&self) -> Result<(), RenderError> {
        let script = format!(
            "new Promise(resolve => {{ \
                if (window.requestIdleCallback) {{ window.requestIdleCallback(() => resolve(true)); }} \
                else {{ setTimeout(() => resolve(true), {}); }} \
            }})",
            self.idle.settle_fallback_ms
        );
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| RenderError::Navigation(format!("invalid settle script: {}", e)))?;

        self.page
            .evaluate_expression(params)
            .await
            .map_err(|e| RenderError::Navigation(format!("settle wait failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        self.ensure_alive()?;

        match tokio::time::timeout(timeout, self.load_and_settle(url)).await {
            Ok(result) => result.map_err(|e| self.classify(e)),
            Err(_) => Err(self.classify(RenderError::Timeout(timeout))),
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.ensure_alive()?;
        self.page
            .content()
            .await
            .map_err(|e| self.classify(RenderError::Content(e.to_string())))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, RenderError> {
        self.ensure_alive()?;
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| self.classify(RenderError::Screenshot(e.to_string())))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        let Some(handler_task) = self.handler_task.take() else {
            return Ok(());
        };

        self.browser
            .close()
            .await
            .map_err(|e| RenderError::SessionLost(format!("error closing browser: {}", e)))?;
        handler_task
            .await
            .map_err(|e| RenderError::SessionLost(format!("error awaiting handler: {}", e)))?;

        tracing::debug!("Browser closed");
        Ok(())
    }
}
