use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default navigation timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default retry budget, including the first attempt
pub const DEFAULT_RETRIES: u32 = 3;

/// Default pause between navigation attempts (milliseconds)
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1_000;

/// Main configuration structure for a mirror run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// URLs to mirror, in order
    pub urls: Vec<String>,
    pub output: OutputConfig,
    pub navigation: NavigationConfig,
    pub idle: IdleConfig,
    pub browser: BrowserConfig,
}

/// Where artifacts are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root of the mirrored HTML tree
    pub directory: PathBuf,

    /// Whether a full-page screenshot is captured for each page
    pub screenshots: bool,

    /// Root of the screenshot tree
    pub screenshot_directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("dist"),
            screenshots: false,
            screenshot_directory: PathBuf::from("screenshots"),
        }
    }
}

/// Navigation timeout and retry budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NavigationConfig {
    /// Upper bound for one navigation attempt, idle wait included (milliseconds)
    pub timeout_ms: u64,

    /// Maximum number of attempts per URL (1 disables retrying)
    pub retries: u32,

    /// Fixed delay between attempts (milliseconds)
    pub retry_interval_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
        }
    }
}

impl NavigationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// How a page is judged to have finished loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IdleStrategy {
    /// Load event plus a quiet network window
    NetworkIdle,
    /// Load event only
    Load,
}

/// Idle-detection behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdleConfig {
    pub strategy: IdleStrategy,

    /// Highest number of in-flight requests that still counts as idle
    pub max_inflight: usize,

    /// How long the network must stay idle (milliseconds)
    pub quiet_window_ms: u64,

    /// Wait for an idle callback in the page before reading the DOM
    pub settle: bool,

    /// Fixed settle delay used when the page has no idle callback (milliseconds)
    pub settle_fallback_ms: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            strategy: IdleStrategy::NetworkIdle,
            max_inflight: 2,
            quiet_window_ms: 500,
            settle: true,
            settle_fallback_ms: 500,
        }
    }
}

impl IdleConfig {
    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }
}

/// Browser launch options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub headless: bool,

    /// Pass `--no-sandbox`; needed in most containers
    pub no_sandbox: bool,

    /// Chrome/Chromium binary; falls back to `CHROME_BIN`, then auto-detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            executable: None,
            window_width: 1280,
            window_height: 800,
        }
    }
}
