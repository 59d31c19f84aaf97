use crate::config::types::{BrowserConfig, IdleConfig, NavigationConfig, OutputConfig, RunConfig};
use crate::ConfigError;

/// Upper bound on the retry budget
const MAX_RETRIES: u32 = 100;

/// Validates the entire configuration
///
/// URLs are not checked here; a malformed entry fails on its own at run time.
pub fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    validate_output_config(&config.output)?;
    validate_navigation_config(&config.navigation)?;
    validate_idle_config(&config.idle, &config.navigation)?;
    validate_browser_config(&config.browser)?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.screenshot_directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "screenshot directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates navigation timeout and retry settings
fn validate_navigation_config(config: &NavigationConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-ms must be >= 1, got {}",
            config.timeout_ms
        )));
    }

    if config.retries < 1 || config.retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "retries must be between 1 and {}, got {}",
            MAX_RETRIES, config.retries
        )));
    }

    Ok(())
}

/// Validates idle detection against the navigation budget
fn validate_idle_config(
    config: &IdleConfig,
    navigation: &NavigationConfig,
) -> Result<(), ConfigError> {
    // A quiet window longer than the timeout could never be satisfied
    if config.quiet_window_ms > navigation.timeout_ms {
        return Err(ConfigError::Validation(format!(
            "quiet-window-ms ({}) cannot exceed timeout-ms ({})",
            config.quiet_window_ms, navigation.timeout_ms
        )));
    }

    Ok(())
}

/// Validates browser launch options
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if let Some(executable) = &config.executable {
        if executable.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "browser executable cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
