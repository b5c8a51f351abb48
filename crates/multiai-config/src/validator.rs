//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{COLLECTOR_MODES, Config, Settings};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the runtime configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_collector(config, &mut result);

        if config.search.max_snippets == 0 {
            result.add_warning(ValidationWarning::new(
                "search.max_snippets",
                "max_snippets is 0, search-before-send will never add context",
            ));
        }

        Ok(result)
    }

    /// Validate the host settings.
    pub fn validate_settings(settings: &Settings) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        if settings.frame_count == 0 {
            result.add_error(ValidationError::new(
                "frameCount",
                "frameCount must be greater than 0",
            ));
        }

        let enabled = settings.frames.iter().filter(|f| f.enabled).count();
        if enabled == 0 {
            result.add_warning(ValidationWarning::new(
                "frames",
                "No frame is enabled, the workspace will not open",
            ));
        } else if settings.frame_count > enabled {
            result.add_warning(ValidationWarning::new(
                "frameCount",
                format!(
                    "frameCount is {} but only {} frames are enabled",
                    settings.frame_count, enabled
                ),
            ));
        }

        for (index, frame) in settings.frames.iter().enumerate() {
            Self::validate_frame(index, frame, &mut result);
        }

        let record = &settings.dialog_record;
        if record.enabled {
            if record.file_name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    "dialogRecord.fileName",
                    "fileName cannot be empty when the dialog record is enabled",
                ));
            }
            if !record.template.contains("{{prompt}}") {
                result.add_warning(ValidationWarning::new(
                    "dialogRecord.template",
                    "template has no {{prompt}} placeholder",
                ));
            }
        }

        let history = &settings.prompt_history_settings;
        if history.enabled {
            if history.max_history == 0 {
                result.add_warning(ValidationWarning::new(
                    "promptHistorySettings.maxHistory",
                    "maxHistory 0 keeps every prompt, the history is never trimmed",
                ));
            }
            if history.max_file_size < 1024 {
                result.add_warning(ValidationWarning::new(
                    "promptHistorySettings.maxFileSize",
                    "maxFileSize below 1 KiB splits nearly every record into its own file",
                ));
            }
            if history.use_new_storage && history.new_storage_folder.trim().is_empty() {
                result.add_error(ValidationError::new(
                    "promptHistorySettings.newStorageFolder",
                    "newStorageFolder cannot be empty",
                ));
            }
        }

        Ok(result)
    }

    fn validate_frame(index: usize, frame: &crate::schema::FrameConfig, result: &mut ValidationResult) {
        let path = format!("frames[{}]", index);

        if frame.url.trim().is_empty() {
            result.add_error(ValidationError::new(format!("{}.url", path), "url cannot be empty"));
        } else if !frame.url.starts_with("http://") && !frame.url.starts_with("https://") {
            result.add_error(ValidationError::new(
                format!("{}.url", path),
                "url must start with http:// or https://",
            ));
        } else if url::Url::parse(&frame.url).map(|u| u.host_str().is_none()).unwrap_or(true) {
            result.add_error(ValidationError::new(
                format!("{}.url", path),
                format!("url has no host: {}", frame.url),
            ));
        }

        if frame.display_name.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                format!("{}.displayName", path),
                "displayName is empty",
            ));
        }

        if !frame.enabled {
            return;
        }

        if frame.selectors.send.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                format!("{}.selectors.send", path),
                "send selector not set, the built-in selector for this site is used if there is one",
            ));
        }
        if frame.selectors.ai_response.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                format!("{}.selectors.aiResponse", path),
                "aiResponse selector not set, replies from this frame are not collected",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "debug_port cannot be 0",
            ));
        }
    }

    fn validate_collector(config: &Config, result: &mut ValidationResult) {
        let collector = &config.collector;
        if !COLLECTOR_MODES.contains(&collector.mode.as_str()) {
            result.add_error(ValidationError::new(
                "collector.mode",
                format!(
                    "Unknown collector mode '{}', valid values: {:?}",
                    collector.mode, COLLECTOR_MODES
                ),
            ));
        }

        if collector.mode == "poll" {
            if collector.interval_ms == 0 {
                result.add_error(ValidationError::new(
                    "collector.interval_ms",
                    "interval_ms must be greater than 0",
                ));
            }
            if collector.max_wait_ms < collector.stable_for_ms {
                result.add_warning(ValidationWarning::new(
                    "collector.max_wait_ms",
                    "max_wait_ms is shorter than stable_for_ms, replies will always be reported incomplete",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
