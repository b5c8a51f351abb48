    use super::*;
    use crate::schema::FrameConfig;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_unknown_collector_mode() {
        let mut config = Config::default();
        config.collector.mode = "magic".to_string();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "collector.mode"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.collector.interval_ms = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "collector.interval_ms"));
    }

    #[test]
    fn test_validate_fixed_mode_ignores_interval() {
        let mut config = Config::default();
        config.collector.mode = "fixed".to_string();
        config.collector.interval_ms = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_short_max_wait_warning() {
        let mut config = Config::default();
        config.collector.max_wait_ms = 100;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "collector.max_wait_ms"));
    }

    #[test]
    fn test_validate_default_settings() {
        let settings = Settings::default();
        let result = ConfigValidator::validate_settings(&settings).unwrap();
        assert!(result.is_valid());
        // Yuanbao ships without a send selector.
        assert!(result.warnings.iter().any(|w| w.path == "frames[3].selectors.send"));
    }

    #[test]
    fn test_validate_frame_count_zero() {
        let mut settings = Settings::default();
        settings.frame_count = 0;

        let result = ConfigValidator::validate_settings(&settings).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "frameCount"));
    }

    #[test]
    fn test_validate_bad_frame_url() {
        let mut settings = Settings::default();
        settings.frames.push(FrameConfig::new("ftp://example.com", "Example"));
        settings.frames.push(FrameConfig::new("", "Empty"));

        let result = ConfigValidator::validate_settings(&settings).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "frames[4].url"));
        assert!(result.errors.iter().any(|e| e.path == "frames[5].url"));
    }

    #[test]
    fn test_validate_no_enabled_frames_warning() {
        let mut settings = Settings::default();
        for frame in &mut settings.frames {
            frame.enabled = false;
        }

        let result = ConfigValidator::validate_settings(&settings).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "frames"));
    }

    #[test]
    fn test_validate_max_history_zero_means_unlimited() {
        let mut settings = Settings::default();
        settings.prompt_history_settings.max_history = 0;

        let result = ConfigValidator::validate_settings(&settings).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "promptHistorySettings.maxHistory"));
    }

    #[test]
    fn test_validate_disabled_history_skips_checks() {
        let mut settings = Settings::default();
        settings.prompt_history_settings.enabled = false;
        settings.prompt_history_settings.max_history = 0;

        let result = ConfigValidator::validate_settings(&settings).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_empty_record_file_name() {
        let mut settings = Settings::default();
        settings.dialog_record.file_name = " ".to_string();

        let result = ConfigValidator::validate_settings(&settings).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "dialogRecord.fileName"));
    }

    #[test]
    fn test_validation_result_methods() {
        let mut result = ValidationResult::default();
        assert!(result.is_valid());

        result.add_warning(ValidationWarning::new("path", "warning"));
        assert!(result.is_valid());

        result.add_error(ValidationError::new("path", "error"));
        assert!(!result.is_valid());
    }
