//! Host-persisted plugin settings (JSON, camelCase keys).

use serde::{Deserialize, Serialize};

use super::default_true;

/// Root settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// How many enabled frames take part in a dispatch.
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,

    #[serde(default = "default_true")]
    pub show_prompt_input: bool,

    #[serde(default)]
    pub search_mode: SearchMode,

    #[serde(default)]
    pub dialog_record: DialogRecordSettings,

    #[serde(default)]
    pub prompt_history_settings: PromptHistorySettings,

    #[serde(default = "default_frames")]
    pub frames: Vec<FrameConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_count: default_frame_count(),
            show_prompt_input: true,
            search_mode: SearchMode::default(),
            dialog_record: DialogRecordSettings::default(),
            prompt_history_settings: PromptHistorySettings::default(),
            frames: default_frames(),
        }
    }
}

impl Settings {
    /// Frames that take part in the workspace: enabled ones, capped at `frame_count`.
    pub fn active_frames(&self) -> Vec<&FrameConfig> {
        self.frames
            .iter()
            .filter(|f| f.enabled)
            .take(self.frame_count)
            .collect()
    }
}

fn default_frame_count() -> usize {
    4
}

/// Search-before-send mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Disabled,
    VaultOnly,
    SmartOnly,
    Combined,
}

impl SearchMode {
    pub fn uses_vault(&self) -> bool {
        matches!(self, SearchMode::VaultOnly | SearchMode::Combined)
    }

    pub fn uses_history(&self) -> bool {
        matches!(self, SearchMode::SmartOnly | SearchMode::Combined)
    }
}

/// Markdown dialog transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogRecordSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_record_folder")]
    pub folder_path: String,

    #[serde(default = "default_record_file")]
    pub file_name: String,

    /// Supports `{{datetime}}`, `{{prompt}}` and `{{response}}`.
    #[serde(default = "default_record_template")]
    pub template: String,
}

impl Default for DialogRecordSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            folder_path: default_record_folder(),
            file_name: default_record_file(),
            template: default_record_template(),
        }
    }
}

fn default_record_folder() -> String {
    "AI Dialogs".to_string()
}

fn default_record_file() -> String {
    "AI Dialogs.md".to_string()
}

fn default_record_template() -> String {
    "## {{datetime}}\n\n### Prompt\n{{prompt}}\n\n### Replies\n{{response}}\n\n---\n".to_string()
}

/// Prompt history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptHistorySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_history")]
    pub max_history: usize,

    #[serde(default = "default_true")]
    pub auto_save: bool,

    #[serde(default = "default_true")]
    pub show_timestamp: bool,

    #[serde(default = "default_true")]
    pub show_platform: bool,

    /// Monthly partitions when true, a single legacy file otherwise.
    #[serde(default = "default_true")]
    pub use_new_storage: bool,

    #[serde(default = "default_history_folder")]
    pub new_storage_folder: String,

    /// Upper bound for one partition file in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for PromptHistorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history: default_max_history(),
            auto_save: true,
            show_timestamp: true,
            show_platform: true,
            use_new_storage: true,
            new_storage_folder: default_history_folder(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_history() -> usize {
    1000
}

fn default_history_folder() -> String {
    "prompt-history".to_string()
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

/// One configured AI site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameConfig {
    pub url: String,

    pub display_name: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub selectors: FrameSelectors,
}

fn default_icon() -> String {
    "bot".to_string()
}

impl FrameConfig {
    pub fn new(url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: display_name.into(),
            icon: default_icon(),
            enabled: true,
            selectors: FrameSelectors::default(),
        }
    }

    pub fn with_selectors(mut self, selectors: FrameSelectors) -> Self {
        self.selectors = selectors;
        self
    }
}

/// CSS selectors for one frame. Empty strings mean "not configured".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSelectors {
    #[serde(default)]
    pub input: String,

    #[serde(default)]
    pub input_type: InputType,

    #[serde(default)]
    pub send: String,

    #[serde(default)]
    pub send_type: SendType,

    #[serde(default)]
    pub user_message: String,

    #[serde(default)]
    pub ai_response: String,
}

/// Kind of chat input element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    ContentEditable,
    Textarea,
    Input,
}

/// How the send action is triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendType {
    #[default]
    Click,
    Enter,
}

fn default_frames() -> Vec<FrameConfig> {
    vec![
        FrameConfig::new("https://chatgpt.com", "ChatGPT").with_selectors(FrameSelectors {
            input: "#prompt-textarea".to_string(),
            input_type: InputType::ContentEditable,
            send: "button[data-testid=\"send-button\"]".to_string(),
            send_type: SendType::Click,
            user_message: ".whitespace-pre-wrap".to_string(),
            ai_response: ".markdown.prose".to_string(),
        }),
        FrameConfig::new("https://kimi.moonshot.cn", "Kimi").with_selectors(FrameSelectors {
            input: "[data-testid=\"msh-chatinput-editor\"]".to_string(),
            input_type: InputType::ContentEditable,
            send: "[data-testid=\"msh-chatinput-send-button\"]".to_string(),
            send_type: SendType::Click,
            user_message: ".MuiTypography-root.MuiTypography-text".to_string(),
            ai_response: ".markdown___vuBDJ".to_string(),
        }),
        FrameConfig::new("https://www.doubao.com", "Doubao").with_selectors(FrameSelectors {
            input: "textarea.semi-input-textarea".to_string(),
            input_type: InputType::Textarea,
            send: "#flow-end-msg-send".to_string(),
            send_type: SendType::Click,
            user_message: "[data-testid=\"send_message\"]".to_string(),
            ai_response: "[data-testid=\"receive_message\"]".to_string(),
        }),
        FrameConfig::new("https://yuanbao.tencent.com/", "Yuanbao").with_selectors(FrameSelectors {
            input: ".ql-editor[contenteditable=\"true\"]".to_string(),
            input_type: InputType::ContentEditable,
            send: String::new(),
            send_type: SendType::Click,
            user_message: ".hyc-content-text".to_string(),
            ai_response: ".agent-chat__conv--ai__speech_show".to_string(),
        }),
    ]
}
