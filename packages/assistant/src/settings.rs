//! User settings: API credential, prompt templates, extra requirements.
//!
//! A [`SettingsStore`] is the persistence seam. [`Settings`] is the loaded,
//! defaulted view handed to sessions; it only changes on an explicit
//! [`Settings::reload`] or one of the setters.

use openrouter_client::SecretString;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{AssistError, Result};

/// Reply prompt used until the user stores their own.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a helpful assistant providing suggestions for a Reddit reply.

Original post: {{originalPost}}
{{#if replyContent}}Reply to: {{replyContent}}{{/if}}
Subreddit: {{subreddit}}
{{#if additionalRequirements}}Additional requirements: {{additionalRequirements}}{{/if}}

Please generate EXACTLY 3 different reply options that would be appropriate for this subreddit. Each option should have a different tone or approach:
1. A thoughtful, detailed response
2. A concise, to-the-point response
3. A friendly, conversational response
The response should be clear and concise, use simple words, ideally with some personal experience.

You MUST format your response as a valid JSON object with the following structure:
{
  "options": [
    {
      "type": "thoughtful",
      "content": "First reply option text here..."
    },
    {
      "type": "concise",
      "content": "Second reply option text here..."
    },
    {
      "type": "friendly",
      "content": "Third reply option text here..."
    }
  ]
}

DO NOT include any explanations or additional text outside this JSON structure. ONLY return the JSON object."#;

/// Translation prompt used until the user stores their own.
pub const DEFAULT_TRANSLATION_PROMPT: &str = r#"请将以下英文内容翻译成中文，并在翻译后添加一个简短的解释，帮助理解内容的背景和要点：

{{content}}

请按照以下格式回复：

## 中文翻译
[翻译内容]

## 简要解释
[解释内容]"#;

/// The fixed set of setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ApiKey,
    PromptTemplate,
    TranslationPrompt,
    AdditionalRequirements,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::ApiKey,
        SettingKey::PromptTemplate,
        SettingKey::TranslationPrompt,
        SettingKey::AdditionalRequirements,
    ];

    /// Name under which the value is persisted.
    pub fn storage_name(self) -> &'static str {
        match self {
            SettingKey::ApiKey => "openRouterApiKey",
            SettingKey::PromptTemplate => "promptTemplate",
            SettingKey::TranslationPrompt => "translationPrompt",
            SettingKey::AdditionalRequirements => "additionalRequirements",
        }
    }

    /// Kebab-case name used on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            SettingKey::ApiKey => "api-key",
            SettingKey::PromptTemplate => "prompt-template",
            SettingKey::TranslationPrompt => "translation-prompt",
            SettingKey::AdditionalRequirements => "additional-requirements",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

impl FromStr for SettingKey {
    type Err = AssistError;

    /// Accepts either the storage name or the CLI name.
    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.storage_name() == s || key.cli_name() == s)
            .ok_or_else(|| AssistError::Settings(format!("Unknown setting: {}", s)))
    }
}

/// Key-value persistence for settings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: SettingKey) -> Result<Option<String>>;
    fn set(&self, key: SettingKey, value: &str) -> Result<()>;
}

fn poisoned<E>(_: E) -> AssistError {
    AssistError::Settings("settings lock poisoned".into())
}

/// In-memory store for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<SettingKey, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one value.
    pub fn with(self, key: SettingKey, value: impl Into<String>) -> Self {
        if let Ok(mut values) = self.values.write() {
            values.insert(key, value.into());
        }
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: SettingKey) -> Result<Option<String>> {
        Ok(self.values.read().map_err(poisoned)?.get(&key).cloned())
    }

    fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        self.values
            .write()
            .map_err(poisoned)?
            .insert(key, value.to_string());
        Ok(())
    }
}

/// Settings persisted as one JSON object keyed by storage name.
///
/// Unknown keys in the file are preserved on write. A missing file reads as
/// empty.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(AssistError::Settings(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: SettingKey) -> Result<Option<String>> {
        Ok(self
            .read_all()?
            .get(key.storage_name())
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(poisoned)?;

        let mut values = self.read_all()?;
        values.insert(key.storage_name().to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;

        debug!(key = key.storage_name(), path = %self.path.display(), "Setting saved");
        Ok(())
    }
}

/// Loaded settings with defaults applied.
pub struct Settings {
    store: Arc<dyn SettingsStore>,
    api_key: Option<SecretString>,
    prompt_template: String,
    translation_prompt: String,
    additional_requirements: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key)
            .field("prompt_template_len", &self.prompt_template.len())
            .field("translation_prompt_len", &self.translation_prompt.len())
            .field("additional_requirements", &self.additional_requirements)
            .finish()
    }
}

impl Settings {
    /// Read every key from `store`, falling back to defaults for absent or
    /// empty values.
    pub fn load(store: Arc<dyn SettingsStore>) -> Result<Self> {
        let mut settings = Self {
            store,
            api_key: None,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            translation_prompt: DEFAULT_TRANSLATION_PROMPT.to_string(),
            additional_requirements: String::new(),
        };
        settings.reload()?;
        Ok(settings)
    }

    /// Re-read the store. Values removed from the store revert to defaults.
    pub fn reload(&mut self) -> Result<()> {
        let stored = |key| -> Result<Option<String>> {
            Ok(self.store.get(key)?.filter(|v| !v.is_empty()))
        };

        let api_key = stored(SettingKey::ApiKey)?.map(SecretString::new);
        let prompt_template = stored(SettingKey::PromptTemplate)?
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string());
        let translation_prompt = stored(SettingKey::TranslationPrompt)?
            .unwrap_or_else(|| DEFAULT_TRANSLATION_PROMPT.to_string());
        let additional_requirements = stored(SettingKey::AdditionalRequirements)?.unwrap_or_default();

        self.api_key = api_key;
        self.prompt_template = prompt_template;
        self.translation_prompt = translation_prompt;
        self.additional_requirements = additional_requirements;

        info!(
            has_api_key = self.api_key.is_some(),
            custom_prompt = self.prompt_template != DEFAULT_PROMPT_TEMPLATE,
            "Settings loaded"
        );
        Ok(())
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    pub fn translation_prompt(&self) -> &str {
        &self.translation_prompt
    }

    pub fn additional_requirements(&self) -> &str {
        &self.additional_requirements
    }

    /// Current value for `key` as displayed to the user. The API key is redacted.
    pub fn display_value(&self, key: SettingKey) -> String {
        match key {
            SettingKey::ApiKey => match &self.api_key {
                Some(key) => key.to_string(),
                None => String::new(),
            },
            SettingKey::PromptTemplate => self.prompt_template.clone(),
            SettingKey::TranslationPrompt => self.translation_prompt.clone(),
            SettingKey::AdditionalRequirements => self.additional_requirements.clone(),
        }
    }

    /// Persist one value and reflect it in this view.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        self.store.set(key, value)?;
        self.reload()
    }

    pub fn set_api_key(&mut self, value: &str) -> Result<()> {
        self.set(SettingKey::ApiKey, value)
    }

    pub fn set_prompt_template(&mut self, value: &str) -> Result<()> {
        self.set(SettingKey::PromptTemplate, value)
    }

    pub fn set_translation_prompt(&mut self, value: &str) -> Result<()> {
        self.set(SettingKey::TranslationPrompt, value)
    }

    pub fn set_additional_requirements(&mut self, value: &str) -> Result<()> {
        self.set(SettingKey::AdditionalRequirements, value)
    }

    /// Replace the credential for this process without persisting it.
    pub fn override_api_key(&mut self, key: SecretString) {
        self.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_store_is_empty() {
        let settings = Settings::load(Arc::new(MemorySettingsStore::new())).unwrap();

        assert!(settings.api_key().is_none());
        assert_eq!(settings.prompt_template(), DEFAULT_PROMPT_TEMPLATE);
        assert_eq!(settings.translation_prompt(), DEFAULT_TRANSLATION_PROMPT);
        assert_eq!(settings.additional_requirements(), "");
    }

    #[test]
    fn test_empty_stored_values_fall_back() {
        let store = MemorySettingsStore::new()
            .with(SettingKey::ApiKey, "")
            .with(SettingKey::PromptTemplate, "");
        let settings = Settings::load(Arc::new(store)).unwrap();

        assert!(settings.api_key().is_none());
        assert_eq!(settings.prompt_template(), DEFAULT_PROMPT_TEMPLATE);
    }

    #[test]
    fn test_setters_persist_and_update_view() {
        let store = Arc::new(MemorySettingsStore::new());
        let mut settings = Settings::load(store.clone()).unwrap();

        settings.set_api_key("sk-or-123").unwrap();
        settings.set_additional_requirements("Keep it short").unwrap();

        assert_eq!(settings.api_key().unwrap().expose(), "sk-or-123");
        assert_eq!(settings.additional_requirements(), "Keep it short");
        assert_eq!(
            store.get(SettingKey::AdditionalRequirements).unwrap().as_deref(),
            Some("Keep it short")
        );
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let store = Arc::new(MemorySettingsStore::new());
        let mut settings = Settings::load(store.clone()).unwrap();

        store.set(SettingKey::TranslationPrompt, "Translate: {{content}}").unwrap();
        assert_eq!(settings.translation_prompt(), DEFAULT_TRANSLATION_PROMPT);

        settings.reload().unwrap();
        assert_eq!(settings.translation_prompt(), "Translate: {{content}}");
    }

    #[test]
    fn test_api_key_is_redacted_for_display() {
        let store = MemorySettingsStore::new().with(SettingKey::ApiKey, "sk-or-secret");
        let settings = Settings::load(Arc::new(store)).unwrap();

        assert_eq!(settings.display_value(SettingKey::ApiKey), "[REDACTED]");
        assert!(!format!("{:?}", settings).contains("sk-or-secret"));
    }

    #[test]
    fn test_key_names() {
        assert_eq!("openRouterApiKey".parse::<SettingKey>().unwrap(), SettingKey::ApiKey);
        assert_eq!(
            "additional-requirements".parse::<SettingKey>().unwrap(),
            SettingKey::AdditionalRequirements
        );
        assert!("theme".parse::<SettingKey>().is_err());
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = JsonFileSettingsStore::new(&path);

        assert_eq!(store.get(SettingKey::PromptTemplate).unwrap(), None);

        store.set(SettingKey::PromptTemplate, "Post: {{originalPost}}").unwrap();
        store.set(SettingKey::ApiKey, "sk-or-1").unwrap();

        let reopened = JsonFileSettingsStore::new(&path);
        assert_eq!(
            reopened.get(SettingKey::PromptTemplate).unwrap().as_deref(),
            Some("Post: {{originalPost}}")
        );

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["openRouterApiKey"], "sk-or-1");
    }

    #[test]
    fn test_json_file_store_keeps_unknown_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        JsonFileSettingsStore::new(&path)
            .set(SettingKey::AdditionalRequirements, "No emojis")
            .unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["additionalRequirements"], "No emojis");
    }

    #[test]
    fn test_json_file_store_rejects_non_object() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = JsonFileSettingsStore::new(&path).get(SettingKey::ApiKey).unwrap_err();
        assert!(matches!(err, AssistError::Settings(_)));
    }
}
