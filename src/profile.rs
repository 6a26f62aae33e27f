use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AppError;

/// Placeholder shown wherever a stored secret would otherwise be printed.
pub const MASK: &str = "********";
pub const CUSTOM_PROVIDER: &str = "custom";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("profile name pattern"));
static ENV_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env name pattern"));

/// One named backend configuration.
///
/// `model` is tri-state: `None` was never set, `Some("")` was cleared through
/// an edit and activation unsets the variable, anything else is exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_clear_key")]
    pub clear_anthropic_key: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_env: BTreeMap<String, String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn default_provider() -> String {
    CUSTOM_PROVIDER.to_string()
}

fn default_clear_key() -> bool {
    true
}

impl Profile {
    /// A `custom` profile stamped with the current time.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let now = now();
        Self {
            name: name.into(),
            description: None,
            provider: default_provider(),
            base_url: base_url.into(),
            model: None,
            api_key: None,
            clear_anthropic_key: true,
            extra_env: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the structural invariants every stored profile must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        if self.base_url.trim().is_empty() {
            return Err(AppError::validation(format!(
                "profile '{}' requires a base URL",
                self.name
            )));
        }
        for key in self.extra_env.keys() {
            validate_env_name(key)?;
        }
        if self.updated_at < self.created_at {
            return Err(AppError::validation(format!(
                "profile '{}' was updated before it was created",
                self.name
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    /// Copy safe to display: the API key, when present, becomes [`MASK`].
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if copy.has_api_key() {
            copy.api_key = Some(MASK.to_string());
        }
        copy
    }

    /// Copy safe to share: the API key is dropped entirely.
    #[must_use]
    pub fn exported(&self) -> Self {
        let mut copy = self.clone();
        copy.api_key = None;
        copy
    }
}

pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// # Errors
///
/// Returns [`AppError::Validation`] when the name is empty or contains
/// characters outside `[A-Za-z0-9_-]`.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("profile name is required"));
    }
    if !NAME_RE.is_match(name) {
        return Err(AppError::validation(format!(
            "invalid profile name '{name}': only letters, digits, '-' and '_' are allowed"
        )));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`AppError::Validation`] when the name is not a portable
/// environment variable identifier.
pub fn validate_env_name(name: &str) -> Result<(), AppError> {
    if ENV_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "invalid environment variable name '{name}'"
        )))
    }
}

/// Split a `KEY=VALUE` flag into its parts. The value may itself contain `=`.
///
/// # Errors
///
/// Returns [`AppError::Validation`] when the separator is missing or the key
/// is not a valid variable name.
pub fn parse_env_pair(raw: &str) -> Result<(String, String), AppError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| AppError::validation(format!("invalid env '{raw}', expected KEY=VALUE")))?;
    let key = key.trim();
    validate_env_name(key)?;
    Ok((key.to_string(), value.to_string()))
}

/// Field updates for an existing profile; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub description: Option<String>,
    pub clear_anthropic_key: Option<bool>,
    pub set_env: Vec<(String, String)>,
    pub unset_env: Vec<String>,
}

impl ProfileEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base_url.is_none()
            && self.model.is_none()
            && self.api_key.is_none()
            && self.description.is_none()
            && self.clear_anthropic_key.is_none()
            && self.set_env.is_empty()
            && self.unset_env.is_empty()
    }

    /// Apply the updates and stamp `updated_at`.
    ///
    /// An empty model is kept as `Some("")` so activation clears the variable;
    /// an empty API key or description removes the field.
    pub fn apply(&self, profile: &mut Profile, at: OffsetDateTime) {
        if let Some(base_url) = &self.base_url {
            profile.base_url.clone_from(base_url);
        }
        if let Some(model) = &self.model {
            profile.model = Some(model.clone());
        }
        if let Some(api_key) = &self.api_key {
            profile.api_key = non_empty(api_key);
        }
        if let Some(description) = &self.description {
            profile.description = non_empty(description);
        }
        if let Some(clear) = self.clear_anthropic_key {
            profile.clear_anthropic_key = clear;
        }
        for key in &self.unset_env {
            profile.extra_env.remove(key);
        }
        for (key, value) in &self.set_env {
            profile.extra_env.insert(key.clone(), value.clone());
        }
        profile.updated_at = at.max(profile.created_at);
    }
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Lenient shape accepted by `import`: exported profiles, hand-written JSON,
/// and payloads produced by older releases all decode through here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImport {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub clear_anthropic_key: Option<bool>,
    #[serde(default)]
    pub extra_env: BTreeMap<String, String>,
}

impl ProfileImport {
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when the input is not a JSON object of
    /// the expected shape.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|err| AppError::validation(format!("invalid JSON: {err}")))
    }

    /// Build a fresh profile; timestamps from the payload are never trusted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when no name is available or the
    /// resulting profile breaks an invariant.
    pub fn into_profile(
        self,
        name_override: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<Profile, AppError> {
        let name = name_override
            .map(str::to_string)
            .or(self.name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                AppError::validation(
                    "profile name is required; pass --name or include \"name\" in the JSON",
                )
            })?;

        let profile = Profile {
            name,
            description: self.description.filter(|text| !text.is_empty()),
            provider: self
                .provider
                .filter(|provider| !provider.is_empty())
                .unwrap_or_else(default_provider),
            base_url: self.base_url.unwrap_or_default(),
            model: self.model,
            api_key: self.api_key.filter(|key| !key.is_empty()),
            clear_anthropic_key: self.clear_anthropic_key.unwrap_or(true),
            extra_env: self.extra_env,
            created_at: at,
            updated_at: at,
        };
        profile.validate()?;
        Ok(profile)
    }
}
