//! Provider presets used to seed new profiles.

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::profile::{CUSTOM_PROVIDER, Profile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTemplate {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    pub requires_api_key: bool,
    pub clear_anthropic_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_instructions: Option<String>,
}

struct Builtin {
    name: &'static str,
    display_name: &'static str,
    description: &'static str,
    base_url: &'static str,
    default_model: Option<&'static str>,
    requires_api_key: bool,
    clear_anthropic_key: bool,
    setup_instructions: &'static str,
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "anthropic",
        display_name: "Anthropic",
        description: "Official Anthropic API",
        base_url: "https://api.anthropic.com",
        default_model: None,
        requires_api_key: true,
        clear_anthropic_key: false,
        setup_instructions: "Create a key at https://console.anthropic.com/settings/keys",
    },
    Builtin {
        name: "openrouter",
        display_name: "OpenRouter",
        description: "OpenRouter's Anthropic-compatible gateway",
        base_url: "https://openrouter.ai/api",
        default_model: Some("anthropic/claude-sonnet-4"),
        requires_api_key: true,
        clear_anthropic_key: true,
        setup_instructions: "Create a key at https://openrouter.ai/keys",
    },
    Builtin {
        name: "deepseek",
        display_name: "DeepSeek",
        description: "DeepSeek's Anthropic-compatible endpoint",
        base_url: "https://api.deepseek.com/anthropic",
        default_model: Some("deepseek-chat"),
        requires_api_key: true,
        clear_anthropic_key: true,
        setup_instructions: "Create a key at https://platform.deepseek.com/api_keys",
    },
    Builtin {
        name: "zai",
        display_name: "Z.ai",
        description: "Z.ai GLM models through the Anthropic-compatible API",
        base_url: "https://api.z.ai/api/anthropic",
        default_model: Some("glm-4.6"),
        requires_api_key: true,
        clear_anthropic_key: true,
        setup_instructions: "Create a key at https://z.ai/manage-apikey/apikey-list",
    },
    Builtin {
        name: "moonshot",
        display_name: "Moonshot AI",
        description: "Kimi models through the Anthropic-compatible API",
        base_url: "https://api.moonshot.ai/anthropic",
        default_model: Some("kimi-k2-turbo-preview"),
        requires_api_key: true,
        clear_anthropic_key: true,
        setup_instructions: "Create a key at https://platform.moonshot.ai/console/api-keys",
    },
    Builtin {
        name: "minimax",
        display_name: "MiniMax",
        description: "MiniMax models through the Anthropic-compatible API",
        base_url: "https://api.minimax.io/anthropic",
        default_model: Some("MiniMax-M2"),
        requires_api_key: true,
        clear_anthropic_key: true,
        setup_instructions: "Create a key at https://platform.minimax.io/user-center/basic-information/interface-key",
    },
    Builtin {
        name: CUSTOM_PROVIDER,
        display_name: "Custom",
        description: "Any Anthropic-compatible endpoint",
        base_url: "",
        default_model: None,
        requires_api_key: false,
        clear_anthropic_key: true,
        setup_instructions: "Pass --base-url with the endpoint of your proxy or gateway",
    },
];

impl From<&Builtin> for ProviderTemplate {
    fn from(builtin: &Builtin) -> Self {
        Self {
            name: builtin.name.to_string(),
            display_name: builtin.display_name.to_string(),
            description: builtin.description.to_string(),
            base_url: builtin.base_url.to_string(),
            default_model: builtin.default_model.map(str::to_string),
            requires_api_key: builtin.requires_api_key,
            clear_anthropic_key: builtin.clear_anthropic_key,
            setup_instructions: Some(builtin.setup_instructions.to_string()),
        }
    }
}

#[must_use]
pub fn builtin_templates() -> Vec<ProviderTemplate> {
    BUILTINS.iter().map(ProviderTemplate::from).collect()
}

#[must_use]
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|builtin| builtin.name == name)
}

/// Built-in templates with user-configured ones layered on top.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: IndexMap<String, ProviderTemplate>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::with_overrides(std::iter::empty())
    }
}

impl TemplateCatalog {
    /// Overrides replace a built-in of the same name in place; new names
    /// are appended after the built-ins in the order given.
    pub fn with_overrides(overrides: impl IntoIterator<Item = ProviderTemplate>) -> Self {
        let mut templates = builtin_templates()
            .into_iter()
            .map(|template| (template.name.clone(), template))
            .collect::<IndexMap<_, _>>();
        for template in overrides {
            templates.insert(template.name.clone(), template);
        }
        Self { templates }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProviderTemplate> {
        self.templates.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderTemplate> {
        self.templates.values()
    }

    #[must_use]
    pub fn names(&self) -> String {
        self.templates.keys().join(", ")
    }

    /// # Errors
    ///
    /// Returns [`AppError::UnknownTemplate`] listing the available names.
    pub fn require(&self, name: &str) -> Result<&ProviderTemplate, AppError> {
        self.get(name).ok_or_else(|| AppError::UnknownTemplate {
            name: name.to_string(),
            available: self.names(),
        })
    }
}

impl ProviderTemplate {
    /// Start a profile from this template. Fields left empty here are
    /// expected to be filled by the caller's explicit flags.
    #[must_use]
    pub fn seed_profile(&self, name: &str) -> Profile {
        let mut profile = Profile::new(name, self.base_url.clone());
        profile.provider.clone_from(&self.name);
        profile.model.clone_from(&self.default_model);
        profile.clear_anthropic_key = self.clear_anthropic_key;
        profile.description = Some(self.description.clone()).filter(|text| !text.is_empty());
        profile
    }
}
