use crate::services::env::DEFAULT_LOCALE;
use crate::{CallbackContext, Context};
use fluent::{FluentArgs, FluentResource};
use fluent_bundle::bundle::FluentBundle;
use include_dir::{Dir, include_dir};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use unic_langid::LanguageIdentifier;

// We use the concurrent memoizer to ensure thread safety (Sync + Send)
type ConcurrentBundle = FluentBundle<FluentResource, intl_memoizer::concurrent::IntlLangMemoizer>;

// Embed the locales directory at compile time
static LOCALES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/locales");

/// Localized help for one command, from `commands.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandLocale {
    pub desc: Option<String>,
    pub usage: Option<String>,
}

pub struct LocalizationManager {
    bundles: HashMap<LanguageIdentifier, ConcurrentBundle>,
    command_locales: HashMap<LanguageIdentifier, HashMap<String, CommandLocale>>,
    fallback: LanguageIdentifier,
}

impl LocalizationManager {
    pub fn new() -> Self {
        let mut bundles = HashMap::new();
        let mut command_locales = HashMap::new();

        // Iterate over subdirectories in the embedded locales directory
        for entry in LOCALES_DIR.dirs() {
            let locale_name = entry.path().to_string_lossy();

            let Ok(lang_id) = locale_name.parse::<LanguageIdentifier>() else {
                error!("Skipping locale directory with invalid name: {}", locale_name);
                continue;
            };

            let mut bundle = ConcurrentBundle::new_concurrent(vec![lang_id.clone()]);
            // Replies are Telegram HTML, bidi isolation marks would end up in the text
            bundle.set_use_isolating(false);
            let mut commands = HashMap::new();

            for file in entry.files() {
                let path = file.path();
                let extension = path.extension().and_then(|e| e.to_str());
                let file_name = path.file_name().and_then(|n| n.to_str());
                let Some(content) = file.contents_utf8() else {
                    continue;
                };

                if extension == Some("ftl") {
                    match FluentResource::try_new(content.to_string()) {
                        Ok(resource) => {
                            if let Err(errors) = bundle.add_resource(resource) {
                                for err in errors {
                                    error!("Error adding resource for {}: {:?}", locale_name, err);
                                }
                            }
                        }
                        Err((_, errors)) => {
                            for err in errors {
                                error!("Error parsing resource for {}: {:?}", locale_name, err);
                            }
                        }
                    }
                } else if file_name == Some("commands.yaml") || file_name == Some("commands.yml") {
                    match serde_yaml::from_str::<HashMap<String, CommandLocale>>(content) {
                        Ok(yaml_commands) => commands.extend(yaml_commands),
                        Err(err) => {
                            error!("Error parsing commands.yaml for {}: {:?}", locale_name, err);
                        }
                    }
                }
            }

            info!("Loaded embedded locale: {}", locale_name);
            bundles.insert(lang_id.clone(), bundle);
            command_locales.insert(lang_id, commands);
        }

        Self {
            bundles,
            command_locales,
            fallback: DEFAULT_LOCALE.parse().unwrap_or_default(),
        }
    }

    pub fn get_proxy(self: &Arc<Self>, locale: &str) -> L10nProxy {
        L10nProxy {
            manager: self.clone(),
            locale: locale.to_string(),
        }
    }

    pub fn locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self.bundles.keys().map(|l| l.to_string()).collect();
        locales.sort();
        locales
    }

    pub fn translate(&self, locale: &str, key: &str, args: Option<&FluentArgs>) -> String {
        let lang_id = locale
            .parse::<LanguageIdentifier>()
            .unwrap_or_else(|_| self.fallback.clone());

        // 1. Try the requested locale, 2. fall back to en-US
        let mut candidates = vec![&lang_id];
        if lang_id != self.fallback {
            candidates.push(&self.fallback);
        }

        for candidate in candidates {
            let Some(bundle) = self.bundles.get(candidate) else {
                continue;
            };
            if let Some(pattern) = bundle.get_message(key).and_then(|m| m.value()) {
                let mut errors = vec![];
                let text = bundle.format_pattern(pattern, args, &mut errors).into_owned();
                if !errors.is_empty() {
                    error!("Errors formatting {} for {}: {:?}", key, candidate, errors);
                }
                return text;
            }
        }

        key.to_string()
    }

    /// Localized description of a command, falling back to en-US.
    pub fn command_locale(&self, locale: &str, command: &str) -> Option<&CommandLocale> {
        let lang_id = locale
            .parse::<LanguageIdentifier>()
            .unwrap_or_else(|_| self.fallback.clone());

        self.command_locales
            .get(&lang_id)
            .and_then(|c| c.get(command))
            .or_else(|| {
                self.command_locales
                    .get(&self.fallback)
                    .and_then(|c| c.get(command))
            })
    }
}

impl Default for LocalizationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A proxy for translation that holds a reference to the manager and a specific locale
#[derive(Clone)]
pub struct L10nProxy {
    pub manager: Arc<LocalizationManager>,
    pub locale: String,
}

impl L10nProxy {
    pub fn t(&self, key: &str, args: Option<&FluentArgs>) -> String {
        self.manager.translate(&self.locale, key, args)
    }
}

/// Helper trait to add localization to handler contexts
pub trait ContextL10nExt {
    fn l10n(&self) -> L10nProxy;
}

impl ContextL10nExt for Context<'_> {
    fn l10n(&self) -> L10nProxy {
        self.data().l10n.get_proxy(&self.data().settings.locale)
    }
}

impl ContextL10nExt for CallbackContext<'_> {
    fn l10n(&self) -> L10nProxy {
        self.data().l10n.get_proxy(&self.data().settings.locale)
    }
}
