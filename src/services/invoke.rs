use crate::Error;
use crate::error::CommandError;
use crate::services::host::{CacheKind, IncomingMessage, Messenger, ModuleRegistry};
use std::str::FromStr;
use tracing::info;

pub const CORE_MODULE: &str = "core";

/// Built-in diagnostics reachable through `invokecmd core <method>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreInvoke {
    ClearEntityCache,
    ClearFullUserCache,
    ClearFullChannelCache,
    ClearPermsCache,
    ClearCache,
    ReloadCore,
    InspectCache,
    InspectModules,
}

impl CoreInvoke {
    pub const ALL: [CoreInvoke; 8] = [
        CoreInvoke::ClearEntityCache,
        CoreInvoke::ClearFullUserCache,
        CoreInvoke::ClearFullChannelCache,
        CoreInvoke::ClearPermsCache,
        CoreInvoke::ClearCache,
        CoreInvoke::ReloadCore,
        CoreInvoke::InspectCache,
        CoreInvoke::InspectModules,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CoreInvoke::ClearEntityCache => "clear_entity_cache",
            CoreInvoke::ClearFullUserCache => "clear_fulluser_cache",
            CoreInvoke::ClearFullChannelCache => "clear_fullchannel_cache",
            CoreInvoke::ClearPermsCache => "clear_perms_cache",
            CoreInvoke::ClearCache => "clear_cache",
            CoreInvoke::ReloadCore => "reload_core",
            CoreInvoke::InspectCache => "inspect_cache",
            CoreInvoke::InspectModules => "inspect_modules",
        }
    }

    pub async fn run(
        &self,
        messenger: &dyn Messenger,
        registry: &dyn ModuleRegistry,
    ) -> Result<String, Error> {
        let result = match self {
            CoreInvoke::ClearEntityCache => dropped(messenger, CacheKind::Entity),
            CoreInvoke::ClearFullUserCache => dropped(messenger, CacheKind::FullUser),
            CoreInvoke::ClearFullChannelCache => dropped(messenger, CacheKind::FullChannel),
            CoreInvoke::ClearPermsCache => dropped(messenger, CacheKind::Perms),
            CoreInvoke::ClearCache => {
                let entity = messenger.clear_cache(CacheKind::Entity);
                let fulluser = messenger.clear_cache(CacheKind::FullUser);
                let fullchannel = messenger.clear_cache(CacheKind::FullChannel);
                messenger.refresh_me().await?;
                format!(
                    "Dropped {} entity cache records\nDropped {} fulluser cache records\nDropped {} fullchannel cache records",
                    entity, fulluser, fullchannel
                )
            }
            CoreInvoke::ReloadCore => {
                let count = registry.reload_core().await?;
                format!("Reloaded {} core modules", count)
            }
            CoreInvoke::InspectCache => format!(
                "Entity cache: {} records\nFulluser cache: {} records\nFullchannel cache: {} records",
                messenger.cache_len(CacheKind::Entity),
                messenger.cache_len(CacheKind::FullUser),
                messenger.cache_len(CacheKind::FullChannel),
            ),
            CoreInvoke::InspectModules => {
                let counts = registry.module_counts();
                format!(
                    "Loaded modules: {}\nLoaded core modules: {}\nLoaded user modules: {}",
                    counts.total, counts.core, counts.user
                )
            }
        };

        info!("Core invoke {} finished", self.name());
        Ok(result)
    }
}

fn dropped(messenger: &dyn Messenger, kind: CacheKind) -> String {
    format!("Dropped {} cache records", messenger.clear_cache(kind))
}

impl FromStr for CoreInvoke {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.name() == s)
            .ok_or_else(|| CommandError::MethodNotFound(s.to_string()))
    }
}

/// A resolved `invokecmd` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeTarget {
    Core(CoreInvoke),
    Module { module: String, method: String },
}

impl InvokeTarget {
    /// Parses `<module> <method>` and checks both against the registry.
    pub fn resolve(args: &str, registry: &dyn ModuleRegistry) -> Result<Self, CommandError> {
        let args = args.trim();
        let Some((module, method)) = args.split_once(char::is_whitespace) else {
            return Err(CommandError::NoArgs);
        };
        let method = method.trim();

        if module == CORE_MODULE {
            return Ok(InvokeTarget::Core(method.parse()?));
        }

        if !registry.has_module(module) {
            return Err(CommandError::ModuleNotFound(module.to_string()));
        }

        if !registry.debug_methods(module).iter().any(|m| m == method) {
            return Err(CommandError::MethodNotFound(method.to_string()));
        }

        Ok(InvokeTarget::Module {
            module: module.to_string(),
            method: method.to_string(),
        })
    }

    pub fn module(&self) -> &str {
        match self {
            InvokeTarget::Core(_) => CORE_MODULE,
            InvokeTarget::Module { module, .. } => module,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            InvokeTarget::Core(invoke) => invoke.name(),
            InvokeTarget::Module { method, .. } => method,
        }
    }

    pub async fn run(
        &self,
        messenger: &dyn Messenger,
        registry: &dyn ModuleRegistry,
        message: &IncomingMessage,
    ) -> Result<String, Error> {
        match self {
            InvokeTarget::Core(invoke) => invoke.run(messenger, registry).await,
            InvokeTarget::Module { module, method } => {
                registry.invoke_debug_method(module, method, message).await
            }
        }
    }
}
