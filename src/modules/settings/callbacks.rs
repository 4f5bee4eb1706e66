use crate::services::flags::FeatureFlag;
use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "settings:";

/// Callback data carried by the buttons of the settings forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCallback {
    /// Stores `value` for `flag`.
    Toggle { flag: FeatureFlag, value: bool },
    ConfirmRestart,
    Restart,
    ConfirmUpdate,
    Update,
    UninstallStep2,
    UninstallConfirm,
    UninstallCancel,
    /// "Open anyway" on the weburl privacy warning.
    WebForce,
}

impl fmt::Display for SettingsCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsCallback::Toggle { flag, value } => {
                write!(f, "{}toggle:{}:{}", PREFIX, flag.key(), u8::from(*value))
            }
            SettingsCallback::ConfirmRestart => write!(f, "{}restart", PREFIX),
            SettingsCallback::Restart => write!(f, "{}restart:confirm", PREFIX),
            SettingsCallback::ConfirmUpdate => write!(f, "{}update", PREFIX),
            SettingsCallback::Update => write!(f, "{}update:confirm", PREFIX),
            SettingsCallback::UninstallStep2 => write!(f, "{}uninstall:step2", PREFIX),
            SettingsCallback::UninstallConfirm => write!(f, "{}uninstall:confirm", PREFIX),
            SettingsCallback::UninstallCancel => write!(f, "{}uninstall:cancel", PREFIX),
            SettingsCallback::WebForce => write!(f, "{}weburl:force", PREFIX),
        }
    }
}

/// Data that does not belong to this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCallback(pub String);

impl FromStr for SettingsCallback {
    type Err = UnknownCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCallback(s.to_string());
        let rest = s.strip_prefix(PREFIX).ok_or_else(unknown)?;

        if let Some(toggle) = rest.strip_prefix("toggle:") {
            let (key, value) = toggle.rsplit_once(':').ok_or_else(unknown)?;
            let flag = FeatureFlag::from_key(key).ok_or_else(unknown)?;
            let value = match value {
                "1" => true,
                "0" => false,
                _ => return Err(unknown()),
            };
            return Ok(SettingsCallback::Toggle { flag, value });
        }

        match rest {
            "restart" => Ok(SettingsCallback::ConfirmRestart),
            "restart:confirm" => Ok(SettingsCallback::Restart),
            "update" => Ok(SettingsCallback::ConfirmUpdate),
            "update:confirm" => Ok(SettingsCallback::Update),
            "uninstall:step2" => Ok(SettingsCallback::UninstallStep2),
            "uninstall:confirm" => Ok(SettingsCallback::UninstallConfirm),
            "uninstall:cancel" => Ok(SettingsCallback::UninstallCancel),
            "weburl:force" => Ok(SettingsCallback::WebForce),
            _ => Err(unknown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_data() {
        let cb = SettingsCallback::Toggle {
            flag: FeatureFlag::DisableModulesFs,
            value: true,
        };
        assert_eq!(cb.to_string(), "settings:toggle:disable_modules_fs:1");
        assert_eq!("settings:toggle:disable_modules_fs:1".parse(), Ok(cb));
        assert_eq!(
            "settings:toggle:grep:0".parse(),
            Ok(SettingsCallback::Toggle {
                flag: FeatureFlag::Grep,
                value: false
            })
        );
    }

    #[test]
    fn test_rejects_foreign_data() {
        assert!("settings:toggle:grep:2".parse::<SettingsCallback>().is_err());
        assert!("settings:toggle:nope:1".parse::<SettingsCallback>().is_err());
        assert!("settings:restart:now".parse::<SettingsCallback>().is_err());
        assert!("help:page:2".parse::<SettingsCallback>().is_err());
    }

    #[test]
    fn test_steps_are_distinct() {
        let all = [
            SettingsCallback::ConfirmRestart,
            SettingsCallback::Restart,
            SettingsCallback::ConfirmUpdate,
            SettingsCallback::Update,
            SettingsCallback::UninstallStep2,
            SettingsCallback::UninstallConfirm,
            SettingsCallback::UninstallCancel,
            SettingsCallback::WebForce,
        ];
        for cb in all {
            assert_eq!(cb.to_string().parse(), Ok(cb));
        }
    }
}
