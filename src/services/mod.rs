pub mod channel_join;
pub mod config_file;
pub mod env;
pub mod flags;
pub mod host;
pub mod invoke;
pub mod kv;
pub mod localization;
pub mod log_control;
pub mod nonick;
pub mod prefix;
pub mod uninstall;
pub mod watchers;
pub mod web;
