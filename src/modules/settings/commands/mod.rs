pub mod invoke;
pub mod menu;
pub mod nonick;
pub mod uninstall;
pub mod watchers;
pub mod web;
