pub mod settings;

use crate::services::host::{CallbackQuery, IncomingMessage};
use crate::{Data, Error};

#[derive(Debug, Clone)]
pub struct ModuleDefinition {
    pub id: &'static str,
    pub name_key: &'static str,
    pub description_key: &'static str,
}

pub struct Module {
    pub definition: ModuleDefinition,
    pub commands: Vec<&'static str>,
}

pub fn get_modules() -> Vec<Module> {
    vec![settings::module()]
}

/// Routes an incoming message. Returns whether one of our commands ran.
pub async fn handle_message(data: &Data, message: &IncomingMessage) -> Result<bool, Error> {
    settings::handle_message(data, message).await
}

/// Routes a button press. Returns whether it belonged to one of our forms.
pub async fn handle_callback(data: &Data, call: &CallbackQuery) -> Result<bool, Error> {
    settings::handle_callback(data, call).await
}
