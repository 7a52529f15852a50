mod settings;

pub use settings::{
    ADD_EXTRA_LINE_TO_OUTPUT, MAX_OPERATIONS, OPEN_CONSOLE_ON_ERROR, PREFER_INSTALLED_RUNTIME,
    Settings, SettingsSource, SharedSettings,
};
