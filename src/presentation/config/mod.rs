mod settings;

pub use settings::{DatabaseSettings, MediaSettings, RelaySettings, ServerSettings, Settings};
