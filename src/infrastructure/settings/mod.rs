mod pg_settings;

pub use pg_settings::{PgSettingsProvider, StaticSettings};
