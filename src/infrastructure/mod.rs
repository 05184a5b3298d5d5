pub mod dispatch;
pub mod media;
pub mod observability;
pub mod persistence;
pub mod settings;
