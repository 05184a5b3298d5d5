mod local_media;

pub use local_media::{LocalMediaStore, MockMediaStore};
