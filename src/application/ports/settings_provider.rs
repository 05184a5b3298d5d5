use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings unavailable: {0}")]
    Unavailable(String),
}

/// Read-only key/value runtime configuration. Implementations cache with
/// a TTL; callers must tolerate stale-within-TTL reads. Missing or
/// unparseable values resolve to the caller's fallback.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    async fn get_number(&self, key: &str, fallback: f64) -> f64 {
        match self.get(key).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or(fallback),
            _ => fallback,
        }
    }

    async fn get_bool(&self, key: &str, fallback: bool) -> bool {
        match self.get(key).await {
            Ok(Some(raw)) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => fallback,
            },
            _ => fallback,
        }
    }
}
