use thiserror::Error;

use crate::analyzer::AnalyzerError;

#[derive(Error, Debug)]
pub enum HeatMapError {
    #[error(transparent)]
    Analysis(#[from] AnalyzerError),

    #[error("Unknown heat metric: {0} (expected modifications, bugs, churn or complexity)")]
    InvalidMetric(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// キャッシュ入出力の失敗
///
/// `CacheManager`の内部でログに記録され、キャッシュミスとして扱われます。
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed cache entry: {0}")]
    Malformed(#[from] serde_json::Error),
}
