//! ヒートマップエンジンの設定
//!
//! 設定ファイル`<root>/.tiki/heatmap.toml`が存在すれば読み込み、
//! 存在しなければ既定値を使います。

use chrono::Duration;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::HeatMapError;

/// ツールの状態ディレクトリの既定値（リポジトリルートからの相対パス）
pub const DEFAULT_STATE_DIR: &str = ".tiki";
/// 設定ファイル名（既定の状態ディレクトリ内）
pub const CONFIG_FILE: &str = "heatmap.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatMapConfig {
    /// ツールの状態ディレクトリ
    pub state_dir: PathBuf,
    /// キャッシュファイルのパス（`state_dir`からの相対パス）
    pub cache_file: PathBuf,
    /// キャッシュの有効期間（秒）
    pub cache_ttl_secs: u64,
}

impl Default for HeatMapConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            cache_file: PathBuf::from("cache/heatmap.json"),
            cache_ttl_secs: 300,
        }
    }
}

impl HeatMapConfig {
    /// リポジトリの設定ファイルを読み込みます
    ///
    /// 設定ファイルは常に`<root>/.tiki/heatmap.toml`から読み込みます。
    /// ファイル内で`state_dir`を変更しても、移動するのはキャッシュファイルだけで、
    /// 設定ファイル自体の場所は変わりません。
    ///
    /// # エラー
    ///
    /// 設定ファイルが存在するが読み込めない、またはTOMLとして不正な場合にエラーを返します
    pub fn load(root: &Path) -> Result<Self, HeatMapError> {
        let path = root.join(DEFAULT_STATE_DIR).join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| HeatMapError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| HeatMapError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// キャッシュの有効期間。表現できないほど長い値は最大の期間に丸めます
    pub fn cache_ttl(&self) -> Duration {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// リポジトリ内のキャッシュファイルの絶対パス
    pub fn cache_path(&self, root: &Path) -> PathBuf {
        root.join(&self.state_dir).join(&self.cache_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = HeatMapConfig::default();
        assert_eq!(config.cache_ttl(), Duration::minutes(5));
        assert_eq!(
            config.cache_path(Path::new("/repo")),
            PathBuf::from("/repo/.tiki/cache/heatmap.json")
        );
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let config = HeatMapConfig::from_toml("cache_ttl_secs = 10000000000000000\n").unwrap();
        assert_eq!(config.cache_ttl(), Duration::MAX);

        let config = HeatMapConfig {
            cache_ttl_secs: u64::MAX,
            ..HeatMapConfig::default()
        };
        assert_eq!(config.cache_ttl(), Duration::MAX);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HeatMapConfig::from_toml("cache_ttl_secs = 60\n").unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.state_dir, PathBuf::from(".tiki"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(HeatMapConfig::load(dir.path()).unwrap(), HeatMapConfig::default());
    }

    #[test]
    fn test_state_dir_moves_cache_but_not_config() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".tiki")).unwrap();
        fs::write(
            dir.path().join(".tiki/heatmap.toml"),
            "state_dir = \".heatmap-state\"\n",
        )
        .unwrap();

        let config = HeatMapConfig::load(dir.path()).unwrap();
        assert_eq!(
            config.cache_path(dir.path()),
            dir.path().join(".heatmap-state/cache/heatmap.json")
        );
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".tiki")).unwrap();
        fs::write(dir.path().join(".tiki/heatmap.toml"), "cache_ttl_secs = \"soon\"").unwrap();

        assert!(matches!(
            HeatMapConfig::load(dir.path()),
            Err(HeatMapError::Config(_))
        ));
    }
}
