//! ヒートマップの2段キャッシュ（メモリ + ディスク上のJSON）
//!
//! キャッシュは性能のためだけに存在します。ディスク入出力の失敗は
//! `CacheError`としてストレージから返され、ここでログに記録したうえで
//! キャッシュミス（または書き込みの省略）として扱われます。

use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::CacheError;
use super::metrics::{HeatMapData, HeatMetric};

/// キャッシュの永続化先
///
/// リポジトリルートごとに1つのエントリを保持します。
pub trait CacheStorage {
    fn read(&self, root: &Path) -> Result<String, CacheError>;
    fn write(&self, root: &Path, contents: &str) -> Result<(), CacheError>;
    /// 存在しないエントリの削除は成功とみなします
    fn remove(&self, root: &Path) -> Result<(), CacheError>;
}

/// リポジトリ内の固定パスにJSONファイルとして保存するストレージ
#[derive(Debug, Clone)]
pub struct FileCacheStorage {
    relative_path: PathBuf,
}

impl FileCacheStorage {
    /// # 引数
    ///
    /// - `relative_path`: リポジトリルートからのキャッシュファイルの相対パス
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
    }
}

impl CacheStorage for FileCacheStorage {
    fn read(&self, root: &Path) -> Result<String, CacheError> {
        Ok(fs::read_to_string(self.path(root))?)
    }

    fn write(&self, root: &Path, contents: &str) -> Result<(), CacheError> {
        let path = self.path(root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(fs::write(path, contents)?)
    }

    fn remove(&self, root: &Path) -> Result<(), CacheError> {
        match fs::remove_file(self.path(root)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// メモリ上に保持する直近1件のエントリ
#[derive(Debug)]
struct MemoryEntry {
    root: PathBuf,
    data: HeatMapData,
}

/// (指標, 期間)をキーとし、リポジトリルートごとにスコープされる2段キャッシュ
///
/// メモリ段は直近に格納した1件のみを保持し、別のキーを格納すると暗黙に置き換わります。
pub struct CacheManager {
    storage: Box<dyn CacheStorage>,
    ttl: Duration,
    memory: Option<MemoryEntry>,
}

impl CacheManager {
    pub fn new(storage: Box<dyn CacheStorage>, ttl: Duration) -> Self {
        Self {
            storage,
            ttl,
            memory: None,
        }
    }

    /// エントリが要求されたキーと一致し、かつ有効期間内かどうか
    ///
    /// キーの一部だけが一致する場合も完全なキャッシュミスとして扱います。
    pub fn is_fresh(
        &self,
        data: &HeatMapData,
        metric: HeatMetric,
        period: &str,
        now: DateTime<Utc>,
    ) -> bool {
        data.metric == metric && data.period == period && now - data.generated_at < self.ttl
    }

    /// メモリ、ディスクの順にキャッシュを参照します
    ///
    /// ディスクから読み込んだ有効なエントリはメモリ段にも格納されます。
    pub fn get(&mut self, root: &Path, metric: HeatMetric, period: &str) -> Option<HeatMapData> {
        let now = Utc::now();

        if let Some(entry) = &self.memory {
            if entry.root == root && self.is_fresh(&entry.data, metric, period, now) {
                log::debug!("Memory cache hit for {}/{}", metric, period);
                return Some(entry.data.clone());
            }
        }

        let data = match self.read_disk(root) {
            Ok(data) => data,
            Err(e) => {
                log::debug!("Disk cache unavailable for {}: {}", root.display(), e);
                return None;
            }
        };

        if !self.is_fresh(&data, metric, period, now) {
            log::debug!(
                "Disk cache for {}/{} is stale or keyed differently ({}/{})",
                metric,
                period,
                data.metric,
                data.period
            );
            return None;
        }

        log::debug!("Disk cache hit for {}/{}", metric, period);
        self.memory = Some(MemoryEntry {
            root: root.to_path_buf(),
            data: data.clone(),
        });
        Some(data)
    }

    fn read_disk(&self, root: &Path) -> Result<HeatMapData, CacheError> {
        let contents = self.storage.read(root)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// 両方の段にエントリを格納します。ディスクへの書き込み失敗はログに残すだけです
    pub fn put(&mut self, root: &Path, data: &HeatMapData) {
        self.memory = Some(MemoryEntry {
            root: root.to_path_buf(),
            data: data.clone(),
        });

        let result = serde_json::to_string(data)
            .map_err(CacheError::from)
            .and_then(|contents| self.storage.write(root, &contents));
        if let Err(e) = result {
            log::warn!("Failed to persist heat map cache for {}: {}", root.display(), e);
        }
    }

    /// リポジトリのキャッシュを両方の段から削除します
    pub fn clear(&mut self, root: &Path) {
        if self.memory.as_ref().is_some_and(|entry| entry.root == root) {
            self.memory = None;
        }

        if let Err(e) = self.storage.remove(root) {
            log::warn!("Failed to remove heat map cache for {}: {}", root.display(), e);
        }
    }
}
