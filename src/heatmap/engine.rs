//! ヒートマップ生成の全体を制御するモジュール
//!
//! 履歴分析 → 行数カウント（並列） → スコアリングと正規化 → ツリー構築と集計 → キャッシュ格納
//! の順に処理します。

use chrono::Utc;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::path::Path;

use super::cache::{CacheManager, FileCacheStorage};
use super::config::HeatMapConfig;
use super::error::HeatMapError;
use super::lines::LineCounter;
use super::metrics::{FileHeatData, HeatMapData, HeatMetric};
use super::scorer::normalize;
use super::summary::summarize;
use super::tree::build_tree;
use crate::analyzer::{HistoryAnalysis, HistoryAnalyzer};

/// ホットスポット一覧とファイル詳細は常にこの指標と期間で評価する
pub const HOT_SPOT_METRIC: HeatMetric = HeatMetric::Modifications;
pub const HOT_SPOT_PERIOD: &str = "30days";
pub const DEFAULT_HOT_SPOT_LIMIT: usize = 10;

/// ヒートマップエンジン
///
/// # フィールド
///
/// - `analyzer`: 履歴分析の協調者
/// - `line_counter`: 行数カウントの協調者
/// - `cache`: このエンジンが所有する2段キャッシュ
pub struct HeatMapEngine<A, L> {
    analyzer: A,
    line_counter: L,
    cache: CacheManager,
}

impl<A, L> HeatMapEngine<A, L>
where
    A: HistoryAnalyzer,
    L: LineCounter,
{
    pub fn new(analyzer: A, line_counter: L, cache: CacheManager) -> Self {
        Self {
            analyzer,
            line_counter,
            cache,
        }
    }

    /// 設定に従ってファイルキャッシュを持つエンジンを作成します
    pub fn from_config(analyzer: A, line_counter: L, config: &HeatMapConfig) -> Self {
        let storage = FileCacheStorage::new(config.state_dir.join(&config.cache_file));
        Self::new(
            analyzer,
            line_counter,
            CacheManager::new(Box::new(storage), config.cache_ttl()),
        )
    }

    /// キャッシュを参照せずにヒートマップを生成し、キャッシュに格納します
    ///
    /// # エラー
    ///
    /// 履歴分析が失敗した場合はそのエラーを返します。
    /// 行数カウントやキャッシュ書き込みの失敗はエラーになりません。
    pub fn generate(
        &mut self,
        root: &Path,
        metric: HeatMetric,
        period: &str,
    ) -> Result<HeatMapData, HeatMapError> {
        let analysis = self.analyzer.analyze(root, period)?;

        let mut files = collect_files(&analysis);
        count_lines(&self.line_counter, root, &mut files);
        normalize(&mut files, metric);

        let data = HeatMapData {
            tree: build_tree(&files),
            summary: summarize(&files),
            files,
            metric,
            period: period.to_string(),
            generated_at: Utc::now(),
        };

        log::info!(
            "Generated {} heat map ({}) for {}: {} files, {} hot spots",
            metric,
            period,
            root.display(),
            data.summary.total_files,
            data.summary.hot_spots
        );

        self.cache.put(root, &data);
        Ok(data)
    }

    /// メモリキャッシュ、ディスクキャッシュ、生成の順にヒートマップを取得します
    pub fn get_or_generate(
        &mut self,
        root: &Path,
        metric: HeatMetric,
        period: &str,
    ) -> Result<HeatMapData, HeatMapError> {
        match self.cache.get(root, metric, period) {
            Some(data) => Ok(data),
            None => self.generate(root, metric, period),
        }
    }

    /// 変更回数・30日間のヒートマップでヒートの高い順に最大`limit`件のファイルを返します
    pub fn get_hot_spots(
        &mut self,
        root: &Path,
        limit: usize,
    ) -> Result<Vec<FileHeatData>, HeatMapError> {
        let mut files = self
            .get_or_generate(root, HOT_SPOT_METRIC, HOT_SPOT_PERIOD)?
            .files;
        files.sort_by(|a, b| b.heat.total_cmp(&a.heat));
        files.truncate(limit);
        Ok(files)
    }

    /// 変更回数・30日間のヒートマップから1ファイルの詳細を返します
    ///
    /// パスが含まれない場合は`None`です。
    pub fn get_file_detail(
        &mut self,
        root: &Path,
        path: &str,
    ) -> Result<Option<FileHeatData>, HeatMapError> {
        let data = self.get_or_generate(root, HOT_SPOT_METRIC, HOT_SPOT_PERIOD)?;
        Ok(data.file(path).cloned())
    }

    pub fn clear_cache(&mut self, root: &Path) {
        self.cache.clear(root);
    }
}

/// 変更情報とバグ修正コミットをパスをキーに1つのファイルリストへまとめます
///
/// 順序は変更ファイル（分析結果の順）、続いてバグ修正コミットにのみ現れたファイルです。
fn collect_files(analysis: &HistoryAnalysis) -> Vec<FileHeatData> {
    let mut files: IndexMap<String, FileHeatData> = IndexMap::new();

    for modification in &analysis.modifications {
        let file = files
            .entry(modification.path.clone())
            .or_insert_with(|| FileHeatData::new(modification.path.clone()));
        file.metrics.modifications = modification.count;
        file.metrics.last_modified = modification.last_modified.clone();
    }

    for (index, commit) in analysis.bug_commits.iter().enumerate() {
        for path in &commit.files {
            files
                .entry(path.clone())
                .or_insert_with(|| FileHeatData::new(path.clone()))
                .metrics
                .bug_issues
                .insert(index);
        }
    }

    files.into_values().collect()
}

/// 各ファイルの行数を並列に数えます。読み込めないファイルは0行とします
fn count_lines<L: LineCounter>(counter: &L, root: &Path, files: &mut [FileHeatData]) {
    let counts: Vec<usize> = files
        .par_iter()
        .map(|file| {
            counter.count(&root.join(&file.path)).unwrap_or_else(|e| {
                log::debug!("Could not count lines of {}: {}", file.path, e);
                0
            })
        })
        .collect();

    for (file, lines) in files.iter_mut().zip(counts) {
        file.metrics.lines_of_code = lines;
    }
}
