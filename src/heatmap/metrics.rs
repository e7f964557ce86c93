//! ヒートマップのデータモデルを定義するモジュール
//!
//! ここで定義する構造体はそのままJSONとしてシリアライズされ、
//! ディスクキャッシュの形式としても使われます（バージョン情報は持ちません）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::HeatMapError;

/// ヒート値の算出に使う指標
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatMetric {
    /// 期間内の変更回数
    Modifications,
    /// 関与したバグ修正コミット数
    Bugs,
    /// 変更回数 × ln(行数 + 1)
    Churn,
    /// 行数（サイズの代理指標）
    Complexity,
}

impl HeatMetric {
    pub const ALL: [HeatMetric; 4] = [
        HeatMetric::Modifications,
        HeatMetric::Bugs,
        HeatMetric::Churn,
        HeatMetric::Complexity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HeatMetric::Modifications => "modifications",
            HeatMetric::Bugs => "bugs",
            HeatMetric::Churn => "churn",
            HeatMetric::Complexity => "complexity",
        }
    }
}

impl fmt::Display for HeatMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeatMetric {
    type Err = HeatMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HeatMetric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| HeatMapError::InvalidMetric(s.to_string()))
    }
}

/// ファイルごとの生シグナル
///
/// # フィールド
///
/// - `modifications`: 期間内にファイルを変更したコミット数
/// - `bug_issues`: ファイルに関与したバグ修正コミットのインデックス
/// - `lines_of_code`: 行数（読み込めなかった場合は0）
/// - `last_modified`: 最終変更日時
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatMetrics {
    pub modifications: u32,
    pub bug_issues: BTreeSet<usize>,
    pub lines_of_code: usize,
    pub last_modified: Option<String>,
}

/// 1ファイル分のヒートマップデータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHeatData {
    pub path: String,
    pub name: String,
    pub directory: String,
    pub metrics: HeatMetrics,
    /// 正規化後のヒート値（0〜1）。正規化前は0
    pub heat: f64,
}

impl FileHeatData {
    /// リポジトリ相対パスからファイル名とディレクトリを導出して作成します
    ///
    /// ルート直下のファイルのディレクトリは`"."`になります。
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let (directory, name) = match path.rsplit_once('/') {
            Some((dir, name)) if !dir.is_empty() => (dir.to_string(), name.to_string()),
            Some((_, name)) => (".".to_string(), name.to_string()),
            None => (".".to_string(), path.clone()),
        };

        Self {
            path,
            name,
            directory,
            metrics: HeatMetrics::default(),
            heat: 0.0,
        }
    }
}

/// ディレクトリ階層のノード
///
/// `file_count`と`total_heat`は配下すべてのファイルに対する値で、
/// 子から親へボトムアップに計算されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryHeatData {
    pub path: String,
    pub name: String,
    pub files: Vec<FileHeatData>,
    pub subdirectories: Vec<DirectoryHeatData>,
    pub total_heat: f64,
    pub file_count: usize,
}

/// スコア済みファイルリストの集計値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatMapSummary {
    pub total_files: usize,
    pub hot_spots: usize,
    pub bug_prone: usize,
    pub untouched: usize,
    pub top_hot_spot: Option<FileHeatData>,
}

/// エンジンの出力であり、キャッシュの単位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatMapData {
    pub files: Vec<FileHeatData>,
    pub tree: DirectoryHeatData,
    pub summary: HeatMapSummary,
    pub metric: HeatMetric,
    pub period: String,
    pub generated_at: DateTime<Utc>,
}

impl HeatMapData {
    pub fn file(&self, path: &str) -> Option<&FileHeatData> {
        self.files.iter().find(|file| file.path == path)
    }
}
