//! Git履歴から生のシグナルを収集するモジュール
//!
//! ヒートマップエンジンはこのモジュールの`HistoryAnalyzer`トレイトにのみ依存します。
//! 分析プロセスは以下の流れで行われます：
//!
//! 1. 期間文字列（例: `30days`）から分析開始日時を算出
//! 2. 期間内のコミット履歴の取得
//! 3. ファイルごとの変更回数と最終変更日時の集計
//! 4. バグ修正コミットの抽出
//!
//! # 主要なコンポーネント
//!
//! - `HistoryAnalyzer`: 履歴分析の契約
//! - `GitHistoryAnalyzer`: libgit2による実装
//! - `HistoryAnalysis`: 分析結果

mod error;
mod git;

pub use error::AnalyzerError;
pub use git::PathFilter;
use git::GitRepository;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// バグ修正コミットとみなすメッセージのキーワード
const BUG_PATTERN: &str =
    r"(?i)\b(fix|fixes|fixed|bug|bugfix|hotfix|patch|regression|crash|defect)\b";

/// ファイルごとの変更回数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileModification {
    pub path: String,
    pub count: u32,
    pub last_modified: Option<String>,
}

/// バグ修正コミットと、それが変更したファイル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugCommit {
    pub files: Vec<String>,
}

/// 履歴分析の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAnalysis {
    pub modifications: Vec<FileModification>,
    pub bug_commits: Vec<BugCommit>,
    pub total_commits: u32,
    pub period: String,
    pub analyzed_at: DateTime<Utc>,
}

impl HistoryAnalysis {
    pub fn empty(period: &str) -> Self {
        Self {
            modifications: Vec::new(),
            bug_commits: Vec::new(),
            total_commits: 0,
            period: period.to_string(),
            analyzed_at: Utc::now(),
        }
    }
}

/// リポジトリ履歴を分析する協調者の契約
///
/// 失敗（リポジトリでない等）はそのまま呼び出し元へ伝播されます。
pub trait HistoryAnalyzer {
    fn analyze(&self, root: &Path, period: &str) -> Result<HistoryAnalysis, AnalyzerError>;
}

/// 期間文字列を期間長に変換します
///
/// `all`は`None`（全履歴）、`<N><単位>`は`Some(期間)`です。
/// 単位は`day(s)`、`week(s)`、`month(s)`（30日）、`year(s)`（365日）に対応します。
///
/// # エラー
///
/// 解釈できない文字列、または表現できないほど長い期間の場合は
/// `AnalyzerError::InvalidPeriod`を返します
pub fn parse_period(period: &str) -> Result<Option<Duration>, AnalyzerError> {
    let normalized = period.trim().to_lowercase();
    if normalized == "all" {
        return Ok(None);
    }

    let invalid = || AnalyzerError::InvalidPeriod(period.to_string());

    let digits_end = normalized
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (amount, unit) = normalized.split_at(digits_end);
    let amount: i64 = amount.parse().map_err(|_| invalid())?;

    let days_per_unit = match unit.trim().trim_end_matches('s') {
        "day" => 1,
        "week" => 7,
        "month" => 30,
        "year" => 365,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(days_per_unit)
        .and_then(Duration::try_days)
        .map(Some)
        .ok_or_else(invalid)
}

/// 期間の開始日時を求めます。`None`は全履歴です
///
/// # エラー
///
/// 開始日時が表現可能な範囲を超える場合は`AnalyzerError::InvalidPeriod`を返します
fn period_start(
    period: &str,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, AnalyzerError> {
    match parse_period(period)? {
        Some(window) => now
            .checked_sub_signed(window)
            .map(Some)
            .ok_or_else(|| AnalyzerError::InvalidPeriod(period.to_string())),
        None => Ok(None),
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// libgit2でリポジトリ履歴を分析する`HistoryAnalyzer`の実装
///
/// # フィールド
///
/// - `include_patterns`: 分析対象とするファイルパターンのリスト
/// - `exclude_patterns`: 分析から除外するファイルパターンのリスト
/// - `include_merges`: マージコミットを含めるかどうか
/// - `bug_pattern`: バグ修正コミットを判定する正規表現
pub struct GitHistoryAnalyzer {
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    include_merges: bool,
    bug_pattern: Regex,
}

impl GitHistoryAnalyzer {
    /// 新しいGitHistoryAnalyzerインスタンスを作成します
    ///
    /// # エラー
    ///
    /// バグ修正判定用の正規表現をコンパイルできない場合にエラーを返します
    pub fn new(
        include_patterns: Vec<String>,
        exclude_patterns: Vec<String>,
        include_merges: bool,
    ) -> Result<Self, AnalyzerError> {
        Ok(Self {
            include_patterns,
            exclude_patterns,
            include_merges,
            bug_pattern: Regex::new(BUG_PATTERN)
                .map_err(|e| AnalyzerError::InvalidPattern(e.to_string()))?,
        })
    }

    fn is_bug_fix(&self, message: &str) -> bool {
        self.bug_pattern.is_match(message)
    }
}

impl HistoryAnalyzer for GitHistoryAnalyzer {
    fn analyze(&self, root: &Path, period: &str) -> Result<HistoryAnalysis, AnalyzerError> {
        let since = period_start(period, Utc::now())?;
        let filter = PathFilter::from_globs(&self.include_patterns, &self.exclude_patterns)?;
        let repo = GitRepository::open(root, filter, self.include_merges)?;

        let commits = repo.commits_since(since)?;
        log::debug!(
            "{} commits in period '{}' for {}",
            commits.len(),
            period,
            root.display()
        );

        let mut modifications: IndexMap<String, FileModification> = IndexMap::new();
        let mut bug_commits = Vec::new();

        // コミットは新しい順に並んでいるため、最初に見つかった日時が最終変更日時となる
        for commit in &commits {
            for path in &commit.files {
                let entry = modifications
                    .entry(path.clone())
                    .or_insert_with(|| FileModification {
                        path: path.clone(),
                        count: 0,
                        last_modified: Some(commit.time.to_rfc3339()),
                    });
                entry.count = entry.count.saturating_add(1);
            }

            if self.is_bug_fix(&commit.message) {
                bug_commits.push(BugCommit {
                    files: commit.files.clone(),
                });
            }
        }

        Ok(HistoryAnalysis {
            modifications: modifications.into_values().collect(),
            bug_commits,
            total_commits: saturating_u32(commits.len()),
            period: period.to_string(),
            analyzed_at: Utc::now(),
        })
    }
}
