//! Gitリポジトリとの対話を担当するモジュール
//!
//! このモジュールは、libgit2を使用してGitリポジトリからコミット履歴を取得し、
//! 各コミットで変更されたファイル・メッセージ・日時を取り出します。

use super::error::AnalyzerError;
use chrono::{DateTime, Utc};
use git2::{Commit, ErrorCode, Repository};
use regex::Regex;
use std::path::Path;

/// Gitリポジトリへのアクセスを管理する構造体
///
/// # フィールド
///
/// - `repo`: libgit2のリポジトリハンドル
/// - `filter`: 分析対象ファイルを絞り込むパスフィルタ
/// - `include_merge_commits`: マージコミットを含めるかどうかのフラグ
pub struct GitRepository {
    repo: Repository,
    filter: PathFilter,
    include_merge_commits: bool,
}

/// コミット情報を保持する構造体
///
/// # フィールド
///
/// - `message`: コミットメッセージ全文
/// - `time`: コミット日時
/// - `files`: コミットで変更されたファイルのリスト（フィルタ適用後）
#[derive(Debug)]
pub struct CommitInfo {
    pub message: String,
    pub time: DateTime<Utc>,
    pub files: Vec<String>,
}

/// インクルード／除外パターンによるパスフィルタ
///
/// 除外パターンが優先され、インクルードパターンが空の場合はすべてのパスを対象とします。
#[derive(Debug, Default)]
pub struct PathFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathFilter {
    /// globパターンのリストからフィルタを構築します
    ///
    /// # エラー
    ///
    /// パターンを正規表現に変換できない場合は`AnalyzerError::InvalidPattern`を返します
    pub fn from_globs(include: &[String], exclude: &[String]) -> Result<Self, AnalyzerError> {
        Ok(Self {
            include: compile_globs(include)?,
            exclude: compile_globs(exclude)?,
        })
    }

    pub fn matches(&self, file_path: &str) -> bool {
        if self.exclude.iter().any(|pattern| pattern.is_match(file_path)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|pattern| pattern.is_match(file_path))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Regex>, AnalyzerError> {
    patterns
        .iter()
        .map(|p| Regex::new(&glob_to_regex(p)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AnalyzerError::InvalidPattern(e.to_string()))
}

impl GitRepository {
    /// 指定されたパスのGitリポジトリをオープンします
    ///
    /// # 引数
    ///
    /// - `path`: Gitリポジトリのパス
    /// - `filter`: 分析対象ファイルのフィルタ
    /// - `include_merge_commits`: マージコミットを含めるかどうか
    ///
    /// # エラー
    ///
    /// 指定されたパスがGitリポジトリでない場合にエラーを返します
    pub fn open(
        path: impl AsRef<Path>,
        filter: PathFilter,
        include_merge_commits: bool,
    ) -> Result<Self, AnalyzerError> {
        Ok(Self {
            repo: Repository::open(path)?,
            filter,
            include_merge_commits,
        })
    }

    /// 指定された日時以降のコミット情報を新しい順に取得します
    ///
    /// `since`が`None`の場合は全履歴を対象とします。
    /// HEADが未作成（コミットのない）リポジトリでは空のリストを返します。
    ///
    /// # エラー
    ///
    /// 以下の場合にエラーを返します：
    /// - コミット履歴の取得に失敗
    /// - コミット日時が不正
    pub fn commits_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitInfo>, AnalyzerError> {
        if self.repo.is_empty()? || self.head_is_unborn()? {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;

            let time = DateTime::from_timestamp(commit.time().seconds(), 0).ok_or_else(|| {
                AnalyzerError::AnalysisError("Invalid commit timestamp".to_string())
            })?;

            if since.is_some_and(|since| time < since) {
                continue;
            }

            if !self.include_merge_commits && commit.parent_count() > 1 {
                continue;
            }

            let files: Vec<String> = self
                .changed_files(&commit)?
                .into_iter()
                .filter(|file_path| self.filter.matches(file_path))
                .collect();

            if files.is_empty() {
                continue;
            }

            commits.push(CommitInfo {
                message: commit.message().unwrap_or_default().to_string(),
                time,
                files,
            });
        }

        Ok(commits)
    }

    fn head_is_unborn(&self) -> Result<bool, AnalyzerError> {
        match self.repo.head() {
            Ok(_) => Ok(false),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    fn changed_files(&self, commit: &Commit) -> Result<Vec<String>, AnalyzerError> {
        let tree = commit.tree()?;
        let parent_tree = commit.parent(0).ok().and_then(|parent| parent.tree().ok());

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        Ok(diff
            .deltas()
            .filter_map(|delta| delta.new_file().path()?.to_str().map(str::to_string))
            .collect())
    }
}

/// globパターンをアンカー付きの正規表現文字列に変換します
///
/// `**/`はディレクトリをまたぐマッチ、`*`は単一ディレクトリ内のマッチ、`?`は任意の1文字です。
fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::from("^");

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.next_if_eq(&'/').is_some() {
                    regex.push_str(".*/");
                } else {
                    regex.push_str(".*");
                }
            }
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push('.'),
            '/' => regex.push('/'),
            c if c.is_alphanumeric() => regex.push(c),
            _ => regex.push_str(&regex::escape(&c.to_string())),
        }
    }

    regex.push('$');
    regex
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Signature, Time};
    use std::fs;
    use tempfile::TempDir;

    fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str, time: i64) {
        let workdir = repo.workdir().unwrap();
        let mut index = repo.index().unwrap();
        for (path, content) in files {
            let full = workdir.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();

        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("dev", "dev@example.com", &Time::new(time, 0)).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_glob_to_regex() {
        let test_cases = [
            ("*.py", "^[^/]*\\.py$"),
            ("src/*.rs", "^src/[^/]*\\.rs$"),
            ("**/*.js", "^.*/[^/]*\\.js$"),
            ("src/**/*.ts", "^src/.*/[^/]*\\.ts$"),
            ("test/**", "^test/.*$"),
            ("**.txt", "^.*\\.txt$"),
        ];

        for (input, expected) in test_cases {
            assert_eq!(glob_to_regex(input), expected, "pattern '{}'", input);
        }
    }

    #[test]
    fn test_path_filter() {
        let filter = PathFilter::from_globs(
            &["**.rs".to_string(), "src/*.toml".to_string()],
            &["target/**".to_string()],
        )
        .unwrap();

        assert!(filter.matches("src/main.rs"));
        assert!(filter.matches("src/config.toml"));
        assert!(!filter.matches("src/main.py"));
        assert!(!filter.matches("target/debug/main.rs"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = PathFilter::default();
        assert!(filter.matches("README.md"));
        assert!(filter.matches("deeply/nested/file.txt"));
    }

    #[test]
    fn test_commits_since_on_unborn_head() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();

        let repo = GitRepository::open(dir.path(), PathFilter::default(), false).unwrap();
        assert!(repo.commits_since(None).unwrap().is_empty());
    }

    #[test]
    fn test_commits_since_on_unborn_branch_of_non_empty_repository() {
        let dir = TempDir::new().unwrap();
        let raw = Repository::init(dir.path()).unwrap();
        commit_files(&raw, &[("a.rs", "a\n")], "initial", Utc::now().timestamp());
        raw.set_head("refs/heads/orphan").unwrap();

        let repo = GitRepository::open(dir.path(), PathFilter::default(), false).unwrap();
        assert!(repo.commits_since(None).unwrap().is_empty());
    }

    #[test]
    fn test_commits_since_filters_by_time() {
        let dir = TempDir::new().unwrap();
        let raw = Repository::init(dir.path()).unwrap();
        let now = Utc::now().timestamp();

        commit_files(&raw, &[("old.rs", "old\n")], "initial", now - 100 * 86_400);
        commit_files(&raw, &[("src/new.rs", "new\n")], "fix: crash", now - 86_400);

        let repo = GitRepository::open(dir.path(), PathFilter::default(), false).unwrap();

        let recent = repo
            .commits_since(Some(Utc::now() - chrono::Duration::days(30)))
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].files, vec!["src/new.rs".to_string()]);
        assert!(recent[0].message.starts_with("fix: crash"));

        let all = repo.commits_since(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].files, vec!["old.rs".to_string()]);
    }

    #[test]
    fn test_open_rejects_non_repository() {
        let dir = TempDir::new().unwrap();
        let result = GitRepository::open(dir.path(), PathFilter::default(), false);
        assert!(matches!(result, Err(AnalyzerError::GitError(_))));
    }
}
