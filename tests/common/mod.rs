#![allow(dead_code)]

use git2::{Commit, Repository, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const DAY: i64 = 86_400;

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// ファイルを書き込み、`days_ago`日前の日時でコミットする
    pub fn commit(&self, files: &[(&str, &str)], message: &str, days_ago: i64) {
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = self.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let when = chrono::Utc::now().timestamp() - days_ago * DAY;
        let sig = Signature::new("dev", "dev@example.com", &Time::new(when, 0)).unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    /// main.rsが最も頻繁に変更され、バグ修正にも関与する履歴を作る
    pub fn with_sample_history() -> Self {
        let repo = Self::new();
        repo.commit(
            &[("src/main.rs", "fn main() {}\n"), ("src/lib.rs", "pub mod util;\n")],
            "initial import",
            20,
        );
        repo.commit(&[("src/util/strings.rs", "pub fn a() {}\n")], "add strings", 15);
        repo.commit(
            &[("src/main.rs", "fn main() {\n    run();\n}\n")],
            "fix: crash on start",
            10,
        );
        repo.commit(
            &[("src/main.rs", "fn main() {\n    run();\n    exit();\n}\n")],
            "add exit",
            2,
        );
        repo
    }
}
