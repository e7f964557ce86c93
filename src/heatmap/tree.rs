//! フラットなファイルリストからディレクトリ階層を組み立てるモジュール
//!
//! 各ディレクトリの`total_heat`は配下の全ファイルに対する平均ヒートです。
//! 子ディレクトリの平均をそのファイル数で重み付けして合算するため、
//! 親ディレクトリの値は「サブツリー内のファイル1つあたりの平均」を保ちます。

use indexmap::IndexMap;

use super::metrics::{DirectoryHeatData, FileHeatData};

const ROOT: &str = ".";

/// 組み立て途中のディレクトリノード
#[derive(Default)]
struct PendingDirectory {
    files: Vec<FileHeatData>,
    children: Vec<String>,
}

/// `"a/b/c"`の親`"a/b"`を返します。トップレベルの親はルート`"."`です
fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() && parent != path => parent,
        _ => ROOT,
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// ディレクトリを登録し、ルートまでの祖先がすべて一度ずつ存在するようにします
fn ensure_directory(directories: &mut IndexMap<String, PendingDirectory>, path: &str) {
    if directories.contains_key(path) {
        return;
    }
    directories.insert(path.to_string(), PendingDirectory::default());

    let parent = parent_of(path);
    ensure_directory(directories, parent);
    if let Some(parent_node) = directories.get_mut(parent) {
        parent_node.children.push(path.to_string());
    }
}

/// ファイルリストからルート`"."`のディレクトリツリーを構築します
///
/// # 引数
///
/// - `files`: 正規化済みのファイルリスト
///
/// # 戻り値
///
/// ファイルを持たない場合も`file_count == 0`、`total_heat == 0`のルートノードを返します
pub fn build_tree(files: &[FileHeatData]) -> DirectoryHeatData {
    let mut directories: IndexMap<String, PendingDirectory> = IndexMap::new();
    directories.insert(ROOT.to_string(), PendingDirectory::default());

    for file in files {
        let directory = if file.directory.is_empty() {
            ROOT
        } else {
            file.directory.as_str()
        };
        ensure_directory(&mut directories, directory);
        if let Some(node) = directories.get_mut(directory) {
            node.files.push(file.clone());
        }
    }

    finalize(&mut directories, ROOT)
}

/// 子ディレクトリを先に確定させてから、自身のファイル数と平均ヒートを計算します
fn finalize(directories: &mut IndexMap<String, PendingDirectory>, path: &str) -> DirectoryHeatData {
    let pending = directories
        .get_mut(path)
        .map(std::mem::take)
        .unwrap_or_default();

    let subdirectories: Vec<DirectoryHeatData> = pending
        .children
        .iter()
        .map(|child| finalize(directories, child))
        .collect();

    let file_count =
        pending.files.len() + subdirectories.iter().map(|dir| dir.file_count).sum::<usize>();

    let heat_sum = pending.files.iter().map(|file| file.heat).sum::<f64>()
        + subdirectories
            .iter()
            .map(|dir| dir.total_heat * dir.file_count as f64)
            .sum::<f64>();

    let total_heat = if file_count == 0 {
        0.0
    } else {
        heat_sum / file_count as f64
    };

    DirectoryHeatData {
        path: path.to_string(),
        name: name_of(path).to_string(),
        files: pending.files,
        subdirectories,
        total_heat,
        file_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, heat: f64) -> FileHeatData {
        let mut file = FileHeatData::new(path);
        file.heat = heat;
        file
    }

    fn find<'a>(dir: &'a DirectoryHeatData, path: &str) -> Option<&'a DirectoryHeatData> {
        if dir.path == path {
            return Some(dir);
        }
        dir.subdirectories.iter().find_map(|sub| find(sub, path))
    }

    #[test]
    fn test_empty_tree() {
        let root = build_tree(&[]);
        assert_eq!(root.path, ".");
        assert_eq!(root.name, ".");
        assert_eq!(root.file_count, 0);
        assert_eq!(root.total_heat, 0.0);
        assert!(root.files.is_empty());
        assert!(root.subdirectories.is_empty());
    }

    #[test]
    fn test_average_of_direct_files() {
        let root = build_tree(&[file("src/a.rs", 1.0), file("src/b.rs", 0.5)]);

        let src = find(&root, "src").unwrap();
        assert_eq!(src.file_count, 2);
        assert!((src.total_heat - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_with_subdirectory() {
        let root = build_tree(&[
            file("src/lib.rs", 1.0),
            file("src/core/a.rs", 0.75),
            file("src/core/b.rs", 0.25),
        ]);

        let core = find(&root, "src/core").unwrap();
        assert_eq!(core.file_count, 2);
        assert!((core.total_heat - 0.5).abs() < 1e-9);

        let src = find(&root, "src").unwrap();
        assert_eq!(src.file_count, 3);
        assert_eq!(src.files.len(), 1);
        assert!((src.total_heat - (1.0 + 0.5 * 2.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_intermediate_directories_are_created_once() {
        let root = build_tree(&[file("a/b/c/deep.rs", 0.4), file("a/b/other.rs", 0.2)]);

        assert_eq!(root.subdirectories.len(), 1);
        let a = &root.subdirectories[0];
        assert_eq!(a.path, "a");
        assert!(a.files.is_empty());
        assert_eq!(a.subdirectories.len(), 1);

        let b = &a.subdirectories[0];
        assert_eq!(b.path, "a/b");
        assert_eq!(b.name, "b");
        assert_eq!(b.subdirectories.len(), 1);
        assert_eq!(b.subdirectories[0].name, "c");

        assert_eq!(root.file_count, 2);
        assert!((root.total_heat - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_root_level_files() {
        let root = build_tree(&[file("README.md", 0.2), file("Cargo.toml", 0.6)]);
        assert_eq!(root.path, ".");
        assert_eq!(root.files.len(), 2);
        assert!(root.subdirectories.is_empty());
        assert!((root.total_heat - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_file_count_is_sum_of_children() {
        fn check(dir: &DirectoryHeatData) {
            let expected = dir.files.len()
                + dir.subdirectories.iter().map(|s| s.file_count).sum::<usize>();
            assert_eq!(dir.file_count, expected, "{}", dir.path);
            dir.subdirectories.iter().for_each(check);
        }

        let root = build_tree(&[
            file("x.rs", 0.1),
            file("src/a.rs", 0.9),
            file("src/b/c.rs", 0.3),
            file("docs/guide/intro.md", 0.0),
        ]);
        check(&root);
        assert_eq!(root.file_count, 4);
    }
}
