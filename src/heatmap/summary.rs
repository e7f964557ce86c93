use super::metrics::{FileHeatData, HeatMapSummary};

/// この値を厳密に超えるヒートのファイルをホットスポットとみなす
pub const HOT_SPOT_THRESHOLD: f64 = 0.7;

/// 正規化済みファイルリストから集計値を算出します
///
/// `untouched`はヒートの指標に関係なく、常に変更回数が0のファイル数です。
/// `top_hot_spot`はヒートが最大のファイルで、同値の場合は入力順で先のものを選びます。
pub fn summarize(files: &[FileHeatData]) -> HeatMapSummary {
    let top_hot_spot = files
        .iter()
        .fold(None::<&FileHeatData>, |top, file| match top {
            Some(current) if current.heat >= file.heat => Some(current),
            _ => Some(file),
        })
        .cloned();

    HeatMapSummary {
        total_files: files.len(),
        hot_spots: files.iter().filter(|f| f.heat > HOT_SPOT_THRESHOLD).count(),
        bug_prone: files
            .iter()
            .filter(|f| !f.metrics.bug_issues.is_empty())
            .count(),
        untouched: files.iter().filter(|f| f.metrics.modifications == 0).count(),
        top_hot_spot,
    }
}
