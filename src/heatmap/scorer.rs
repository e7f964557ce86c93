//! ファイルごとの生ヒート値の算出と正規化

use super::metrics::{FileHeatData, HeatMetric, HeatMetrics};

/// 生ヒート値を算出する純粋関数
pub type ScoreFn = fn(&HeatMetrics) -> f64;

impl HeatMetric {
    /// 指標に対応するスコア関数を返します
    pub fn scorer(self) -> ScoreFn {
        match self {
            HeatMetric::Modifications => modifications_score,
            HeatMetric::Bugs => bugs_score,
            HeatMetric::Churn => churn_score,
            HeatMetric::Complexity => complexity_score,
        }
    }
}

fn modifications_score(metrics: &HeatMetrics) -> f64 {
    f64::from(metrics.modifications)
}

fn bugs_score(metrics: &HeatMetrics) -> f64 {
    metrics.bug_issues.len() as f64
}

/// 同じ変更回数なら行数の多いファイルほど高くなる。対数で巨大ファイルの影響を抑える
fn churn_score(metrics: &HeatMetrics) -> f64 {
    f64::from(metrics.modifications) * (metrics.lines_of_code as f64 + 1.0).ln()
}

fn complexity_score(metrics: &HeatMetrics) -> f64 {
    metrics.lines_of_code as f64
}

/// 指定した指標でのファイルの生ヒート値（0以上、上限なし）
pub fn raw_value(file: &FileHeatData, metric: HeatMetric) -> f64 {
    metric.scorer()(&file.metrics)
}

/// 生ヒート値を最大値で割り、各ファイルの`heat`を[0, 1]に正規化します
///
/// 分母は`max(生ヒート値の最大, 1)`です。全ファイルの生ヒート値が0の場合でも
/// ゼロ除算は起きず、全ファイルのヒートは0になります。
/// 空のリストに対しては何もしません。
pub fn normalize(files: &mut [FileHeatData], metric: HeatMetric) {
    if files.is_empty() {
        return;
    }

    let raw: Vec<f64> = files.iter().map(|file| raw_value(file, metric)).collect();
    let max = raw.iter().copied().fold(1.0_f64, f64::max);

    for (file, value) in files.iter_mut().zip(raw) {
        file.heat = value / max;
    }
}
