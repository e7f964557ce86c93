//! ヒートマップの生成とキャッシュを担当するモジュール
//!
//! ファイルごとの生シグナル（変更回数・バグ修正コミット・行数）から
//! 正規化されたヒート値を算出し、ディレクトリ階層と集計値を組み立てます。
//!
//! # 主要なコンポーネント
//!
//! - `HeatMapEngine`: 生成・キャッシュ参照・ホットスポット抽出の窓口
//! - `CacheManager`: メモリとディスクの2段キャッシュ
//! - `normalize` / `build_tree` / `summarize`: 純粋な計算処理

mod cache;
mod config;
mod engine;
mod error;
mod lines;
mod metrics;
mod scorer;
mod summary;
mod tree;

pub use cache::{CacheManager, CacheStorage, FileCacheStorage};
pub use config::HeatMapConfig;
pub use engine::{
    HeatMapEngine, DEFAULT_HOT_SPOT_LIMIT, HOT_SPOT_METRIC, HOT_SPOT_PERIOD,
};
pub use error::{CacheError, HeatMapError};
pub use lines::{FsLineCounter, LineCounter};
pub use metrics::{
    DirectoryHeatData, FileHeatData, HeatMapData, HeatMapSummary, HeatMetric, HeatMetrics,
};
pub use scorer::{normalize, raw_value, ScoreFn};
pub use summary::{summarize, HOT_SPOT_THRESHOLD};
pub use tree::build_tree;
