//! Gitリポジトリのコードヒートマップ生成ツール
//!
//! このクレートは、Gitリポジトリのコミット履歴とファイルサイズから
//! ファイルごとの「ヒート」（0〜1）を算出し、ディレクトリ階層に集約した
//! ヒートマップを生成・キャッシュするための機能を提供します。
//!
//! # 主な機能
//!
//! - 変更回数・バグ修正・チャーン・サイズの4種類の指標によるスコアリング
//! - ディレクトリごとの加重平均ヒートの算出
//! - ホットスポット・バグの多いファイル・未変更ファイルの集計
//! - メモリとディスクの2段キャッシュ（有効期間5分）
//!
//! # 使用例
//!
//! ```no_run
//! use code_heatmap::analyzer::GitHistoryAnalyzer;
//! use code_heatmap::heatmap::{FsLineCounter, HeatMapConfig, HeatMapEngine, HeatMetric};
//! use std::path::Path;
//!
//! let root = Path::new("path/to/repo");
//! let analyzer = GitHistoryAnalyzer::new(vec![], vec![], false).unwrap();
//! let config = HeatMapConfig::load(root).unwrap();
//! let mut engine = HeatMapEngine::from_config(analyzer, FsLineCounter, &config);
//!
//! let heat_map = engine.get_or_generate(root, HeatMetric::Churn, "30days").unwrap();
//! println!("{} hot spots", heat_map.summary.hot_spots);
//! ```

pub mod analyzer;
pub mod heatmap;

pub use analyzer::{GitHistoryAnalyzer, HistoryAnalyzer};
pub use heatmap::{HeatMapData, HeatMapEngine, HeatMetric};
