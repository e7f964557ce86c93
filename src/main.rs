use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use code_heatmap::analyzer::GitHistoryAnalyzer;
use code_heatmap::heatmap::{
    FileHeatData, FsLineCounter, HeatMapConfig, HeatMapEngine, HeatMetric,
    DEFAULT_HOT_SPOT_LIMIT,
};
use serde::Serialize;
use std::path::PathBuf;

/// デフォルトのインクルードパターン
const DEFAULT_INCLUDE_PATTERNS: &[&str] = &[
    "**.rs",   // Rustファイル
    "**.go",   // Goファイル
    "**.js",   // JavaScriptファイル
    "**.jsx",  // JavaScript (JSX)
    "**.ts",   // TypeScriptファイル
    "**.tsx",  // TypeScript (TSX)
    "**.py",   // Pythonファイル
    "**.java", // Javaファイル
    "**.cpp",  // C++ファイル
    "**.hpp",  // C++ヘッダー
    "**.c",    // Cファイル
    "**.h",    // Cヘッダー
];

/// デフォルトの除外パターン
const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/target/**",       // Rustのビルドディレクトリ
    "target/**",          // Rustのビルドディレクトリ
    "**/node_modules/**", // Node.jsの依存関係
    "node_modules/**",    // Node.jsの依存関係
    "**/dist/**",         // ビルド成果物
    "dist/**",            // ビルド成果物
    "**/vendor/**",       // 依存関係
    "vendor/**",          // 依存関係
    "**.min.*",           // minifyされたファイル
];

#[derive(Parser)]
#[command(
    version,
    about = "Builds code heat maps from Git history to surface risk hotspots",
    long_about = None
)]
struct Cli {
    /// Path to Git repository
    #[arg(short, long, default_value = ".", global = true)]
    repo: PathBuf,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the cache time-to-live in seconds
    #[arg(long, global = true)]
    ttl: Option<u64>,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct FilterArgs {
    /// Include only files matching these patterns (glob format, e.g., "*.rs", "src/**/*.py")
    /// If not specified, default includes common source code files
    #[arg(short = 'i', long = "include", global = true)]
    include_patterns: Option<Vec<String>>,

    /// Exclude files matching these patterns
    /// If not specified, excludes common build and dependency directories
    #[arg(short = 'e', long = "exclude", global = true)]
    exclude_patterns: Option<Vec<String>>,

    /// Use no default include patterns
    #[arg(long, global = true)]
    no_default_includes: bool,

    /// Use no default exclude patterns
    #[arg(long, global = true)]
    no_default_excludes: bool,

    /// Include merge commits in the analysis
    #[arg(long, default_value_t = false, global = true)]
    include_merges: bool,
}

impl FilterArgs {
    /// すべてのフィルタ指定が既定値のままかどうか
    ///
    /// キャッシュのキーは(指標, 期間)のみのため、既定以外のフィルタで
    /// 生成したヒートマップはキャッシュと共有できません。
    fn is_default(&self) -> bool {
        self.include_patterns.is_none()
            && self.exclude_patterns.is_none()
            && !self.no_default_includes
            && !self.no_default_excludes
            && !self.include_merges
    }

    fn patterns(defaults: &[&str], disabled: bool, user: &Option<Vec<String>>) -> Vec<String> {
        let mut patterns = Vec::new();

        if !disabled {
            patterns.extend(defaults.iter().map(|s| s.to_string()));
        }

        if let Some(user_patterns) = user {
            patterns.extend(user_patterns.iter().cloned());
        }

        patterns
    }

    fn include_patterns(&self) -> Vec<String> {
        Self::patterns(
            DEFAULT_INCLUDE_PATTERNS,
            self.no_default_includes,
            &self.include_patterns,
        )
    }

    fn exclude_patterns(&self) -> Vec<String> {
        Self::patterns(
            DEFAULT_EXCLUDE_PATTERNS,
            self.no_default_excludes,
            &self.exclude_patterns,
        )
    }
}

#[derive(Args)]
struct MapArgs {
    /// Heat metric: modifications, bugs, churn or complexity
    #[arg(short, long, default_value = "modifications")]
    metric: HeatMetric,

    /// Time window, e.g. 7days, 30days, 3months, 1year or all
    #[arg(short, long, default_value = "30days")]
    period: String,

    /// Output format (json or csv)
    #[arg(short, long, default_value = "json")]
    format: String,
}

#[derive(Subcommand)]
enum Command {
    /// Regenerate the heat map, ignoring any cached copy
    Generate(MapArgs),
    /// Show the heat map, using the cache when it is fresh
    Show(MapArgs),
    /// List the hottest files by modifications over the last 30 days
    Hotspots {
        /// Number of top hotspots to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_HOT_SPOT_LIMIT)]
        top: usize,

        /// Output format (json or csv)
        #[arg(short, long, default_value = "json")]
        format: String,
    },
    /// Show heat details for a single file
    File {
        /// Repository-relative path of the file
        path: String,
    },
    /// Remove the cached heat map for the repository
    Clear,
}

/// CSV出力の1行
#[derive(Serialize)]
struct CsvRow<'a> {
    path: &'a str,
    #[serde(serialize_with = "round_to_3")]
    heat: f64,
    modifications: u32,
    bug_issues: usize,
    lines_of_code: usize,
    last_modified: &'a str,
}

impl<'a> From<&'a FileHeatData> for CsvRow<'a> {
    fn from(file: &'a FileHeatData) -> Self {
        Self {
            path: &file.path,
            heat: file.heat,
            modifications: file.metrics.modifications,
            bug_issues: file.metrics.bug_issues.len(),
            lines_of_code: file.metrics.lines_of_code,
            last_modified: file.metrics.last_modified.as_deref().unwrap_or(""),
        }
    }
}

/// 浮動小数点数を3桁に丸める補助関数
fn round_to_3<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64((*value * 1000.0).round() / 1000.0)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?
    );
    Ok(())
}

fn print_csv(files: &[FileHeatData]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for file in files {
        wtr.serialize(CsvRow::from(file))
            .context("Failed to write CSV record")?;
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

fn print_files<T: Serialize>(value: &T, files: &[FileHeatData], format: &str) -> anyhow::Result<()> {
    match format {
        "json" => print_json(value),
        "csv" => print_csv(files),
        _ => anyhow::bail!("Unsupported output format: {}", format),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }),
    )
    .init();

    let root = cli.repo.canonicalize().unwrap_or_else(|_| cli.repo.clone());

    let mut config = HeatMapConfig::load(&root).context("Failed to load configuration")?;
    if let Some(ttl) = cli.ttl {
        config.cache_ttl_secs = ttl;
    }

    let analyzer = GitHistoryAnalyzer::new(
        cli.filters.include_patterns(),
        cli.filters.exclude_patterns(),
        cli.filters.include_merges,
    )
    .context("Failed to initialize analyzer")?;
    let mut engine = HeatMapEngine::from_config(analyzer, FsLineCounter, &config);

    let custom_filters = !cli.filters.is_default();
    if custom_filters {
        log::info!("Custom file filters given; bypassing the heat map cache");
        engine.clear_cache(&root);
    }

    match cli.command {
        Command::Generate(args) => {
            let heat_map = engine
                .generate(&root, args.metric, &args.period)
                .context("Failed to generate heat map")?;
            print_files(&heat_map, &heat_map.files, &args.format)?;
        }
        Command::Show(args) => {
            let heat_map = engine
                .get_or_generate(&root, args.metric, &args.period)
                .context("Failed to load heat map")?;
            print_files(&heat_map, &heat_map.files, &args.format)?;
        }
        Command::Hotspots { top, format } => {
            let hot_spots = engine
                .get_hot_spots(&root, top)
                .context("Failed to compute hotspots")?;
            print_files(&hot_spots, &hot_spots, &format)?;
        }
        Command::File { path } => {
            let detail = engine
                .get_file_detail(&root, &path)
                .context("Failed to load heat map")?;
            match detail {
                Some(file) => print_json(&file)?,
                None => anyhow::bail!("File not found in heat map: {}", path),
            }
        }
        Command::Clear => {
            engine.clear_cache(&root);
            println!("Cleared heat map cache for {}", root.display());
        }
    }

    if custom_filters {
        engine.clear_cache(&root);
    }

    Ok(())
}
