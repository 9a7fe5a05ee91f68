use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use analytics_worker::{
    analysis::{self, AnalysisJob},
    config::Config,
    observability,
};

/// 分析ジョブを1件実行して JSON で結果を書き出す。
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ジョブファイル（`{"analysis": ..., "documents": [...], "params": {...}}`）
    #[arg(long)]
    job: PathBuf,

    /// 結果の書き出し先。省略時は標準出力
    #[arg(long)]
    output: Option<PathBuf>,

    /// 整形して出力する
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(message, "panic occurred without location information");
        }
    }));

    observability::init_tracing().context("failed to initialize tracing")?;
    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let raw = fs::read_to_string(&args.job)
        .with_context(|| format!("failed to read job file {}", args.job.display()))?;
    let job = AnalysisJob::from_json(&raw)
        .with_context(|| format!("invalid job file {}", args.job.display()))?;
    let output = analysis::run(&job, &config)?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("failed to serialize analysis result")?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(output = %path.display(), analysis = %job.analysis, "analysis result written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{rendered}").context("failed to write result to stdout")?;
        }
    }
    Ok(())
}
