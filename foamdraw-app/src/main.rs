use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use foamdraw_config::{AppConfig, ConfigError};
use foamdraw_engine::DocumentAssembler;
use foamdraw_engine::options::RenderOptions;
use foamdraw_io::{DrawingSaver, InputLoader, JsonFacade, PdfFacade};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 由泡棉布局 JSON 生成分层三视图 PDF。
#[derive(Debug, Parser)]
#[command(name = "foamdraw", version)]
#[command(about = "Render a layered foam insert layout into a multi-page PDF drawing", long_about = None)]
struct Cli {
    /// 布局 JSON 文件
    #[arg(short, long)]
    input: PathBuf,
    /// 输出 PDF，缺省为 `<output.directory>/<quoteNo>.pdf`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 配置文件，缺省按 FOAMDRAW_CONFIG 或 ./config/default.toml 查找
    #[arg(long)]
    config: Option<PathBuf>,
    /// 叠层超高与型腔越界视为错误
    #[arg(long)]
    strict: bool,
    /// 标题栏日期，优先于布局中的 `date`；两者皆无时为当天
    #[arg(long)]
    date: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone())?;
    init_logging(&config);
    info!(input = %cli.input.display(), "启动 foamdraw");

    let mut input = JsonFacade::new()
        .load(&cli.input)
        .with_context(|| format!("无法读取布局 {}", cli.input.display()))?;
    if let Some(date) = &cli.date {
        input.date = Some(date.clone());
    }

    let options = render_options(&config, &cli);
    let drawing = DocumentAssembler::new(options)
        .assemble(&input)
        .with_context(|| format!("报价单 {} 排版失败", input.quote_no))?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| config.output.pdf_path(&input.quote_no));
    PdfFacade::new()
        .save(&drawing, &output)
        .with_context(|| format!("无法写出 {}", output.display()))?;

    info!(
        output = %output.display(),
        pages = drawing.page_count(),
        "图纸已生成"
    );
    Ok(())
}

fn render_options(config: &AppConfig, cli: &Cli) -> RenderOptions {
    let defaults = RenderOptions::default();
    let default_notes = if config.drawing.default_notes.is_empty() {
        defaults.default_notes
    } else {
        config.drawing.default_notes.clone()
    };
    RenderOptions {
        title: config.drawing.title.clone(),
        default_notes,
        date: None,
        strict: cli.strict || config.drawing.strict_validation,
        depth_anchor: defaults.depth_anchor,
    }
}

/// 显式指定的配置必须可用；自动发现失败时退回内建默认值。
fn load_configuration(override_path: Option<PathBuf>) -> Result<AppConfig> {
    match override_path {
        Some(path) => AppConfig::from_file(&path)
            .with_context(|| format!("加载配置 {} 失败", path.display())),
        None => match AppConfig::discover() {
            Ok(cfg) => Ok(cfg),
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                Ok(AppConfig::default())
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
