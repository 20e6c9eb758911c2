mod constants;
mod dashboard;
mod distribution;
mod report;
mod series;
mod zoom;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use crate::constants::DATE_FORMAT;
use crate::dashboard::{ChartKind, Dashboard};
use crate::report::PageMeta;
use crate::series::MetricKind;

const APP_ABOUT: &str = "LIA - LinkedIn post analytics dashboard generator";
const DEFAULT_OUTPUT_HTML: &str = "dist/index.html";
const DEFAULT_PAGE_CONFIG: &str = "config/page.toml";
const DEFAULT_PAGE_TITLE: &str = "Дашборд аналитики LinkedIn";
const DEFAULT_PAGE_SUBTITLE: &str = "Показы и вовлечение постов по дням.";

#[derive(Parser, Debug)]
#[command(name = "lia", about = APP_ABOUT)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Собрать HTML-дашборд из CSV-экспортов LinkedIn.
    Render {
        /// CSV-экспорт показов (колонки Post publish date / Impressions / Post URL).
        #[arg(long = "impressions-csv", value_name = "PATH")]
        impressions_csv: Option<PathBuf>,
        /// CSV-экспорт вовлечения (колонки Post publish date / Engagements / Post URL).
        #[arg(long = "engagement-csv", value_name = "PATH")]
        engagement_csv: Option<PathBuf>,
        /// Куда сохранить HTML.
        #[arg(
            short = 'o',
            long = "output-html",
            value_name = "PATH",
            default_value = DEFAULT_OUTPUT_HTML
        )]
        output_html: PathBuf,
        /// Не минифицировать HTML (по умолчанию минифицируется).
        #[arg(
            long = "no-minify-html",
            default_value_t = true,
            action = clap::ArgAction::SetFalse
        )]
        minify_html: bool,
        /// TOML-файл с заголовком страницы.
        #[arg(
            long = "page-config",
            value_name = "PATH",
            default_value = DEFAULT_PAGE_CONFIG
        )]
        page_config: PathBuf,
        /// График, к которому применить предварительный зум.
        #[arg(long = "zoom-chart", value_enum, value_name = "CHART")]
        zoom_chart: Option<ZoomChartArg>,
        /// Начало диапазона зума (YYYY-MM-DD, порядок концов не важен).
        #[arg(long = "zoom-from", value_name = "DATE")]
        zoom_from: Option<String>,
        /// Конец диапазона зума (YYYY-MM-DD).
        #[arg(long = "zoom-to", value_name = "DATE")]
        zoom_to: Option<String>,
    },
    /// Нормализовать один экспорт в плотный дневной CSV без пропусков дат.
    Normalize {
        /// Вид метрики в экспорте.
        #[arg(long = "kind", value_enum, value_name = "KIND")]
        kind: MetricArg,
        /// Входной CSV-экспорт.
        #[arg(short = 'c', long = "csv", value_name = "PATH")]
        csv: PathBuf,
        /// Куда сохранить нормализованный CSV.
        #[arg(short = 'o', long = "output-csv", value_name = "PATH")]
        output_csv: PathBuf,
    },
    /// Сгенерировать файлы автодополнения для shell.
    Completions {
        /// Целевой shell.
        #[arg(value_enum)]
        shell: Shell,
        /// Куда сохранить файл (если не указано — stdout).
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ZoomChartArg {
    Impressions,
    Engagement,
}

impl ZoomChartArg {
    const fn chart(self) -> ChartKind {
        match self {
            Self::Impressions => ChartKind::Impressions,
            Self::Engagement => ChartKind::Engagement,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    Impressions,
    Engagement,
}

impl MetricArg {
    const fn metric(self) -> MetricKind {
        match self {
            Self::Impressions => MetricKind::Impressions,
            Self::Engagement => MetricKind::Engagement,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageConfigFile {
    title: Option<String>,
    subtitle: Option<String>,
}

fn default_page_meta() -> PageMeta {
    PageMeta {
        title: DEFAULT_PAGE_TITLE.to_string(),
        subtitle: DEFAULT_PAGE_SUBTITLE.to_string(),
    }
}

fn load_page_config(path: &Path) -> Result<PageMeta, String> {
    if !path.exists() {
        if path == Path::new(DEFAULT_PAGE_CONFIG) {
            tracing::info!(
                "Page config {} not found, using built-in defaults",
                path.display()
            );
            return Ok(default_page_meta());
        }
        return Err(format!("Page config {} does not exist", path.display()));
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read page config {}: {err}", path.display()))?;
    let config: PageConfigFile = toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse page config {}: {err}", path.display()))?;

    let defaults = default_page_meta();
    Ok(PageMeta {
        title: config.title.unwrap_or(defaults.title),
        subtitle: config.subtitle.unwrap_or(defaults.subtitle),
    })
}

/// Необязательный предварительный зум; либо все три аргумента, либо ни одного.
fn resolve_zoom(
    chart: Option<ZoomChartArg>,
    from: Option<String>,
    to: Option<String>,
) -> Result<Option<(ChartKind, NaiveDate, NaiveDate)>, String> {
    match (chart, from, to) {
        (None, None, None) => Ok(None),
        (Some(chart), Some(from), Some(to)) => {
            let parse = |raw: &str| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map_err(|err| format!("Invalid zoom date '{raw}': {err}"))
            };
            Ok(Some((chart.chart(), parse(&from)?, parse(&to)?)))
        }
        _ => Err("Options --zoom-chart, --zoom-from and --zoom-to must be used together".into()),
    }
}

fn path_label(path: Option<&Path>) -> String {
    path.map_or_else(|| "-".to_string(), |path| path.display().to_string())
}

fn upload_csv(dashboard: &mut Dashboard, kind: ChartKind, csv_path: &Path) -> Result<(), String> {
    let raw = fs::read_to_string(csv_path)
        .map_err(|err| format!("Failed to read CSV {}: {err}", csv_path.display()))?;
    let replaced = dashboard
        .upload(kind, &raw)
        .map_err(|err| format!("Failed to parse CSV {}: {err}", csv_path.display()))?;
    if replaced {
        info(&format!(
            "Loaded {} points from {}",
            dashboard.chart(kind).series().len(),
            csv_path.display()
        ));
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lia=info"));
    let ansi = std::io::stdout().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .compact()
        .init();
}

fn headline(message: &str) {
    tracing::info!(status = "start", "{message}");
}

fn info(message: &str) {
    tracing::info!(status = "info", "{message}");
}

fn success(message: &str) {
    tracing::info!(status = "ok", "{message}");
}

fn error(message: &str) {
    tracing::error!(status = "err", "{message}");
}

fn generate_completions(shell: Shell, output: Option<PathBuf>) -> Result<(), String> {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
        }
        let mut file = File::create(&path)
            .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
        generate(shell, &mut cmd, bin_name, &mut file);
    } else {
        let mut stdout = std::io::stdout();
        generate(shell, &mut cmd, bin_name, &mut stdout);
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    match args.command {
        Command::Completions { shell, output } => {
            if let Err(err) = generate_completions(shell, output) {
                eprintln!("{err}");
            }
        }
        Command::Render {
            impressions_csv,
            engagement_csv,
            output_html,
            minify_html,
            page_config,
            zoom_chart,
            zoom_from,
            zoom_to,
        } => {
            init_logging();
            headline(APP_ABOUT);
            if impressions_csv.is_none() && engagement_csv.is_none() {
                error("Provide at least one of --impressions-csv / --engagement-csv");
                return;
            }
            let meta = match load_page_config(&page_config) {
                Ok(meta) => meta,
                Err(err) => {
                    error(&err);
                    return;
                }
            };
            let zoom = match resolve_zoom(zoom_chart, zoom_from, zoom_to) {
                Ok(zoom) => zoom,
                Err(err) => {
                    error(&err);
                    return;
                }
            };
            let impressions_label = path_label(impressions_csv.as_deref());
            let engagement_label = path_label(engagement_csv.as_deref());
            tracing::info!(
                mode = "render",
                impressions_csv = %impressions_label,
                engagement_csv = %engagement_label,
                output_html = %output_html.display(),
                minify_html,
                "Rendering dashboard"
            );

            let mut dashboard = Dashboard::new();
            if let Some(csv_path) = impressions_csv
                && let Err(err) = upload_csv(&mut dashboard, ChartKind::Impressions, &csv_path)
            {
                error(&err);
                return;
            }
            if let Some(csv_path) = engagement_csv
                && let Err(err) = upload_csv(&mut dashboard, ChartKind::Engagement, &csv_path)
            {
                error(&err);
                return;
            }

            // Предварительный зум проводится тем же жестом, что и в интерактиве.
            if let Some((chart, from, to)) = zoom {
                dashboard.pointer_down(chart, from);
                dashboard.pointer_move(chart, to);
                dashboard.pointer_up(chart);
                info(&format!(
                    "Applied zoom {from}..{to} ({} points in view)",
                    dashboard.chart(chart).view().len()
                ));
            }

            if let Err(err) = report::render_dashboard(&dashboard, &output_html, &meta, minify_html)
            {
                error(&format!("Failed to render dashboard: {err}"));
                return;
            }
            success(&format!("Saved dashboard to {}", output_html.display()));
        }
        Command::Normalize {
            kind,
            csv,
            output_csv,
        } => {
            init_logging();
            headline(APP_ABOUT);
            tracing::info!(
                mode = "normalize",
                kind = ?kind,
                input_csv = %csv.display(),
                output_csv = %output_csv.display(),
                "Normalizing export"
            );
            let raw = match fs::read_to_string(&csv) {
                Ok(raw) => raw,
                Err(err) => {
                    error(&format!("Failed to read CSV {}: {err}", csv.display()));
                    return;
                }
            };
            let series = match series::normalize(&raw, kind.metric()) {
                Ok(series) => series,
                Err(err) => {
                    error(&format!("Failed to parse CSV {}: {err}", csv.display()));
                    return;
                }
            };
            if series.is_empty() {
                error(&format!("No parseable rows in {}", csv.display()));
                return;
            }
            if let Err(err) = series::write_series_csv(&series, kind.metric(), &output_csv) {
                error(&format!(
                    "Failed to write CSV {}: {err}",
                    output_csv.display()
                ));
                return;
            }
            success(&format!(
                "Saved {} normalized rows to {}",
                series.len(),
                output_csv.display()
            ));
        }
    }
}
