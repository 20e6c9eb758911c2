//! Рендер HTML-страницы дашборда с Plotly-графиками.

use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};

use super::PageMeta;
use super::chart::{BarPanel, DashboardCharts, PiePanel};

const IMPRESSIONS_PLOT_ID: &str = "impressions-plot";
const ENGAGEMENT_PLOT_ID: &str = "engagement-plot";
const DISTRIBUTION_PLOT_ID: &str = "distribution-plot";
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M UTC";
const GOOGLE_FONTS_CSS: &str =
    "https://fonts.googleapis.com/css2?family=IBM+Plex+Sans:wght@400;500;600&display=swap";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const NO_DATA_LABEL: &str = "Нет данных";

const PAGE_STYLE: &str = "
    :root {
        color-scheme: light;
        --bg: #f7f6f2;
        --card: #ffffff;
        --ink: #1f2430;
        --muted: #56606f;
        --accent: #2464a6;
        --border: rgba(31, 36, 48, 0.08);
    }
    * { box-sizing: border-box; }
    body {
        margin: 0;
        background: var(--bg);
        color: var(--ink);
        font-family: \"IBM Plex Sans\", \"PT Sans\", sans-serif;
    }
    .page {
        max-width: 1240px;
        margin: 40px auto 60px;
        padding: 0 24px;
    }
    .hero { margin-bottom: 22px; }
    .title {
        font-size: 26px;
        font-weight: 600;
        margin: 0;
    }
    .subtitle {
        margin: 6px 0 0;
        color: var(--muted);
        font-size: 13px;
    }
    .summary { margin: 14px 0 18px; }
    .summary-grid {
        display: grid;
        grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
        gap: 14px;
    }
    .summary-card {
        background: var(--card);
        border-radius: 16px;
        padding: 14px 16px;
        border: 1px solid var(--border);
    }
    .summary-label {
        font-size: 11px;
        text-transform: uppercase;
        letter-spacing: 0.08em;
        color: var(--muted);
    }
    .summary-value {
        font-size: 20px;
        font-weight: 600;
        margin-top: 6px;
        overflow-wrap: anywhere;
    }
    .summary-sub {
        margin-top: 6px;
        font-size: 12px;
        color: var(--muted);
        overflow-wrap: anywhere;
    }
    .card {
        background: var(--card);
        border-radius: 18px;
        padding: 16px;
        border: 1px solid var(--border);
        margin-top: 18px;
        overflow-x: auto;
    }
    .chart-head {
        display: flex;
        align-items: center;
        justify-content: space-between;
        gap: 10px;
        margin-bottom: 10px;
    }
    .chart-title {
        margin: 0;
        font-size: 16px;
        font-weight: 600;
    }
    .badge {
        display: inline-flex;
        align-items: center;
        gap: 8px;
        padding: 4px 10px;
        border-radius: 999px;
        border: 1px solid rgba(36, 100, 166, 0.25);
        background: rgba(36, 100, 166, 0.08);
        color: var(--accent);
        font-size: 11px;
        font-weight: 600;
        letter-spacing: 0.02em;
    }
    .zoom-out {
        font: inherit;
        font-size: 12px;
        font-weight: 500;
        padding: 6px 14px;
        border-radius: 999px;
        border: 1px solid rgba(36, 100, 166, 0.25);
        background: none;
        color: var(--accent);
        cursor: pointer;
        transition: background 0.2s ease;
    }
    .zoom-out:hover { background: rgba(36, 100, 166, 0.08); }
    .empty-note {
        color: var(--muted);
        font-size: 13px;
        margin: 8px 0;
    }
    footer {
        margin-top: 16px;
        font-size: 12px;
        color: var(--muted);
        text-align: right;
    }
    @media (max-width: 900px) {
        .title { font-size: 22px; }
    }
    ";

// Клик по столбцу открывает URL поста (пустые URL дней-заполнителей
// игнорируются); у круговой диаграммы подпись сектора и есть URL.
const PAGE_SCRIPT: &str = "
    (() => {
        const bindBarClicks = (id, urls) => {
            const plot = document.getElementById(id);
            if (!plot || !plot.on) return;
            plot.on('plotly_click', event => {
                const point = event.points && event.points[0];
                if (!point) return;
                const url = urls[point.pointNumber];
                if (url) window.open(url, '_blank');
            });
        };
        bindBarClicks('impressions-plot', IMPRESSION_URLS);
        bindBarClicks('engagement-plot', ENGAGEMENT_URLS);

        const pie = document.getElementById('distribution-plot');
        if (pie && pie.on) {
            pie.on('plotly_click', event => {
                const point = event.points && event.points[0];
                if (point && point.label) window.open(point.label, '_blank');
            });
        }

        document.querySelectorAll('[data-zoom-out]').forEach(button => {
            button.addEventListener('click', () => {
                const plot = document.getElementById(button.dataset.zoomOut);
                if (plot) {
                    Plotly.relayout(plot, { 'xaxis.autorange': true, 'yaxis.autorange': true });
                }
            });
        });
    })();
    ";

#[allow(clippy::too_many_lines)]
pub(super) fn render_dashboard_page(
    charts: &DashboardCharts,
    meta: &PageMeta,
    generated_at: DateTime<Utc>,
) -> String {
    let summary = &charts.summary;
    let generated_label = generated_at.format(GENERATED_AT_FORMAT).to_string();
    let impression_urls = urls_json(charts.impressions.as_ref());
    let engagement_urls = urls_json(charts.engagement.as_ref());
    let top_post_card = summary.top_post.as_ref().map(|top| {
        (
            format!("{} · {}", top.value, top.date),
            format!("{:.1}% от всего вовлечения · {}", top.share_percent, top.url),
        )
    });

    let page = html! {
        (DOCTYPE)
        html lang="ru" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (meta.title) }
                link rel="preconnect" href="https://fonts.googleapis.com";
                link rel="preconnect" href="https://fonts.gstatic.com" crossorigin;
                link rel="stylesheet" href=(GOOGLE_FONTS_CSS);
                script src=(PLOTLY_CDN) {}
                style { (PAGE_STYLE) }
            }
            body {
                div class="page" {
                    header class="hero" {
                        h1 class="title" { (meta.title) }
                        p class="subtitle" { (meta.subtitle) }
                    }
                    section class="summary" {
                        div class="summary-grid" {
                            div class="summary-card" {
                                div class="summary-label" { "Всего показов" }
                                div class="summary-value" { (summary.total_impressions) }
                                div class="summary-sub" { (span_label(summary.impressions_span.as_ref())) }
                            }
                            div class="summary-card" {
                                div class="summary-label" { "Всего вовлечения" }
                                div class="summary-value" { (summary.total_engagements) }
                                div class="summary-sub" { (span_label(summary.engagement_span.as_ref())) }
                            }
                            @if let Some((top_value, top_sub)) = top_post_card {
                                div class="summary-card" {
                                    div class="summary-label" { "Лучший пост" }
                                    div class="summary-value" { (top_value) }
                                    div class="summary-sub" { (top_sub) }
                                }
                            } @else {
                                div class="summary-card" {
                                    div class="summary-label" { "Лучший пост" }
                                    div class="summary-value" { (NO_DATA_LABEL) }
                                    div class="summary-sub" { "Загрузите экспорт вовлечения" }
                                }
                            }
                        }
                    }
                    (bar_card("Показы по дням", IMPRESSIONS_PLOT_ID, charts.impressions.as_ref()))
                    (bar_card("Вовлечение по дням", ENGAGEMENT_PLOT_ID, charts.engagement.as_ref()))
                    (pie_card(charts.distribution.as_ref()))
                    footer {
                        "Версия: " (APP_VERSION) " · Сгенерировано: " (generated_label)
                    }
                    script {
                        "const IMPRESSION_URLS = " (PreEscaped(&impression_urls)) ";\n"
                        "const ENGAGEMENT_URLS = " (PreEscaped(&engagement_urls)) ";\n"
                        (PreEscaped(PAGE_SCRIPT))
                    }
                }
            }
        }
    };
    page.into_string()
}

fn urls_json(panel: Option<&BarPanel>) -> String {
    panel
        .map(|panel| serde_json::to_string(&panel.urls).unwrap_or_else(|_| String::from("[]")))
        .unwrap_or_else(|| String::from("[]"))
}

fn span_label(span: Option<&(String, String)>) -> String {
    span.map_or_else(
        || NO_DATA_LABEL.to_string(),
        |(first, last)| format!("{first} — {last}"),
    )
}

fn bar_card(title: &str, plot_id: &str, panel: Option<&BarPanel>) -> Markup {
    html! {
        section class="card" {
            div class="chart-head" {
                h2 class="chart-title" { (title) }
                @if let Some(panel) = panel {
                    div {
                        @if let Some((start, end)) = &panel.zoom {
                            span class="badge" { "Зум: " (start) " — " (end) }
                            " "
                        }
                        button class="zoom-out" type="button" data-zoom-out=(plot_id) {
                            "Сбросить зум"
                        }
                    }
                }
            }
            @if let Some(panel) = panel {
                (PreEscaped(panel.plot.to_inline_html(Some(plot_id))))
            } @else {
                p class="empty-note" { (NO_DATA_LABEL) }
            }
        }
    }
}

fn pie_card(panel: Option<&PiePanel>) -> Markup {
    html! {
        section class="card" {
            div class="chart-head" {
                h2 class="chart-title" { "Распределение вовлечения" }
            }
            @if let Some(panel) = panel {
                (PreEscaped(panel.plot.to_inline_html(Some(DISTRIBUTION_PLOT_ID))))
            } @else {
                p class="empty-note" { (NO_DATA_LABEL) }
            }
        }
    }
}
