//! Сборка интерактивной HTML-страницы дашборда.

mod chart;
mod page;

use std::error::Error;
use std::fs;
use std::path::Path;

use chrono::Utc;
use minify_html::{Cfg, minify};

use crate::dashboard::Dashboard;

/// Заголовок и подзаголовок страницы (см. `config/page.toml`).
#[derive(Clone, Debug)]
pub struct PageMeta {
    pub title: String,
    pub subtitle: String,
}

/// Рендерит дашборд в самодостаточный HTML-файл.
pub fn render_dashboard(
    dashboard: &Dashboard,
    output_html: &Path,
    meta: &PageMeta,
    minify_html: bool,
) -> Result<(), Box<dyn Error>> {
    // Создаём директорию для HTML, если её ещё нет.
    if let Some(parent) = output_html.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let charts = chart::build_dashboard_charts(dashboard)?;
    let generated_at = Utc::now();
    let page = page::render_dashboard_page(&charts, meta, generated_at);
    let bytes = if minify_html {
        minify(page.as_bytes(), &Cfg::new())
    } else {
        page.into_bytes()
    };
    fs::write(output_html, bytes)?;
    Ok(())
}
