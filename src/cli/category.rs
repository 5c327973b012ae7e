use super::ui;
use crate::core::analytics::{FundAnalytics, FundSnapshot, SNAPSHOT_PERIODS};
use crate::core::catalog::SchemeCategory;
use chrono::NaiveDate;
use comfy_table::{Cell, Table};
use tracing::info;

pub async fn run(analytics: &FundAnalytics, category: &SchemeCategory) -> anyhow::Result<()> {
    info!(
        "Loading {} schemes for category {}...",
        category.schemes.len(),
        category.name
    );

    println!(
        "\nCategory: {}",
        ui::style_text(&category.name, ui::StyleType::Title)
    );
    if category.schemes.is_empty() {
        println!("No schemes in this category.");
        return Ok(());
    }

    let pb = ui::new_progress_bar(category.schemes.len() as u64);
    let snapshots = analytics.snapshots(&category.schemes, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    let table = build_table(&snapshots, analytics.near_tolerance_days());
    println!("{table}");

    for snapshot in &snapshots {
        if let Some(reason) = &snapshot.error {
            let line = format!("{}: {}", snapshot.scheme.code, reason);
            println!("{}", ui::style_text(&line, ui::StyleType::Error));
        }
    }
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

fn build_table(snapshots: &[FundSnapshot], tolerance_days: i64) -> Table {
    let mut table = ui::new_styled_table();

    let mut header = vec![
        ui::header_cell("Scheme"),
        ui::header_cell("NAV"),
        ui::header_cell("As of"),
    ];
    for period in &SNAPSHOT_PERIODS {
        header.push(ui::header_cell(&period.to_string()));
    }
    header.push(ui::header_cell(&format!("1Y (±{tolerance_days} days)")));
    header.push(ui::header_cell("Risk"));
    header.push(ui::header_cell("Std Dev"));
    table.set_header(header);

    for snapshot in snapshots {
        let has_error = snapshot.error.is_some();
        let nav = match snapshot.latest_nav {
            Some(nav) => ui::nav_cell(nav),
            None => ui::na_cell(has_error),
        };
        let mut row_cells = vec![
            Cell::new(&snapshot.scheme.name),
            nav,
            ui::format_optional_cell(snapshot.latest_date, format_date),
        ];
        for period in &SNAPSHOT_PERIODS {
            let percent = snapshot.percent(*period);
            row_cells.push(ui::optional_change_cell(percent, has_error));
        }
        let std_dev = ui::format_optional_cell(snapshot.nav_std_dev, |v| format!("{v:.2}"));
        row_cells.push(ui::optional_change_cell(snapshot.one_year_near, has_error));
        row_cells.push(ui::risk_cell(snapshot.risk));
        row_cells.push(std_dev);
        table.add_row(row_cells);
    }

    table
}
