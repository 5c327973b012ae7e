use super::ui;
use crate::core::analytics::{FundAnalytics, ReturnsRow};
use crate::core::catalog::SchemeRef;
use crate::core::error::FetchError;
use crate::core::period::ReturnPeriod;
use comfy_table::{Cell, Table};
use std::collections::HashMap;
use tracing::info;

pub async fn run(analytics: &FundAnalytics, schemes: &[SchemeRef]) -> anyhow::Result<()> {
    info!("Calculating returns for {} schemes...", schemes.len());

    if schemes.is_empty() {
        println!("No schemes found to calculate returns for.");
        return Ok(());
    }

    let codes: Vec<String> = schemes.iter().map(|s| s.code.clone()).collect();
    let pb = ui::new_progress_bar(codes.len() as u64);
    let rows = analytics
        .returns_table(&codes, &ReturnPeriod::ALL, &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    let table = build_table(schemes, &rows, analytics.near_tolerance_days());
    println!("{table}");
    Ok(())
}

fn build_table(
    schemes: &[SchemeRef],
    rows: &HashMap<String, Result<ReturnsRow, FetchError>>,
    tolerance_days: i64,
) -> Table {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("Scheme")];
    for period in &ReturnPeriod::ALL {
        header.push(ui::header_cell(&period.to_string()));
    }
    header.push(ui::header_cell(&format!("1Y (±{tolerance_days} days)")));
    header.push(ui::header_cell("Risk"));
    table.set_header(header);

    for scheme in schemes {
        let mut row_cells = vec![Cell::new(format!("{} ({})", scheme.name, scheme.code))];
        match rows.get(&scheme.code) {
            Some(Ok(row)) => {
                for period in &ReturnPeriod::ALL {
                    let percent = row.returns.get(period).and_then(|r| r.percent);
                    row_cells.push(ui::optional_change_cell(percent, false));
                }
                row_cells.push(ui::optional_change_cell(row.one_year_near, false));
            }
            _ => {
                for _ in 0..=ReturnPeriod::ALL.len() {
                    row_cells.push(ui::na_cell(true));
                }
            }
        }
        row_cells.push(ui::risk_cell(scheme.risk()));
        table.add_row(row_cells);
    }

    table
}
