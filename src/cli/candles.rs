use super::ui;
use crate::core::analytics::FundAnalytics;
use crate::core::candles::{BucketOrder, Candle};
use crate::core::catalog::SchemeRef;
use crate::core::period::ReturnPeriod;
use comfy_table::{Cell, Table};
use tracing::info;

pub async fn run(
    analytics: &FundAnalytics,
    scheme: &SchemeRef,
    window: ReturnPeriod,
    order: BucketOrder,
) -> anyhow::Result<()> {
    info!("Building {} candles for scheme {}...", window, scheme.code);

    let candles = analytics.candles(&scheme.code, window, order).await?;

    println!(
        "\n{} {}",
        ui::style_text(&scheme.name, ui::StyleType::Title),
        ui::style_text(&format!("({window}, monthly)"), ui::StyleType::Subtle)
    );
    if candles.is_empty() {
        println!("No NAV observations in the selected window.");
        return Ok(());
    }
    println!("{}", build_table(&candles));
    Ok(())
}

fn build_table(candles: &[Candle]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell("Open"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Close"),
        ui::header_cell("Change"),
    ]);

    for candle in candles {
        table.add_row(vec![
            Cell::new(&candle.label),
            ui::nav_cell(candle.open),
            ui::nav_cell(candle.high),
            ui::nav_cell(candle.low),
            ui::nav_cell(candle.close),
            ui::change_cell((candle.close - candle.open) / candle.open * 100.0),
        ]);
    }
    table
}
