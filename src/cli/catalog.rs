use super::ui;
use crate::core::catalog::{CatalogSource, SchemeCategory, SchemeRef, load_catalog};
use crate::providers::util::RetryPolicy;
use comfy_table::{Cell, Table};

/// Lists the configured categories and their schemes.
pub fn run_static(categories: &[SchemeCategory]) -> anyhow::Result<()> {
    if categories.is_empty() {
        println!("No categories configured.");
        return Ok(());
    }

    let num_categories = categories.len();
    for (i, category) in categories.iter().enumerate() {
        println!(
            "\nCategory: {}",
            ui::style_text(&category.name, ui::StyleType::Title)
        );
        println!("{}", build_table(&category.schemes));

        if i < num_categories - 1 {
            ui::print_separator();
        }
    }
    Ok(())
}

/// Lists the leading schemes of the remote catalog.
pub async fn run_remote(source: &dyn CatalogSource, policy: &RetryPolicy) -> anyhow::Result<()> {
    let schemes = load_catalog(source, policy).await;
    if schemes.is_empty() {
        println!(
            "{}",
            ui::style_text("Scheme catalog is unavailable.", ui::StyleType::Error)
        );
        return Ok(());
    }

    println!("{}", build_table(&schemes));
    Ok(())
}

fn build_table(schemes: &[SchemeRef]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Scheme"),
        ui::header_cell("Category"),
        ui::header_cell("AMC"),
        ui::header_cell("Risk"),
    ]);

    for scheme in schemes {
        table.add_row(vec![
            Cell::new(&scheme.code),
            Cell::new(&scheme.name),
            Cell::new(&scheme.category),
            Cell::new(&scheme.amc),
            ui::risk_cell(scheme.risk()),
        ]);
    }
    table
}
