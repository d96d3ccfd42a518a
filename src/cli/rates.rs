use super::labels::Labels;
use super::ui;
use crate::core::{CurrencySet, RateBoard, RateSnapshot, RateSource};
use anyhow::Result;
use chrono::Local;
use comfy_table::Cell;

/// Renders the market rate board: one row per foreign currency.
pub fn render_rates(
    snapshot: &RateSnapshot,
    currencies: &CurrencySet,
    labels: &Labels,
) -> String {
    let local = currencies.local_code();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(labels.currency),
        ui::header_cell(&format!("{} ({local})", labels.rate)),
    ]);

    for code in currencies.foreign_codes() {
        let rate = snapshot.table.get(code);
        table.add_row(vec![
            Cell::new(code.as_str()),
            ui::format_optional_cell(rate, |r| {
                ui::format_number(r, if r.fract() == 0.0 { 0 } else { 2 })
            }),
        ]);
    }

    let updated = snapshot.as_of.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    format!(
        "{}\n\n{}\n{}",
        ui::style_text(labels.rates_title, ui::StyleType::Title),
        table,
        ui::style_text(
            &format!("{} {updated}", labels.last_updated),
            ui::StyleType::Subtle
        )
    )
}

pub async fn run(
    board: &RateBoard,
    source: &dyn RateSource,
    currencies: &CurrencySet,
    refresh: bool,
    labels: &Labels,
) -> Result<()> {
    let snapshot = if refresh {
        let pb = ui::new_spinner("Refreshing rates...");
        let snapshot = board.refresh(source).await;
        pb.finish_and_clear();
        snapshot
    } else {
        board.snapshot()
    };

    println!("{}", render_rates(&snapshot, currencies, labels));
    Ok(())
}
