use super::labels::Labels;
use super::ui;
use crate::core::{CurrencyCode, HistoryRecord, HistoryStore};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

fn decimals(code: &CurrencyCode, local: &CurrencyCode) -> usize {
    if code == local { 0 } else { 2 }
}

pub fn render_history(
    records: &[HistoryRecord],
    local: &CurrencyCode,
    labels: &Labels,
) -> String {
    if records.is_empty() {
        return ui::style_text(labels.empty_history, ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(labels.date),
        ui::header_cell(labels.time),
        ui::header_cell(labels.amount),
        ui::header_cell(labels.rate),
        ui::header_cell(labels.result),
    ]);

    for record in records {
        let amount = ui::format_number(record.amount, decimals(&record.from, local));
        let result = ui::format_number(record.result, decimals(&record.to, local));
        table.add_row(vec![
            Cell::new(record.date.format("%Y-%m-%d")),
            Cell::new(record.time.format("%H:%M:%S")),
            Cell::new(format!("{amount} {}", record.from)).set_alignment(CellAlignment::Right),
            Cell::new(ui::format_number(record.rate, 2)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{result} {}", record.to)).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(labels.history, ui::StyleType::Title),
        table
    )
}

pub fn run(
    store: &dyn HistoryStore,
    local: &CurrencyCode,
    clear: bool,
    json: bool,
    labels: &Labels,
) -> Result<()> {
    if clear {
        store.clear()?;
        println!("{}", labels.history_cleared);
        return Ok(());
    }

    let records = store.list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("{}", render_history(&records, local, labels));
    }
    Ok(())
}
