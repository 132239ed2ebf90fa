use super::ui;
use crate::core::instrument::Instrument;
use crate::core::store::PortfolioStore;
use anyhow::Result;
use comfy_table::Cell;

pub fn render(instruments: &[Instrument]) -> String {
    if instruments.is_empty() {
        return ui::style_text(
            "No instruments tracked yet. Use `folio add` to start.",
            ui::StyleType::Subtle,
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Name"),
        ui::header_cell("Type"),
        ui::header_cell("ISIN"),
        ui::header_cell("Invested"),
        ui::header_cell("Price"),
        ui::header_cell("Currency"),
        ui::header_cell("Updated (UTC)"),
    ]);
    for instrument in instruments {
        table.add_row(vec![
            Cell::new(&instrument.ticker),
            Cell::new(&instrument.name),
            Cell::new(instrument.instrument_type.to_string()),
            Cell::new(instrument.isin.as_deref().unwrap_or("")),
            ui::amount_cell(instrument.invested_amount),
            ui::format_optional_cell(instrument.current_price, |p| format!("{:.2}", p.round_dp(2))),
            Cell::new(&instrument.currency),
            ui::timestamp_cell(instrument.price_updated_at),
        ]);
    }
    table.to_string()
}

pub async fn run(store: &dyn PortfolioStore) -> Result<()> {
    let instruments = store.list().await?;
    println!("{}", render(&instruments));
    Ok(())
}
