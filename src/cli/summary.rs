use super::ui;
use crate::core::analytics::{PortfolioSnapshot, snapshot};
use crate::core::store::PortfolioStore;
use anyhow::Result;
use comfy_table::Cell;

impl PortfolioSnapshot {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Ticker"),
            ui::header_cell("Name"),
            ui::header_cell("Type"),
            ui::header_cell("Invested"),
            ui::header_cell("Price"),
            ui::header_cell("Value"),
            ui::header_cell("P/L"),
            ui::header_cell("P/L (%)"),
            ui::header_cell("Weight (%)"),
        ]);

        for weighted in &self.holdings {
            let holding = &weighted.holding;
            table.add_row(vec![
                Cell::new(&holding.ticker),
                Cell::new(&holding.name),
                Cell::new(holding.instrument_type.to_string()),
                ui::amount_cell(holding.invested),
                ui::amount_cell(holding.current_price),
                ui::amount_cell(holding.current_value),
                ui::signed_cell(holding.profit_loss, ""),
                ui::change_cell(holding.profit_loss_percent),
                ui::amount_cell(weighted.allocation_percent),
            ]);
        }

        let summary = &self.summary;
        let mut by_type = ui::new_styled_table();
        by_type.set_header(vec![ui::header_cell("Type"), ui::header_cell("Value")]);
        for (instrument_type, value) in &summary.by_type {
            by_type.add_row(vec![
                Cell::new(instrument_type.to_string()),
                ui::amount_cell(*value),
            ]);
        }

        let total_style = if summary.total_profit_loss.is_sign_negative() {
            ui::StyleType::Error
        } else {
            ui::StyleType::TotalValue
        };

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Portfolio", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str("\n\n");
        output.push_str(&by_type.to_string());
        output.push_str(&format!(
            "\n\n{} {:.2}\n{} {:.2}\n{} {}",
            ui::style_text("Total Invested:", ui::StyleType::TotalLabel),
            summary.total_invested.round_dp(2),
            ui::style_text("Total Value:", ui::StyleType::TotalLabel),
            summary.total_current_value.round_dp(2),
            ui::style_text("Total P/L:", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!(
                    "{:.2} ({:.2}%)",
                    summary.total_profit_loss.round_dp(2),
                    summary.total_profit_loss_percent.round_dp(2)
                ),
                total_style
            ),
        ));
        output
    }
}

pub async fn run(store: &dyn PortfolioStore) -> Result<()> {
    let instruments = store.list().await?;
    if instruments.is_empty() {
        println!(
            "{}",
            ui::style_text("No instruments tracked yet.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let currencies: std::collections::BTreeSet<_> =
        instruments.iter().map(|i| i.currency.as_str()).collect();
    println!("{}", snapshot(&instruments).display_as_table());
    if currencies.len() > 1 {
        ui::print_separator();
        println!(
            "{}",
            ui::style_text(
                "Totals add amounts in different currencies without conversion.",
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}
