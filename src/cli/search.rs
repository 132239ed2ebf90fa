use super::ui;
use crate::core::quote::SearchResult;
use crate::core::resolver::FailoverResolver;
use anyhow::{Context, Result};
use comfy_table::Cell;

/// Searches the configured providers. A query nobody recognizes yields an
/// empty list rather than an error.
pub async fn search(resolver: &FailoverResolver, query: &str) -> Result<Vec<SearchResult>> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Search query must not be empty");
    }
    match resolver.search(query).await {
        Ok(results) => Ok(results),
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("Search for {query:?} failed")),
    }
}

pub fn render(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return ui::style_text(&format!("No instruments match {query:?}"), ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Name"),
        ui::header_cell("Type"),
        ui::header_cell("Currency"),
        ui::header_cell("Price"),
    ]);
    for result in results {
        table.add_row(vec![
            Cell::new(&result.ticker),
            Cell::new(&result.name),
            Cell::new(result.instrument_type.to_string()),
            Cell::new(result.currency.as_deref().unwrap_or("N/A")),
            ui::format_optional_cell(result.price, |p| format!("{:.2}", p.round_dp(2))),
        ]);
    }
    table.to_string()
}

pub async fn run(resolver: &FailoverResolver, query: &str) -> Result<()> {
    let results = search(resolver, query).await?;
    println!("{}", render(query, &results));
    Ok(())
}
