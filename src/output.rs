use crate::error::AnalysisResult;
use crate::types::{
    Action, ActionRow, AlertRow, AlertStatus, BenchmarkResult, ClientInsight, InsightRow,
    PortfolioTotals, SavingsMap, SavingsRow,
};
use crate::util::format_number;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> AnalysisResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> AnalysisResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn insight_rows(insights: &[ClientInsight]) -> Vec<InsightRow> {
    insights.iter().map(InsightRow::from).collect()
}

pub fn savings_rows(savings: &SavingsMap) -> Vec<SavingsRow> {
    savings.iter().map(|(client, s)| SavingsRow::new(client, s)).collect()
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
    if rows.len() > max_rows {
        println!("({} more rows not shown)\n", rows.len() - max_rows);
    }
}

pub fn totals_line(t: &PortfolioTotals) -> String {
    format!(
        "Revenue: {} | Cost: {} | Profit: {}",
        format_number(t.total_revenue, 2),
        format_number(t.total_cost, 2),
        format_number(t.total_profit, 2)
    )
}

pub fn benchmark_lines(b: &BenchmarkResult) -> Vec<String> {
    vec![
        format!("Industry: {}", b.industry),
        format!("Industry average waste: {}%", format_number(b.industry_avg_waste_pct, 1)),
        format!("Your waste: {}%", format_number(b.your_waste_pct, 1)),
        format!("Potential savings: {}", format_number(b.potential_savings_usd, 2)),
        format!("Method: {}", b.method),
    ]
}

pub fn alert_rows(alerts: &[AlertStatus]) -> Vec<AlertRow> {
    alerts.iter().map(AlertRow::from).collect()
}

pub fn action_rows(actions: &[Action]) -> Vec<ActionRow> {
    actions.iter().map(ActionRow::from).collect()
}
