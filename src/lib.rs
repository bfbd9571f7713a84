//! Profitability, license-waste and savings analysis for billing CSV exports.
//!
//! Raw CSV text goes through [`loader`] into rows, [`portfolio`] turns the
//! rows into per-client insights and totals, and the remaining modules are
//! independent pure functions over that insight list:
//! [`rightsizing`], [`alerts`], [`benchmarks`] and [`actions`].

pub mod actions;
pub mod alerts;
pub mod benchmarks;
pub mod config;
pub mod error;
pub mod insights;
pub mod loader;
pub mod output;
pub mod portfolio;
pub mod rightsizing;
pub mod types;
pub mod util;

pub use alerts::{AlertThresholds, Budgets};
pub use benchmarks::IndustryBaselines;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use types::*;

/// Run every analysis step over one CSV snapshot.
///
/// Alerts are only attached when `budgets` is given.
pub fn analyze(
    csv_text: &str,
    budgets: Option<&Budgets>,
    config: &AnalysisConfig,
    baselines: &IndustryBaselines,
) -> AnalysisResult<ReportBundle> {
    config.validate()?;
    let (_, mut report) = portfolio::analyze_text(csv_text)?;
    if let Some(b) = budgets {
        alerts::attach_alerts(&mut report, b, config.thresholds());
    }

    let insights = &report.client_insights;
    let savings = rightsizing::simulate(insights, config.recoverable_factor);
    let benchmark =
        benchmarks::compare(insights, &config.industry, baselines, config.recoverable_factor);
    let mut recommended = actions::rule_based_actions(insights);
    actions::enrich_with_savings(&mut recommended, &savings);

    Ok(ReportBundle {
        report,
        savings,
        benchmark,
        actions: recommended,
    })
}
