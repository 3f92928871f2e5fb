use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::financials::{PeriodSummary, SeriesPoint};
use crate::utils::format_cop;

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Concept")]
    concept: String,
    #[tabled(rename = "COP")]
    value: String,
}

/// Render one period's summary as a table plus a completeness footer.
pub fn render_summary(period_id: &str, summary: &PeriodSummary) -> String {
    let rows = vec![
        SummaryRow {
            concept: "Income (total)".to_string(),
            value: format_cop(summary.income_total),
        },
        SummaryRow {
            concept: "  Salary".to_string(),
            value: format_cop(summary.income_salary),
        },
        SummaryRow {
            concept: "  Non-salary (real)".to_string(),
            value: format_cop(summary.income_non_salary_real),
        },
        SummaryRow {
            concept: "  Non-salary (projected)".to_string(),
            value: format_cop(summary.income_non_salary_projected),
        },
        SummaryRow {
            concept: "Expenses".to_string(),
            value: format_cop(summary.expenses_total),
        },
        SummaryRow {
            concept: "Balance".to_string(),
            value: format_cop(summary.balance),
        },
        SummaryRow {
            concept: "Balance w/o salary".to_string(),
            value: format_cop(summary.balance_without_salary),
        },
        SummaryRow {
            concept: "Debt".to_string(),
            value: format_cop(summary.debt_total),
        },
        SummaryRow {
            concept: "Liquid".to_string(),
            value: format_cop(summary.liquid_total),
        },
        SummaryRow {
            concept: "Capital (net)".to_string(),
            value: format_cop(summary.capital_total),
        },
        SummaryRow {
            concept: "Unspecified expense".to_string(),
            value: format_cop(summary.unspecified_expense),
        },
    ];

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let mut output = format!("{} Period {}\n\n{}\n", "✓".green().bold(), period_id, table);

    if summary.fx_incomplete {
        output.push_str(&format!(
            "\n{} USD->COP rate unset for this period; foreign amounts counted as zero\n",
            "!".yellow().bold()
        ));
    }

    output
}

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Capital")]
    capital: String,
    #[tabled(rename = "Liquid")]
    liquid: String,
    #[tabled(rename = "Debt")]
    debt: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Real income")]
    real_income: String,
    #[tabled(rename = "Projected")]
    projected_income: String,
}

/// Render the rolling cross-period series, oldest month first.
pub fn render_series(points: &[SeriesPoint]) -> String {
    let rows: Vec<SeriesRow> = points
        .iter()
        .map(|p| SeriesRow {
            period: p.period_id.clone(),
            capital: format_cop(p.summary.capital_total),
            liquid: format_cop(p.summary.liquid_total),
            debt: format_cop(p.summary.debt_total),
            expenses: format_cop(p.summary.expenses_total),
            real_income: format_cop(p.real_income),
            projected_income: format_cop(p.projected_income),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let mut output = format!("{}\n", table);

    if points.iter().any(|p| p.summary.fx_incomplete) {
        output.push_str(&format!(
            "\n{} Some periods are missing a USD->COP rate; their foreign amounts counted as zero\n",
            "!".yellow().bold()
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn summary() -> PeriodSummary {
        PeriodSummary {
            income_total: dec!(6000000),
            income_salary: dec!(5000000),
            income_non_salary_real: dec!(1000000),
            income_non_salary_projected: dec!(9489),
            expenses_total: dec!(3000000),
            balance: dec!(3000000),
            balance_without_salary: dec!(-2000000),
            debt_total: dec!(500000),
            liquid_total: dec!(2000000),
            capital_total: dec!(10000000),
            unspecified_expense: Decimal::ZERO,
            fx_incomplete: false,
        }
    }

    #[test]
    fn test_render_summary_contains_all_aggregates() {
        let output = render_summary("2024-05", &summary());
        assert!(output.contains("2024-05"));
        assert!(output.contains("$ 6.000.000"));
        assert!(output.contains("$ -2.000.000"));
        assert!(output.contains("Capital (net)"));
        assert!(!output.contains("rate unset"));
    }

    #[test]
    fn test_render_summary_warns_on_incomplete_fx() {
        let mut s = summary();
        s.fx_incomplete = true;
        let output = render_summary("2024-05", &s);
        assert!(output.contains("rate unset"));
    }

    #[test]
    fn test_render_series_lists_each_period() {
        let points = vec![
            SeriesPoint {
                period_id: "2024-04".to_string(),
                summary: summary(),
                real_income: Decimal::ZERO,
                projected_income: Decimal::ZERO,
            },
            SeriesPoint {
                period_id: "2024-05".to_string(),
                summary: summary(),
                real_income: dec!(250000),
                projected_income: dec!(9489),
            },
        ];
        let output = render_series(&points);
        assert!(output.contains("2024-04"));
        assert!(output.contains("2024-05"));
        assert!(output.contains("$ 250.000"));
        assert!(output.contains("Projected"));
        assert!(output.contains("$ 9.489"));
    }
}
