//! Table rendering for command output.

use prettytable::{Table, format, row};
use riskdash_domain::entities::{Bank, Simulation, SimulationResults, User};
use riskdash_domain::value_objects::{
    BankPage, ExposureMatrix, MetricRange, Pagination, SimulationComparison, SimulationHistory,
    SimulationPage, SimulationParameters,
};
use rust_decimal::Decimal;

fn table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table
}

fn print_pagination(pagination: &Pagination) {
    println!(
        "Page {}/{} ({} total){}",
        pagination.page,
        pagination.total_pages.max(1),
        pagination.total_items,
        if pagination.has_next() { ", more with --page" } else { "" }
    );
}

pub fn print_user(user: &User) {
    let mut table = table();
    table.add_row(row!["Username", user.username]);
    table.add_row(row!["Email", user.email]);
    table.add_row(row!["Role", user.role]);
    if let Some(last_login) = user.last_login {
        table.add_row(row!["Last login", last_login.format("%Y-%m-%d %H:%M")]);
    }
    table.printstd();
}

pub fn print_simulations(page: &SimulationPage) {
    let mut table = table();
    table.set_titles(row!["ID", "Name", "Status", "Progress", "Created"]);
    for simulation in &page.simulations {
        table.add_row(row![
            simulation.id,
            simulation.name,
            simulation.status,
            format!("{:.0}%", simulation.progress_percent()),
            simulation
                .created_at
                .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        ]);
    }
    table.printstd();
    print_pagination(&page.pagination);
}

pub fn print_simulation(simulation: &Simulation) {
    let mut table = table();
    table.add_row(row!["ID", simulation.id]);
    table.add_row(row!["Name", simulation.name]);
    if let Some(description) = &simulation.description {
        table.add_row(row!["Description", description]);
    }
    table.add_row(row!["Status", simulation.status]);
    table.add_row(row!["Progress", format!("{:.0}%", simulation.progress_percent())]);
    if let Some(message) = &simulation.status_message {
        table.add_row(row!["Message", message]);
    }
    if let Some(error) = &simulation.error_message {
        table.add_row(row!["Error", error]);
    }
    table.add_row(row![
        "Results",
        if simulation.results_available() { "available" } else { "not yet" }
    ]);
    table.printstd();
    print_parameters(&simulation.parameters);
}

pub fn print_parameters(parameters: &SimulationParameters) {
    let mut table = table();
    table.set_titles(row!["Parameter", "Value"]);
    for (name, value) in parameters.entries() {
        table.add_row(row![name, value]);
    }
    table.printstd();
}

pub fn print_results(results: &SimulationResults) {
    let trad = &results.traditional_summary;
    let bc = &results.blockchain_summary;
    let imp = &results.improvements;

    let mut table = table();
    table.set_titles(row!["Metric", "Traditional", "Blockchain", "Improvement"]);
    table.add_row(row![
        "Average failures",
        format!("{:.2}", trad.average_failures),
        format!("{:.2}", bc.average_failures),
        format!("{:.1}%", imp.average_failures)
    ]);
    table.add_row(row![
        "Maximum failures",
        trad.max_failures,
        bc.max_failures,
        imp.max_failures
    ]);
    table.add_row(row![
        "Std dev failures",
        format!("{:.2}", trad.std_dev_failures),
        format!("{:.2}", bc.std_dev_failures),
        format!("{:.1}%", imp.std_dev_failures)
    ]);
    table.add_row(row![
        "Systemic event probability",
        format!("{:.2}%", trad.probability_systemic_event * 100.0),
        format!("{:.2}%", bc.probability_systemic_event * 100.0),
        format!("{:.1}%", imp.probability_systemic_event)
    ]);
    table.printstd();

    let stats = &results.statistical_analysis;
    println!(
        "t = {:.3}, p = {:.5} ({}), Cohen's d = {:.3} ({})",
        stats.t_stat,
        stats.p_value,
        if stats.is_significant() { "significant" } else { "not significant" },
        stats.cohens_d,
        stats.effect
    );
}

pub fn print_banks(page: &BankPage) {
    let mut table = table();
    table.set_titles(row![
        "ID",
        "Name",
        "CET1 %",
        "Total assets",
        "Interbank assets",
        "Interbank liabilities",
        "Capital buffer"
    ]);
    for bank in &page.banks {
        table.add_row(row![
            bank.id,
            bank.name,
            bank.cet1_ratio,
            money(bank.total_assets),
            money(bank.interbank_assets),
            money(bank.interbank_liabilities),
            money(bank.capital_buffer)
        ]);
    }
    table.printstd();
    print_pagination(&page.pagination);
}

pub fn print_bank(bank: &Bank) {
    let mut table = table();
    table.add_row(row!["ID", bank.id]);
    table.add_row(row!["Name", bank.name]);
    table.add_row(row!["CET1 ratio", format!("{}%", bank.cet1_ratio)]);
    table.add_row(row!["Total assets", money(bank.total_assets)]);
    table.add_row(row!["Interbank assets", money(bank.interbank_assets)]);
    table.add_row(row!["Interbank liabilities", money(bank.interbank_liabilities)]);
    table.add_row(row!["Net interbank", money(bank.net_interbank_position())]);
    table.add_row(row!["Capital buffer", money(bank.capital_buffer)]);
    table.printstd();
}

pub fn print_exposure(matrix: &ExposureMatrix) {
    if matrix.is_empty() {
        println!("No exposures recorded");
        return;
    }
    let mut table = table();
    let mut titles = row!["Owed to \\ by"];
    for name in &matrix.bank_names {
        titles.add_cell(prettytable::Cell::new(name));
    }
    table.set_titles(titles);
    for (i, name) in matrix.bank_names.iter().enumerate() {
        let mut line = row![name];
        for j in 0..matrix.len() {
            let cell = matrix
                .exposure(i, j)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default();
            line.add_cell(prettytable::Cell::new(&cell));
        }
        table.add_row(line);
    }
    table.printstd();
}

pub fn print_comparison(comparison: &SimulationComparison) {
    let mut table = table();
    table.set_titles(row!["Simulation", "Trad. avg", "BC avg", "Trad. systemic", "BC systemic"]);
    for (simulation, results) in comparison.simulations.iter().zip(&comparison.results) {
        table.add_row(row![
            simulation.name,
            format!("{:.2}", results.traditional_summary.average_failures),
            format!("{:.2}", results.blockchain_summary.average_failures),
            format!("{:.2}%", results.traditional_summary.probability_systemic_event * 100.0),
            format!("{:.2}%", results.blockchain_summary.probability_systemic_event * 100.0)
        ]);
    }
    table.printstd();

    let Some(metrics) = &comparison.comparison else {
        return;
    };
    let mut spread = self::table();
    spread.set_titles(row!["Metric", "Min", "Max", "Avg", "Range"]);
    for (label, range) in [
        ("Traditional avg failures", &metrics.traditional_avg_failures),
        ("Blockchain avg failures", &metrics.blockchain_avg_failures),
        ("Traditional systemic prob", &metrics.traditional_systemic_prob),
        ("Blockchain systemic prob", &metrics.blockchain_systemic_prob),
        ("Improvement %", &metrics.improvement),
    ] {
        spread.add_row(range_row(label, range));
    }
    spread.printstd();
}

fn range_row(label: &str, range: &MetricRange) -> prettytable::Row {
    row![
        label,
        format!("{:.3}", range.min),
        format!("{:.3}", range.max),
        format!("{:.3}", range.avg),
        format!("{:.3}", range.range)
    ]
}

pub fn print_history(history: &SimulationHistory) {
    let mut table = table();
    table.set_titles(row!["Created", "Name", "Trad. avg", "BC avg", "Improvement"]);
    for entry in &history.history {
        table.add_row(row![
            entry.created_at.format("%Y-%m-%d"),
            entry.name,
            format!("{:.2}", entry.traditional_avg_failures),
            format!("{:.2}", entry.blockchain_avg_failures),
            format!("{:.1}%", entry.improvement_percent)
        ]);
    }
    table.printstd();
    println!("{} completed simulations", history.count);
}

/// EUR billions with two decimals.
fn money(value: Decimal) -> String {
    format!("€{}bn", value.round_dp(2))
}
