//! Colorful console output for simulation runs.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::kpi::SimulationResult;

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  _____ _           _     ____  _
 |  ___| | ___  ___| |_  / ___|(_)_ __ ___
 | |_  | |/ _ \/ _ \ __| \___ \| | '_ ` _ \
 |  _| | |  __/  __/ |_   ___) | | | | | | |
 |_|   |_|\___|\___|\__| |____/|_|_| |_| |_|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Fleet Simulation".bright_cyan()
    );
}

/// Prints the size of the fleet a run starts from.
pub fn print_run_started(simulation_id: &str, drivers: usize, routes: usize, orders: usize, pool: usize) {
    println!(
        "{} {} {} Run {} started: drivers ({}), routes ({}), backlog ({}), pool limit ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Simulation]".bright_cyan(),
        short_id(simulation_id).white().bold(),
        drivers.to_formatted_string(&Locale::en).bright_yellow(),
        routes.to_formatted_string(&Locale::en).bright_yellow(),
        orders.to_formatted_string(&Locale::en).bright_yellow(),
        pool.to_formatted_string(&Locale::en).bright_yellow()
    );
}

/// Prints the run summary box.
pub fn print_run_ended(simulation_id: &str, duration: Duration, result: &SimulationResult) {
    println!(
        "{} {} {} Run {} ended: time spent ({}), delivered ({}), unassigned ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Simulation]".bright_cyan(),
        short_id(simulation_id).white().bold(),
        format_duration(duration).yellow(),
        result.delivered().to_formatted_string(&Locale::en).bright_magenta().bold(),
        result.unassigned_orders.len().to_formatted_string(&Locale::en).white()
    );

    // 60 chars wide, 56 char content area
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());

    let unassigned = result.unassigned_orders.len();
    let status_text = if unassigned == 0 {
        "✓ ALL ORDERS ASSIGNED".to_string()
    } else {
        format!("⚠ {} ORDERS UNASSIGNED", unassigned.to_formatted_string(&Locale::en))
    };
    let status_colored = if unassigned == 0 {
        status_text.bright_green().bold().to_string()
    } else {
        status_text.bright_yellow().bold().to_string()
    };
    let status_padding = 56usize.saturating_sub(status_text.chars().count());
    let left_pad = status_padding / 2;
    let right_pad = status_padding - left_pad;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        status_colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    );

    println!("{}", "╠══════════════════════════════════════════════════════════╣".bright_cyan());

    let metrics = &result.performance_metrics;
    let rows = [
        ("Total Profit:", format_rupees(result.total_profit)),
        ("Efficiency:", format!("{:.1}%", result.efficiency_score)),
        (
            "On Time / Late:",
            format!("{} / {}", result.on_time_deliveries, result.late_deliveries),
        ),
        ("Utilization:", format!("{:.1}%", metrics.utilization_rate)),
        ("Fuel Cost:", format_rupees(metrics.total_fuel_cost)),
        ("Run Time:", format_duration(duration)),
    ];
    for (label, value) in rows {
        println!("{}  {:<18}{:>36}  {}", "║".bright_cyan(), label, value, "║".bright_cyan());
    }

    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

/// Formats rupees with thousands separators and paise.
///
/// ```
/// use fleet_simulation::console::format_rupees;
///
/// assert_eq!(format_rupees(1234567.891), "₹1,234,567.89");
/// assert_eq!(format_rupees(-50.0), "-₹50.00");
/// ```
pub fn format_rupees(amount: f64) -> String {
    let paise = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && paise > 0 { "-" } else { "" };
    format!(
        "{}₹{}.{:02}",
        sign,
        (paise / 100).to_formatted_string(&Locale::en),
        paise % 100
    )
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1 {
        format!("{}µs", d.as_micros())
    } else if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}
