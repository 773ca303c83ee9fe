//! report-runner: headless reporting over the teachers and students sources.
//!
//! Usage:
//!   report-runner --teachers-db teachers.db --students-db students.db [--local-db local.db]
//!                 [--data-dir ./data] [--json] <command>
//!
//! Commands:
//!   dashboard                     (default) totals, revenue by month and by teacher
//!   teachers                      teachers with their resolved price
//!   teacher <id>                  months one teacher has students in
//!   month <id> <month>            students of one teacher in one month
//!   student <student_id>          a student's subscriptions
//!   set-price <id> <value>        commit a price edit

use anyhow::{bail, Context, Result};
use stemify_core::{
    config::ReportConfig,
    loader::ReportLoader,
    overrides::OverrideStore,
    report::DashboardSummary,
    store::SourceStore,
    types::Period,
};
use std::env;
use std::path::Path;

const FLAGS_WITH_VALUE: &[&str] = &["--teachers-db", "--students-db", "--local-db", "--data-dir"];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let teachers_db = flag_value(&args, "--teachers-db").unwrap_or("teachers.db");
    let students_db = flag_value(&args, "--students-db").unwrap_or("students.db");
    let local_db = flag_value(&args, "--local-db").unwrap_or("local.db");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let json = args.iter().any(|a| a == "--json");
    let command = positional(&args);

    let config = if Path::new(data_dir).join("report_config.json").exists() {
        ReportConfig::load(data_dir)?
    } else {
        log::info!("no report_config.json in {data_dir}, using defaults");
        ReportConfig::default()
    };

    let teachers_source = SourceStore::open(teachers_db)?;
    teachers_source.migrate_teachers()?;
    let students_source = SourceStore::open(students_db)?;
    students_source.migrate_students()?;
    let local = SourceStore::open(local_db)?;
    local.migrate_local()?;
    let overrides = OverrideStore::sqlite(local, &config.override_namespace, config.default_price);

    let loader = ReportLoader::new(&teachers_source, &students_source, &overrides, &config);

    match command.first().map(String::as_str).unwrap_or("dashboard") {
        "dashboard" => {
            let summary = loader.load_dashboard();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_dashboard(&summary);
            }
        }
        "teachers" => {
            let prices = loader.load_teacher_prices()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prices)?);
            } else {
                println!("=== TEACHERS ===");
                for p in &prices {
                    println!(
                        "  {:<24} {:<16} {:>10.2}  ({:?})",
                        p.teacher.display_name(),
                        p.teacher.id,
                        p.price,
                        p.source
                    );
                }
            }
        }
        "teacher" => {
            let id = required(&command, 1, "teacher id")?;
            let months = loader.load_teacher_months(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&months)?);
            } else {
                println!("=== {} ({}) ===", months.display_name, months.teacher_id);
                println!("  price per student: {:.2} ({:?})", months.unit_price, months.price_source);
                if months.months.is_empty() {
                    println!("  (No months)");
                }
                for m in &months.months {
                    println!(
                        "  Month {:<4} students: {:<6} revenue: {:.2}",
                        m.period, m.student_count, m.revenue
                    );
                }
            }
        }
        "month" => {
            let id = required(&command, 1, "teacher id")?;
            let period: Period = required(&command, 2, "month")?
                .parse()
                .context("month must be a non-negative integer")?;
            let detail = loader.load_month_detail(id, period)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                println!("=== Month {}: {} ===", detail.period, detail.display_name);
                println!("  students: {}", detail.student_count);
                println!("  price:    {:.2}", detail.unit_price);
                println!("  total:    {:.2}", detail.total);
                for r in &detail.records {
                    println!(
                        "  {:<16} grade: {:<6} created: {}",
                        r.student_id.as_deref().unwrap_or("—"),
                        r.grade.as_ref().map(ToString::to_string).unwrap_or_else(|| "—".into()),
                        r.created_at
                            .map(|t| t.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| "—".into()),
                    );
                }
            }
        }
        "student" => {
            let id = required(&command, 1, "student id")?;
            let subs = loader.load_student(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&subs)?);
            } else {
                println!("=== {} ===", subs.display_name);
                if subs.subscriptions.is_empty() {
                    println!("  (No subscriptions)");
                }
                for s in &subs.subscriptions {
                    println!(
                        "  {:<10} {:<24} grade: {}",
                        s.period_label,
                        s.teacher_name.as_deref().unwrap_or(&s.teacher_id),
                        s.grade.as_ref().map(ToString::to_string).unwrap_or_else(|| "—".into()),
                    );
                }
            }
        }
        "set-price" => {
            let id = required(&command, 1, "teacher id")?;
            let value: f64 = required(&command, 2, "price")?
                .parse()
                .context("price must be a number")?;
            if loader.set_price(id, value)? {
                println!("{id}: price set to {value:.2}");
            } else {
                println!("{id}: price {value} rejected (must be >= 0)");
            }
        }
        other => bail!("Unknown command: {other}"),
    }

    Ok(())
}

fn print_dashboard(summary: &DashboardSummary) {
    let report = &summary.report;

    println!("=== DASHBOARD ===");
    println!("  students:       {}", summary.student_count);
    println!("  teachers:       {}", summary.teacher_count);
    println!("  months:         {}", summary.slot_count);
    println!("  total revenue:  {:.2}", report.total_revenue);
    if let Some(err) = &summary.error {
        println!("  error:          {err}");
    }

    println!();
    println!("=== REVENUE BY MONTH ===");
    if report.revenue_by_period.is_empty() {
        println!("  (No month data yet)");
    }
    for (period, revenue) in &report.revenue_by_period {
        println!("  Month {period:<4} {revenue:>12.2}");
    }

    println!();
    println!("=== REVENUE BY TEACHER ===");
    for (name, revenue) in summary.teacher_names.iter().zip(&report.revenue_by_entity) {
        println!("  {name:<24} {revenue:>12.2}");
    }

    println!();
    println!("=== STUDENTS PER MONTH ===");
    for (period, count) in summary.month_series.iter().zip(&summary.students_per_month) {
        println!("  Month {period:<4} {count:>6}");
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if FLAGS_WITH_VALUE.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn required<'a>(command: &'a [String], idx: usize, what: &str) -> Result<&'a str> {
    match command.get(idx) {
        Some(v) => Ok(v.as_str()),
        None => bail!("Missing {what}"),
    }
}
