use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tabled::Table;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::core::{
    DEFAULT_GOAL_RETURN_PERCENT, DEFAULT_STEP_UP_PERCENT, Goal, GoalPriority, SipInputs,
    SipResult, SwpInputs, SwpResult, default_goals, plan_goals, suggest_from_sip, validate_goal,
};
use crate::report::{Report, ReportKind, format_inr, sip_insights, swp_insights};
use crate::session::{CalculatorSession, DEFAULT_SIP_INPUTS, DEFAULT_SWP_INPUTS};
use crate::store::{JsonFileStore, ScenarioBook};

use super::{AdvancedPayload, DEFAULT_INFLATION_PERCENT, DEFAULT_TAX_PERCENT};

#[derive(Parser, Debug)]
#[command(
    name = "sipcalc",
    about = "SIP and SWP calculator with goal planning, saved scenarios and text reports"
)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Directory holding saved calculations
    #[arg(long, global = true, default_value = ".sipcalc")]
    pub data_dir: PathBuf,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the web calculator and JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project the maturity value of a monthly SIP
    Sip(SipArgs),
    /// Simulate monthly withdrawals from a corpus
    Swp(SwpArgs),
    /// Required monthly SIP for each financial goal
    Goals(GoalsArgs),
    /// Inflation, tax, step-up and rate comparisons for a SIP
    Advanced(AdvancedArgs),
    /// Write a paginated text report
    Report(ReportArgs),
    /// Manage saved calculations
    Scenarios {
        #[command(subcommand)]
        action: ScenarioAction,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct SipArgs {
    #[arg(long, default_value_t = DEFAULT_SIP_INPUTS.investment_amount, help = "Monthly investment in rupees")]
    pub amount: f64,
    #[arg(long, default_value_t = DEFAULT_SIP_INPUTS.sip_duration, help = "Duration in years")]
    pub years: f64,
    #[arg(long, default_value_t = DEFAULT_SIP_INPUTS.annual_return, help = "Expected annual return in percent, e.g. 12")]
    pub rate: f64,
}

impl From<SipArgs> for SipInputs {
    fn from(args: SipArgs) -> Self {
        SipInputs::new(args.amount, args.years, args.rate)
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct SwpArgs {
    #[arg(long, default_value_t = DEFAULT_SWP_INPUTS.total_investment, help = "Starting corpus in rupees")]
    pub corpus: f64,
    #[arg(long, default_value_t = DEFAULT_SWP_INPUTS.monthly_withdrawal)]
    pub withdrawal: f64,
    #[arg(long, default_value_t = DEFAULT_SWP_INPUTS.annual_return)]
    pub rate: f64,
}

impl From<SwpArgs> for SwpInputs {
    fn from(args: SwpArgs) -> Self {
        SwpInputs::new(args.corpus, args.withdrawal, args.rate)
    }
}

#[derive(Args, Debug, Clone)]
pub struct GoalsArgs {
    #[arg(long, default_value_t = DEFAULT_SIP_INPUTS.investment_amount)]
    pub current_sip: f64,
    #[arg(long, default_value_t = DEFAULT_GOAL_RETURN_PERCENT)]
    pub rate: f64,
    #[arg(
        long = "goal",
        value_parser = parse_goal,
        help = "Goal as name:amount:years[:priority]; repeat for several goals"
    )]
    pub goals: Vec<GoalArg>,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct AdvancedArgs {
    #[command(flatten)]
    pub sip: SipArgs,
    #[arg(long, default_value_t = DEFAULT_INFLATION_PERCENT)]
    pub inflation: f64,
    #[arg(long, default_value_t = DEFAULT_TAX_PERCENT)]
    pub tax: f64,
    #[arg(long, default_value_t = DEFAULT_STEP_UP_PERCENT)]
    pub step_up: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliReportKind {
    Sip,
    Swp,
    Combined,
}

impl From<CliReportKind> for ReportKind {
    fn from(value: CliReportKind) -> Self {
        match value {
            CliReportKind::Sip => ReportKind::Sip,
            CliReportKind::Swp => ReportKind::Swp,
            CliReportKind::Combined => ReportKind::Combined,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long, value_enum, default_value_t = CliReportKind::Sip)]
    pub kind: CliReportKind,
    #[arg(long, default_value = "")]
    pub name: String,
    #[command(flatten)]
    pub sip: SipArgs,
    #[arg(long, help = "Override the withdrawal corpus")]
    pub corpus: Option<f64>,
    #[arg(long, help = "Override the monthly withdrawal")]
    pub withdrawal: Option<f64>,
    #[arg(long, help = "Override the withdrawal-phase return")]
    pub withdrawal_rate: Option<f64>,
    #[arg(long, help = "Build the report from a saved calculation")]
    pub id: Option<i64>,
    #[arg(long, help = "Output file; defaults to the report's own filename")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScenarioAction {
    /// List saved calculations, most recent first
    List,
    /// Calculate a SIP and save it under a name
    Save {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        sip: SipArgs,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
    /// Remove every saved calculation
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalArg {
    pub name: String,
    pub amount: f64,
    pub years: f64,
    pub priority: GoalPriority,
}

fn parse_goal(raw: &str) -> Result<GoalArg, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    if !(3..=4).contains(&parts.len()) {
        return Err(format!(
            "expected name:amount:years[:priority], got '{raw}'"
        ));
    }
    let amount: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("invalid goal amount '{}'", parts[1]))?;
    let years: f64 = parts[2]
        .trim()
        .parse()
        .map_err(|_| format!("invalid goal horizon '{}'", parts[2]))?;
    let priority = match parts.get(3).map(|p| p.trim().to_ascii_lowercase()).as_deref() {
        None | Some("medium") => GoalPriority::Medium,
        Some("high") => GoalPriority::High,
        Some("low") => GoalPriority::Low,
        Some(other) => return Err(format!("unknown goal priority '{other}'")),
    };
    let name = parts[0].trim().to_string();
    validate_goal(&name, amount, years)
        .into_result()
        .map_err(|errors| errors.to_string())?;
    Ok(GoalArg {
        name,
        amount,
        years,
        priority,
    })
}

fn goals_from_args(args: &[GoalArg]) -> Vec<Goal> {
    if args.is_empty() {
        return default_goals();
    }
    args
        .iter()
        .enumerate()
        .map(|(index, arg)| Goal {
            id: index as i64 + 1,
            name: arg.name.clone(),
            amount: arg.amount,
            years: arg.years,
            priority: arg.priority,
        })
        .collect()
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port } => super::run_http_server(port, cli.data_dir)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Sip(args) => run_sip(args, cli.json),
        Command::Swp(args) => run_swp(args, cli.json),
        Command::Goals(args) => run_goals(&args, cli.json),
        Command::Advanced(args) => run_advanced(args, cli.json),
        Command::Report(args) => run_report(&args, cli.data_dir),
        Command::Scenarios { action } => run_scenarios(action, cli.data_dir, cli.json),
    }
}

fn calculate_sip(inputs: SipInputs) -> Result<SipResult, String> {
    let mut session = CalculatorSession::new();
    let result = session.update_sip(inputs).cloned();
    result.ok_or_else(|| session.errors().to_string())
}

fn calculate_swp(inputs: SwpInputs) -> Result<SwpResult, String> {
    let mut session = CalculatorSession::new();
    let result = session.update_swp(inputs).cloned();
    result.ok_or_else(|| session.errors().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn key_value_table<'a>(rows: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, value) in rows {
        builder.push_record([key.to_string(), value]);
    }
    let mut table = Table::from(builder);
    table.with(Style::rounded());
    table.to_string()
}

fn grid_table(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }
    let mut table = Table::from(builder);
    table.with(Style::rounded());
    table.to_string()
}

fn run_sip(args: SipArgs, json: bool) -> Result<(), String> {
    let result = calculate_sip(args.into())?;
    if json {
        return print_json(&result);
    }
    println!("{}", sip_summary_table(&result));
    let rows = result
        .yearly_data
        .iter()
        .map(|point| {
            vec![
                point.year.to_string(),
                format_inr(point.investment),
                format_inr(point.value),
                format_inr(point.returns),
            ]
        })
        .collect();
    println!(
        "{}",
        grid_table(&["Year", "Invested", "Value", "Returns"], rows)
    );
    for line in sip_insights(&result).lines() {
        println!("  - {line}");
    }
    Ok(())
}

fn sip_summary_table(result: &SipResult) -> String {
    key_value_table([
        ("Monthly investment", format_inr(result.investment_amount)),
        ("Duration", format!("{} years", result.sip_duration)),
        ("Expected return", format!("{}%", result.annual_return)),
        ("Total invested", format_inr(result.total_investment)),
        ("Estimated returns", format_inr(result.total_gains)),
        ("Maturity value", format_inr(result.future_value)),
        (
            "Wealth multiplier",
            format!("{:.2}x", result.wealth_multiplier),
        ),
    ])
}

fn run_swp(args: SwpArgs, json: bool) -> Result<(), String> {
    let result = calculate_swp(args.into())?;
    if json {
        return print_json(&result);
    }
    println!(
        "{}",
        key_value_table([
            ("Initial corpus", format_inr(result.total_investment)),
            ("Monthly withdrawal", format_inr(result.monthly_withdrawal)),
            ("Expected return", format!("{}%", result.annual_return)),
            (
                "Corpus lasts",
                format!(
                    "{:.1} years ({} months)",
                    result.years_lasting, result.months_lasting
                ),
            ),
            ("Total withdrawn", format_inr(result.total_withdrawn)),
            ("Remaining corpus", format_inr(result.remaining_value)),
            (
                "Sustainable withdrawal",
                format_inr(result.sustainable_withdrawal),
            ),
        ])
    );
    let rows = result
        .yearly_data
        .iter()
        .map(|year| {
            vec![
                year.year.to_string(),
                format_inr(year.remaining_value),
                format_inr(year.total_withdrawn),
                format!("{:.1}%", year.corpus_percentage),
            ]
        })
        .collect();
    println!(
        "{}",
        grid_table(&["Year", "Remaining", "Withdrawn", "Corpus %"], rows)
    );
    for line in swp_insights(&result).lines() {
        println!("  - {line}");
    }
    Ok(())
}

fn run_goals(args: &GoalsArgs, json: bool) -> Result<(), String> {
    let goals = goals_from_args(&args.goals);
    let plan = plan_goals(&goals, args.current_sip, args.rate);
    if json {
        return print_json(&plan);
    }
    let rows = plan
        .goals
        .iter()
        .map(|progress| {
            vec![
                progress.goal.name.clone(),
                format_inr(progress.goal.amount),
                format!("{}", progress.goal.years),
                progress.goal.priority.as_str().to_string(),
                format_inr(progress.required_sip),
                format!("{:.0}%", progress.progress_percentage),
            ]
        })
        .collect();
    println!(
        "{}",
        grid_table(
            &["Goal", "Target", "Years", "Priority", "Required SIP", "Covered"],
            rows
        )
    );
    println!(
        "{}",
        key_value_table([
            ("Current SIP", format_inr(plan.current_sip)),
            ("Total required SIP", format_inr(plan.total_required_sip)),
            ("Shortfall", format_inr(plan.shortfall)),
            ("Surplus", format_inr(plan.surplus)),
        ])
    );
    Ok(())
}

fn run_advanced(args: AdvancedArgs, json: bool) -> Result<(), String> {
    let payload = AdvancedPayload {
        investment_amount: Some(args.sip.amount),
        sip_duration: Some(args.sip.years),
        annual_return: Some(args.sip.rate),
        inflation_rate: Some(args.inflation),
        tax_rate: Some(args.tax),
        step_up_rate: Some(args.step_up),
    };
    let analysis = super::build_advanced_response(&payload).map_err(|e| e.to_string())?;
    if json {
        return print_json(&analysis);
    }
    println!(
        "{}",
        key_value_table([
            (
                "Real value after inflation",
                format_inr(analysis.inflation.real_value)
            ),
            ("Inflation impact", format_inr(analysis.inflation.inflation_impact)),
            ("Tax on gains", format_inr(analysis.tax.tax_on_gains)),
            ("Net value after tax", format_inr(analysis.tax.net_returns)),
            (
                "Effective post-tax rate",
                format!("{:.2}%", analysis.tax.effective_rate)
            ),
            ("Step-up SIP value", format_inr(analysis.step_up.step_up_value)),
            (
                "Step-up benefit",
                format_inr(analysis.step_up.additional_benefit)
            ),
        ])
    );
    let scenarios = analysis
        .scenarios
        .iter()
        .map(|s| {
            let marker = if s.is_selected { " *" } else { "" };
            vec![
                format!("{}%{marker}", s.annual_return),
                format_inr(s.future_value),
            ]
        })
        .collect();
    println!("{}", grid_table(&["Return", "Maturity value"], scenarios));
    let instruments = analysis
        .instruments
        .iter()
        .map(|i| {
            vec![
                i.name.to_string(),
                format!("{}%", i.annual_return),
                i.risk.to_string(),
                i.liquidity.to_string(),
                format_inr(i.future_value),
            ]
        })
        .collect();
    println!(
        "{}",
        grid_table(
            &["Instrument", "Return", "Risk", "Liquidity", "Maturity value"],
            instruments
        )
    );
    Ok(())
}

fn build_cli_report(args: &ReportArgs, data_dir: PathBuf) -> Result<Report, String> {
    if let Some(id) = args.id {
        let book = ScenarioBook::open(JsonFileStore::new(data_dir));
        let saved = book
            .get(id)
            .ok_or_else(|| format!("No saved calculation with id {id}"))?;
        let kind = match args.kind {
            CliReportKind::Sip => super::ApiReportKind::Sip,
            CliReportKind::Swp => super::ApiReportKind::Swp,
            CliReportKind::Combined => super::ApiReportKind::Combined,
        };
        return super::build_saved_report(saved, kind).map_err(|e| e.to_string());
    }

    let generated_at = chrono::Utc::now();
    let override_swp = |base: SwpInputs| {
        super::overlay_swp(base, args.corpus, args.withdrawal, args.withdrawal_rate)
    };
    let report = match ReportKind::from(args.kind) {
        ReportKind::Sip => {
            let sip = calculate_sip(args.sip.into())?;
            Report::sip(&args.name, Some(&sip), generated_at)
        }
        ReportKind::Swp => {
            let swp = calculate_swp(override_swp(DEFAULT_SWP_INPUTS))?;
            Report::swp(&args.name, Some(&swp), generated_at)
        }
        ReportKind::Combined => {
            let sip = calculate_sip(args.sip.into())?;
            let swp = calculate_swp(override_swp(suggest_from_sip(&sip)))?;
            Report::combined(&args.name, Some(&sip), Some(&swp), generated_at)
        }
    };
    report.map_err(|e| e.to_string())
}

fn run_report(args: &ReportArgs, data_dir: PathBuf) -> Result<(), String> {
    let report = build_cli_report(args, data_dir)?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report.filename()));
    let pages = report.page_count();
    std::fs::write(&path, report.into_bytes())
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), pages, "wrote report");
    println!("Wrote {} ({pages} pages)", path.display());
    Ok(())
}

fn run_scenarios(action: ScenarioAction, data_dir: PathBuf, json: bool) -> Result<(), String> {
    let mut book = ScenarioBook::open(JsonFileStore::new(data_dir));
    match action {
        ScenarioAction::List => {
            let records = book.list();
            if json {
                return print_json(&records);
            }
            if records.is_empty() {
                println!("No saved calculations");
                return Ok(());
            }
            let rows = records
                .iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.name.clone(),
                        r.date.clone(),
                        format_inr(r.investment_amount),
                        format!("{} years", r.sip_duration),
                        format!("{}%", r.annual_return),
                        format_inr(r.result.future_value),
                    ]
                })
                .collect();
            println!(
                "{}",
                grid_table(
                    &["Id", "Name", "Date", "Monthly", "Duration", "Return", "Maturity"],
                    rows
                )
            );
        }
        ScenarioAction::Save { name, sip } => {
            let inputs: SipInputs = sip.into();
            let result = calculate_sip(inputs)?;
            let saved = book
                .append(&name, inputs, &result)
                .map_err(|e| e.to_string())?;
            if json {
                return print_json(&saved);
            }
            println!("Saved '{}' with id {}", saved.name, saved.id);
        }
        ScenarioAction::Show { id } => {
            let saved = book
                .get(id)
                .ok_or_else(|| format!("No saved calculation with id {id}"))?;
            if json {
                return print_json(saved);
            }
            println!("{} ({})", saved.name, saved.date);
            println!("{}", sip_summary_table(&saved.result));
        }
        ScenarioAction::Delete { id } => {
            let removed = book
                .remove(id)
                .ok_or_else(|| format!("No saved calculation with id {id}"))?;
            println!("Deleted '{}'", removed.name);
        }
        ScenarioAction::Clear => {
            let count = book.len();
            book.clear();
            println!("Cleared {count} saved calculations");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_goal_args() {
        let goal = parse_goal("Car:800000:4:high").expect("valid goal");
        assert_eq!(goal.name, "Car");
        assert_eq!(goal.priority, GoalPriority::High);

        let goal = parse_goal("Trip : 150000 : 1").expect("priority optional");
        assert_eq!(goal.name, "Trip");
        assert_eq!(goal.priority, GoalPriority::Medium);
    }

    #[test]
    fn rejects_malformed_goal_args() {
        assert!(parse_goal("Car:800000").is_err());
        assert!(parse_goal("Car:lots:4").is_err());
        assert!(parse_goal("Car:800000:4:urgent").is_err());
        let err = parse_goal(":800000:4").expect_err("blank name");
        assert!(err.contains("Goal name is required"));
    }

    #[test]
    fn empty_goal_list_uses_defaults() {
        assert_eq!(goals_from_args(&[]).len(), 4);
        let args = [parse_goal("Bike:120000:2").expect("valid goal")];
        let goals = goals_from_args(&args);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, 1);
    }

    #[test]
    fn cli_defaults_match_calculator_defaults() {
        let cli = Cli::try_parse_from(["sipcalc", "sip"]).expect("valid args");
        let Command::Sip(args) = cli.command else {
            panic!("expected sip command");
        };
        assert_eq!(SipInputs::from(args), DEFAULT_SIP_INPUTS);
        assert_eq!(cli.data_dir, PathBuf::from(".sipcalc"));
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sipcalc", "goals", "--goal", "Car:800000:4", "--goal", "Home:5000000:10:high",
            "--json",
        ])
        .expect("valid args");
        assert!(cli.json);
        let Command::Goals(args) = cli.command else {
            panic!("expected goals command");
        };
        assert_eq!(args.goals.len(), 2);
    }

    #[test]
    fn report_writes_named_file() {
        let dir = tempdir().expect("tempdir");
        let output = dir.path().join("plan.txt");
        let cli = Cli::try_parse_from([
            "sipcalc",
            "report",
            "--kind",
            "combined",
            "--name",
            "Family Plan",
            "--output",
            output.to_str().expect("utf-8 path"),
        ])
        .expect("valid args");
        let Command::Report(args) = cli.command else {
            panic!("expected report command");
        };
        run_report(&args, dir.path().to_path_buf()).expect("report written");
        let text = std::fs::read_to_string(&output).expect("readable");
        assert!(text.contains("COMPLETE INVESTMENT JOURNEY"));
        assert!(text.contains("Family Plan"));
    }

    #[test]
    fn saved_scenario_report_round_trip() {
        let dir = tempdir().expect("tempdir");
        run_scenarios(
            ScenarioAction::Save {
                name: "Retirement".to_string(),
                sip: SipArgs {
                    amount: 10_000.0,
                    years: 20.0,
                    rate: 12.0,
                },
            },
            dir.path().to_path_buf(),
            false,
        )
        .expect("saved");

        let book = ScenarioBook::open(JsonFileStore::new(dir.path()));
        let id = book.list()[0].id;
        let args = ReportArgs {
            kind: CliReportKind::Sip,
            name: String::new(),
            sip: SipArgs {
                amount: 1.0,
                years: 1.0,
                rate: 1.0,
            },
            corpus: None,
            withdrawal: None,
            withdrawal_rate: None,
            id: Some(id),
            output: None,
        };
        let report = build_cli_report(&args, dir.path().to_path_buf()).expect("report");
        assert_eq!(report.name(), "Retirement");
        assert_eq!(report.filename(), "retirement-sip-report.txt");
    }

    #[test]
    fn invalid_inputs_surface_field_messages() {
        let err = calculate_sip(SipInputs::new(50.0, 15.0, 12.0)).expect_err("too small");
        assert!(err.contains("Minimum investment amount is ₹100"));
    }
}
