//! Paginated plain-text reports for SIP, SWP and combined plans.
//!
//! A report is assembled from titled blocks and tables, split into pages of
//! [`PAGE_LINES`] lines, and every page ends with the same footer layout:
//! generation timestamp, `Page i of N` and the report tagline. Pages are
//! separated by form feeds.

mod format;
mod insights;

use chrono::{DateTime, Utc};
use tabled::Table;
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;

use crate::core::{CorpusHealth, SipResult, SwpResult, withdrawal_schedule};

pub use format::{format_inr, format_lakhs, format_rs};
pub use insights::{
    JourneyInsights, SipInsights, SwpInsights, WithdrawalTimeline, journey_insights, sip_insights,
    swp_insights, withdrawal_timeline,
};

/// Total lines on a page, footer included.
pub const PAGE_LINES: usize = 60;
const FOOTER_LINES: usize = 3;
const RULE_WIDTH: usize = 78;
const PAGE_BREAK: char = '\u{000C}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("No {0} calculation data available for report generation")]
    MissingData(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sip,
    Swp,
    Combined,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Sip => "SIP INVESTMENT REPORT",
            ReportKind::Swp => "SWP WITHDRAWAL REPORT",
            ReportKind::Combined => "COMPLETE INVESTMENT JOURNEY",
        }
    }

    pub fn tagline(self) -> &'static str {
        match self {
            ReportKind::Sip => "SIP Calculator - Building Your Financial Future",
            ReportKind::Swp => "SWP Calculator - Managing Your Withdrawal Strategy",
            ReportKind::Combined => "Complete Investment Journey - SIP to SWP Transition",
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            ReportKind::Sip => "SIP Investment Plan",
            ReportKind::Swp => "SWP Withdrawal Plan",
            ReportKind::Combined => "Complete Investment Plan",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::Sip => "sip",
            ReportKind::Swp => "swp",
            ReportKind::Combined => "complete-journey",
        }
    }
}

/// `"My Plan"` becomes `my-plan-sip-report.txt`. Only ASCII letters, digits
/// and single dashes survive, so the result never names another directory.
pub fn report_filename(name: &str, kind: ReportKind) -> String {
    let slug = match slugify(name) {
        slug if slug.is_empty() => slugify(kind.default_name()),
        slug => slug,
    };
    format!("{slug}-{}-report.txt", kind.slug())
}

fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_ascii_lowercase()
}

enum Block {
    Lines(Vec<String>),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone)]
pub struct Report {
    kind: ReportKind,
    name: String,
    generated_at: DateTime<Utc>,
    pages: Vec<Vec<String>>,
}

impl Report {
    pub fn sip(
        name: &str,
        sip: Option<&SipResult>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        let sip = sip.ok_or(ReportError::MissingData("SIP"))?;
        let mut blocks = vec![section("INVESTMENT SUMMARY"), summary_table(sip_summary(sip))];
        blocks.push(section("COMPLETE YEAR-WISE GROWTH ANALYSIS"));
        blocks.push(sip_year_table(sip));
        blocks.push(section("COMPREHENSIVE INVESTMENT INSIGHTS"));
        blocks.push(bullets(sip_insights(sip).lines()));
        Ok(Self::assemble(ReportKind::Sip, name, generated_at, blocks))
    }

    pub fn swp(
        name: &str,
        swp: Option<&SwpResult>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        let swp = swp.ok_or(ReportError::MissingData("SWP"))?;
        let blocks = vec![
            section("WITHDRAWAL SUMMARY"),
            summary_table(swp_summary(swp, "Initial Corpus:")),
            section("YEAR-WISE WITHDRAWAL SCHEDULE"),
            swp_year_table(swp),
            section("COMPREHENSIVE WITHDRAWAL INSIGHTS"),
            bullets(swp_insights(swp).lines()),
            section("WITHDRAWAL TIMELINE"),
            bullets(withdrawal_timeline(swp).lines()),
        ];
        Ok(Self::assemble(ReportKind::Swp, name, generated_at, blocks))
    }

    pub fn combined(
        name: &str,
        sip: Option<&SipResult>,
        swp: Option<&SwpResult>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        let sip = sip.ok_or(ReportError::MissingData("SIP"))?;
        let swp = swp.ok_or(ReportError::MissingData("SWP"))?;
        let journey = journey_insights(sip, swp);
        let mut cash_flow = vec![
            format!("Monthly Investment (SIP Phase): {}", format_rs(sip.investment_amount)),
            format!("Monthly Withdrawal (SWP Phase): {}", format_rs(swp.monthly_withdrawal)),
        ];
        cash_flow.extend(journey.cash_flow_lines());

        let mut sip_items = sip_summary(sip);
        sip_items.truncate(6);
        let blocks = vec![
            section("PHASE 1: WEALTH ACCUMULATION (SIP)"),
            summary_table(sip_items),
            section("PHASE 2: WEALTH DISTRIBUTION (SWP)"),
            summary_table(swp_summary(swp, "Initial Corpus (from SIP):")),
            section("COMPLETE INVESTMENT JOURNEY ANALYSIS"),
            bullets(journey.journey_lines()),
            section("MONTHLY CASH FLOW ANALYSIS"),
            bullets(cash_flow),
            section("SIP YEAR-WISE GROWTH"),
            sip_year_table(sip),
            section("SWP YEAR-WISE SCHEDULE"),
            swp_year_table(swp),
        ];
        Ok(Self::assemble(ReportKind::Combined, name, generated_at, blocks))
    }

    fn assemble(
        kind: ReportKind,
        name: &str,
        generated_at: DateTime<Utc>,
        blocks: Vec<Block>,
    ) -> Self {
        let name = match name.trim() {
            "" => kind.default_name().to_string(),
            trimmed => trimmed.to_string(),
        };
        let mut pager = Pager::new(PAGE_LINES - FOOTER_LINES);
        pager.push_lines(vec![
            "=".repeat(RULE_WIDTH),
            center(kind.title()),
            center(&name),
            "=".repeat(RULE_WIDTH),
        ]);
        for block in blocks {
            match block {
                Block::Lines(lines) => pager.push_lines(lines),
                Block::Table { header, rows } => pager.push_table(&header, &rows),
            }
        }
        Self {
            kind,
            name,
            generated_at,
            pages: pager.finish(),
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn filename(&self) -> String {
        report_filename(&self.name, self.kind)
    }

    /// Each page padded to [`PAGE_LINES`] lines with its footer attached.
    pub fn pages(&self) -> Vec<String> {
        let total = self.pages.len();
        let stamp = self
            .generated_at
            .format("Generated on %d/%m/%Y at %H:%M:%S UTC")
            .to_string();
        self.pages
            .iter()
            .enumerate()
            .map(|(index, body)| {
                let mut lines = body.clone();
                lines.resize(PAGE_LINES - FOOTER_LINES, String::new());
                let page_label = format!("Page {} of {total}", index + 1);
                let gap = RULE_WIDTH.saturating_sub(stamp.chars().count() + page_label.len());
                lines.push("-".repeat(RULE_WIDTH));
                lines.push(format!("{stamp}{}{page_label}", " ".repeat(gap.max(1))));
                lines.push(center(self.kind.tagline()));
                lines.join("\n")
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = self.pages().join(&format!("\n{PAGE_BREAK}"));
        out.push('\n');
        out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.render().into_bytes()
    }
}

struct Pager {
    height: usize,
    pages: Vec<Vec<String>>,
    current: Vec<String>,
}

impl Pager {
    fn new(height: usize) -> Self {
        Self {
            height,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    fn remaining(&self) -> usize {
        self.height - self.current.len()
    }

    fn break_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }
    }

    /// Keeps a block together when it fits on a fresh page.
    fn push_lines(&mut self, lines: Vec<String>) {
        if lines.len() > self.remaining() && lines.len() <= self.height {
            self.break_page();
        }
        for line in lines {
            if self.remaining() == 0 {
                self.break_page();
            }
            self.current.push(line);
        }
    }

    /// Splits the rows across pages, repeating the header on each part.
    fn push_table(&mut self, header: &[String], rows: &[Vec<String>]) {
        let mut rest = rows;
        loop {
            let mut take = rest.len();
            while take > 0 && line_count(&render_table(header, &rest[..take])) > self.remaining() {
                take -= 1;
            }
            let fits = take > 0
                || (rest.is_empty() && line_count(&render_table(header, rest)) <= self.remaining());
            if !fits {
                if !self.current.is_empty() {
                    self.break_page();
                    continue;
                }
                // A single row taller than a page; emit it regardless.
                take = rest.len().min(1);
            }
            let rendered = render_table(header, &rest[..take]);
            self.current.extend(rendered.lines().map(str::to_string));
            rest = &rest[take..];
            if rest.is_empty() {
                break;
            }
            self.break_page();
        }
        if self.remaining() > 0 {
            self.current.push(String::new());
        }
    }

    fn finish(mut self) -> Vec<Vec<String>> {
        self.break_page();
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        self.pages
    }
}

fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().map(String::as_str));
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    let mut table = Table::from(builder);
    table.with(Style::psql());
    table.to_string()
}

fn line_count(rendered: &str) -> usize {
    rendered.lines().count()
}

fn center(text: &str) -> String {
    let width = text.chars().count();
    let pad = RULE_WIDTH.saturating_sub(width) / 2;
    format!("{}{text}", " ".repeat(pad))
}

fn section(heading: &str) -> Block {
    Block::Lines(vec![
        String::new(),
        heading.to_string(),
        "-".repeat(heading.chars().count()),
    ])
}

fn bullets(lines: Vec<String>) -> Block {
    let mut out: Vec<String> = lines.into_iter().map(|line| format!("  * {line}")).collect();
    out.push(String::new());
    Block::Lines(out)
}

fn summary_table(items: Vec<(&'static str, String)>) -> Block {
    Block::Table {
        header: vec!["Item".to_string(), "Value".to_string()],
        rows: items
            .into_iter()
            .map(|(label, value)| vec![label.to_string(), value])
            .collect(),
    }
}

fn sip_summary(sip: &SipResult) -> Vec<(&'static str, String)> {
    vec![
        ("Monthly Investment:", format_rs(sip.investment_amount)),
        ("Investment Period:", format!("{} years", sip.sip_duration)),
        ("Expected Return:", format!("{}%", sip.annual_return)),
        ("Total Investment:", format_rs(sip.total_investment)),
        ("Maturity Value:", format_rs(sip.future_value)),
        ("Total Returns:", format_rs(sip.total_gains)),
        ("Wealth Multiplier:", format!("{:.2}x", sip.wealth_multiplier)),
    ]
}

fn swp_summary(swp: &SwpResult, corpus_label: &'static str) -> Vec<(&'static str, String)> {
    let sustainability = if swp.is_sustainable {
        "Sustainable"
    } else {
        "Limited Duration"
    };
    vec![
        (corpus_label, format_rs(swp.total_investment)),
        ("Monthly Withdrawal:", format_rs(swp.monthly_withdrawal)),
        ("Expected Return:", format!("{}%", swp.annual_return)),
        ("Withdrawal Period:", format!("{:.1} years", swp.years_lasting)),
        ("Total Withdrawals:", format_rs(swp.total_withdrawn)),
        ("Remaining Corpus:", format_rs(swp.remaining_value)),
        ("Sustainability:", sustainability.to_string()),
    ]
}

fn sip_year_table(sip: &SipResult) -> Block {
    let header = ["Year", "Investment", "Portfolio Value", "Returns", "Return %"];
    Block::Table {
        header: header.iter().map(|h| h.to_string()).collect(),
        rows: sip
            .yearly_data
            .iter()
            .map(|point| {
                let return_percent = if point.investment > 0.0 {
                    point.returns / point.investment * 100.0
                } else {
                    0.0
                };
                vec![
                    point.year.to_string(),
                    format_rs(point.investment),
                    format_rs(point.value),
                    format_rs(point.returns),
                    format!("{return_percent:.1}%"),
                ]
            })
            .collect(),
    }
}

fn swp_year_table(swp: &SwpResult) -> Block {
    let header = ["Year", "Corpus Remaining", "Total Withdrawn", "Corpus %", "Status"];
    Block::Table {
        header: header.iter().map(|h| h.to_string()).collect(),
        rows: withdrawal_schedule(&swp.inputs())
            .iter()
            .map(|year| {
                let status = match year.health {
                    CorpusHealth::Healthy => "Healthy",
                    CorpusHealth::Low => "Low",
                    CorpusHealth::Critical => "Critical",
                };
                vec![
                    year.year.to_string(),
                    format_rs(year.remaining_value),
                    format_rs(year.total_withdrawn),
                    format!("{:.1}%", year.corpus_percentage),
                    status.to_string(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SipInputs, SwpInputs, calculate_sip_at, simulate_withdrawal};
    use chrono::TimeZone;

    fn generated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 5)
            .single()
            .expect("valid timestamp")
    }

    fn sip(years: f64) -> SipResult {
        calculate_sip_at(&SipInputs::new(5_000.0, years, 12.0), generated()).expect("valid")
    }

    fn swp(withdrawal: f64) -> SwpResult {
        simulate_withdrawal(&SwpInputs::new(1_000_000.0, withdrawal, 12.0)).expect("valid")
    }

    #[test]
    fn missing_results_are_reported() {
        let err = Report::sip("Plan", None, generated()).expect_err("no data");
        assert_eq!(err, ReportError::MissingData("SIP"));
        let sip = sip(15.0);
        let err = Report::combined("Plan", Some(&sip), None, generated()).expect_err("no swp");
        assert_eq!(err, ReportError::MissingData("SWP"));
    }

    #[test]
    fn sip_report_has_title_summary_and_full_table() {
        let sip = sip(15.0);
        let report = Report::sip("Retirement Fund", Some(&sip), generated()).expect("report");
        let text = report.render();

        assert!(text.contains("SIP INVESTMENT REPORT"));
        assert!(text.contains("Retirement Fund"));
        assert!(text.contains("Maturity Value:"));
        assert!(text.contains(&format_rs(sip.future_value)));
        assert!(text.contains("Investment doubles in approximately 6.1 years"));
        for year in 1..=15 {
            assert!(
                text.lines().any(|line| line.trim_start().starts_with(&format!("{year} "))),
                "year {year} missing"
            );
        }
    }

    #[test]
    fn every_page_carries_a_footer() {
        let sip = sip(50.0);
        let report = Report::sip("Long Horizon", Some(&sip), generated()).expect("report");
        assert!(report.page_count() >= 2);

        let pages = report.pages();
        let total = pages.len();
        for (index, page) in pages.iter().enumerate() {
            assert_eq!(page.lines().count(), PAGE_LINES);
            assert!(page.contains("Generated on 14/03/2026 at 09:30:05 UTC"));
            assert!(page.contains(&format!("Page {} of {total}", index + 1)));
            assert!(page.contains("SIP Calculator - Building Your Financial Future"));
        }
        assert_eq!(report.render().matches(PAGE_BREAK).count(), total - 1);
    }

    #[test]
    fn long_tables_repeat_their_header() {
        let sip = sip(50.0);
        let report = Report::sip("Long Horizon", Some(&sip), generated()).expect("report");
        let headed = report
            .pages()
            .iter()
            .filter(|page| page.contains("Portfolio Value"))
            .count();
        assert!(headed >= 2);
        assert!(report.render().lines().any(|l| l.trim_start().starts_with("50 ")));
    }

    #[test]
    fn swp_report_lists_every_year_beyond_display_cap() {
        let swp = swp(8_000.0);
        assert_eq!(swp.yearly_data.len(), 30);
        let report = Report::swp("", Some(&swp), generated()).expect("report");
        let text = report.render();

        assert_eq!(report.name(), "SWP Withdrawal Plan");
        assert!(text.contains("SWP WITHDRAWAL REPORT"));
        assert!(text.contains("Limited Duration"));
        assert!(text.contains("Consider reducing withdrawal amount"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("50 ")));
        assert!(text.contains("SWP Calculator - Managing Your Withdrawal Strategy"));
    }

    #[test]
    fn combined_report_covers_both_phases() {
        let sip = sip(15.0);
        let swp = simulate_withdrawal(&SwpInputs::new(sip.future_value, 20_000.0, 12.0))
            .expect("valid");
        let report =
            Report::combined("Family Plan", Some(&sip), Some(&swp), generated()).expect("report");
        let text = report.render();

        assert!(text.contains("COMPLETE INVESTMENT JOURNEY"));
        assert!(text.contains("PHASE 1: WEALTH ACCUMULATION (SIP)"));
        assert!(text.contains("Initial Corpus (from SIP):"));
        assert!(text.contains("Cash Flow Ratio: 4.00x"));
        assert!(text.contains("Complete Investment Journey - SIP to SWP Transition"));
    }

    #[test]
    fn filenames_slug_the_display_name() {
        assert_eq!(
            report_filename("My  Retirement Plan", ReportKind::Sip),
            "my-retirement-plan-sip-report.txt"
        );
        assert_eq!(report_filename("  ", ReportKind::Swp), "swp-withdrawal-plan-swp-report.txt");
        let sip = sip(10.0);
        let report = Report::sip("Kids", Some(&sip), generated()).expect("report");
        assert_eq!(report.filename(), "kids-sip-report.txt");
        assert!(report.into_bytes().starts_with(b"="));
    }

    #[test]
    fn filenames_stay_in_the_working_directory() {
        assert_eq!(
            report_filename("../../escape", ReportKind::Sip),
            "escape-sip-report.txt"
        );
        assert_eq!(
            report_filename("/tmp/abs", ReportKind::Swp),
            "tmp-abs-swp-report.txt"
        );
        assert_eq!(
            report_filename("..\\..", ReportKind::Combined),
            "complete-investment-plan-complete-journey-report.txt"
        );
        assert_eq!(
            report_filename("  Kids' College Fund ", ReportKind::Sip),
            "kids-college-fund-sip-report.txt"
        );
        for name in ["../../x", "/tmp/x", "a/../b", "C:\\x"] {
            let file = report_filename(name, ReportKind::Sip);
            assert!(!file.contains('/') && !file.contains('\\'), "{file}");
            assert!(!file.contains(".."), "{file}");
        }
    }
}
