use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use paye_core::{CalculatorFactory, PayFrequency, TaxCalculationInput, TaxCalculationResult, TaxCode};
use paye_data::BandLoader;
use rust_decimal::Decimal;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// PAYE income tax calculator.
///
/// Loads annual bands from a CSV file, builds a calculator for the pay
/// date and period, and prints how the tax due was reached.
#[derive(Debug, Parser)]
#[command(name = "paye-calc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// CSV file of annual bands
    /// (tax_year,regime,description,rate,cumulative_bandwidth,is_top_band).
    #[arg(long)]
    bands: PathBuf,

    /// Employee tax code, e.g. `1257L`, `S1257L M1`, `K475`, `BR`.
    #[arg(long)]
    tax_code: TaxCode,

    /// Date of payment (YYYY-MM-DD); selects the tax year.
    #[arg(long)]
    pay_date: NaiveDate,

    /// Pay frequency.
    #[arg(long, default_value = "monthly", value_parser = parse_frequency)]
    frequency: PayFrequency,

    /// Tax period within the year, starting at 1.
    #[arg(long)]
    period: u32,

    /// Taxable pay in this period, including benefits in kind.
    #[arg(long)]
    salary: Decimal,

    /// Benefits in kind payrolled in this period.
    #[arg(long, default_value = "0")]
    benefits_in_kind: Decimal,

    /// Taxable pay in earlier periods of the tax year.
    #[arg(long, default_value = "0")]
    taxable_ytd: Decimal,

    /// Tax paid in earlier periods of the tax year.
    #[arg(long, default_value = "0")]
    tax_paid_ytd: Decimal,

    /// Tax left unpaid by the regulatory limit last period.
    #[arg(long, default_value = "0")]
    unpaid_carried: Decimal,

    /// Log filter, e.g. `debug` or `paye_core=trace`. Overrides `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_frequency(s: &str) -> Result<PayFrequency, String> {
    PayFrequency::parse(s).ok_or_else(|| format!("unknown pay frequency '{s}'"))
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * `--log-level` wins, then `RUST_LOG`, then `info`.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing(log_level: Option<&str>) {
    let filter = log_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

// ─── output ──────────────────────────────────────────────────────────────────

fn print_result(result: &TaxCalculationResult) {
    println!(
        "{} {} {} period {}",
        result.regime, result.tax_year, result.pay_frequency, result.tax_period
    );
    println!("Tax code:                    {}", result.tax_code);
    println!("Tax-free pay to period end:  {}", result.tax_free_pay_to_end_of_period);
    println!("Taxable pay after allowance: {}", result.taxable_salary_after_allowance);
    if let Some(index) = result.highest_band_index {
        println!("Highest band:                {index}");
        println!("Income at highest band:      {}", result.income_at_highest_band);
        println!("Tax at highest band:         {}", result.tax_at_highest_band);
    }
    println!("Tax before regulatory limit: {}", result.tax_due_before_regulatory_limit);
    println!("Tax due:                     {}", result.tax_due);
    if result.regulatory_limit_applied {
        println!(
            "Carried forward:             {}",
            result.tax_unpaid_due_to_regulatory_limit
        );
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let file = File::open(&cli.bands)
        .with_context(|| format!("Failed to open: {}", cli.bands.display()))?;
    let records = BandLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", cli.bands.display()))?;
    debug!("parsed {} band records", records.len());

    let repository = BandLoader::load(&records).context("Failed to build band sets")?;
    info!("loaded {} band sets", repository.len());

    let factory = CalculatorFactory::new(Arc::new(repository));
    let calculator = factory
        .create(cli.tax_code.regime(), cli.pay_date, cli.frequency, cli.period)
        .await
        .with_context(|| format!("Failed to create calculator for {}", cli.pay_date))?;

    let input = TaxCalculationInput {
        total_taxable_salary_in_period: cli.salary,
        benefits_in_kind_in_period: cli.benefits_in_kind,
        tax_code: cli.tax_code,
        taxable_salary_ytd: cli.taxable_ytd,
        tax_paid_ytd: cli.tax_paid_ytd,
        tax_unpaid_due_to_regulatory_limit: cli.unpaid_carried,
    };
    let result = calculator
        .calculate(&input)
        .context("Tax calculation failed")?;

    print_result(&result);

    Ok(())
}
