use clap::{Parser, ValueEnum};
use kiospay::catalog::{CatalogBox, MockCatalog};
use kiospay::error::Result as PaymentResult;
use kiospay::ledger::Ledger;
use kiospay::orchestrator::Orchestrator;
use kiospay::reader::{RequestReader, RequestRecord};
use kiospay::schema;
use kiospay::surface::StderrSurface;
use kiospay::transaction::Receipt;
use kiospay::writer::{self, ReceiptWriter};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input requests CSV file
    input: PathBuf,

    /// Opening ledger balance
    #[arg(long, default_value = "5000000")]
    balance: Decimal,

    /// Receipt output format
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ledger = Ledger::new(cli.balance);
    let catalog: CatalogBox = Box::new(MockCatalog::new());
    let mut orchestrator =
        Orchestrator::new(catalog, ledger.clone()).with_surface(Box::new(StderrSurface));

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = RequestReader::new(file);

    let stdout = io::stdout();
    let mut csv_out = match cli.format {
        Format::Csv => Some(ReceiptWriter::new(stdout.lock())),
        Format::Json => None,
    };

    for record in reader.requests() {
        match record {
            Ok(record) => match run_record(&mut orchestrator, &record).await {
                Ok(receipt) => {
                    let written = match &mut csv_out {
                        Some(writer) => writer.write(&receipt),
                        None => writer::write_json(&mut io::stdout().lock(), &receipt),
                    };
                    written.into_diagnostic()?;
                }
                Err(e) => eprintln!("Error processing request: {e}"),
            },
            Err(e) => eprintln!("Error reading request: {e}"),
        }
    }
    if let Some(writer) = &mut csv_out {
        writer.flush().into_diagnostic()?;
    }

    let state = ledger.snapshot().await;
    eprintln!(
        "balance: {} | main balance: {} | commission today: {} | settled today: {}",
        state.balance.0, state.main_balance.0, state.commission.today.0, state.stats.today
    );

    Ok(())
}

/// Maps one batch row onto the interactive flow: fill the form, submit,
/// auto-confirm, settle.
async fn run_record(
    orchestrator: &mut Orchestrator,
    record: &RequestRecord,
) -> PaymentResult<Receipt> {
    orchestrator.begin(record.category)?;

    if let Some(provider) = &record.provider {
        orchestrator.set_field("provider", provider)?;
    }
    if let Some(destination) = &record.destination {
        orchestrator.set_field("destination", destination)?;
    }
    if let Some(region) = &record.region {
        orchestrator.set_field("region", region)?;
    }
    if let Some(bank) = &record.bank {
        orchestrator.set_field("bank_name", bank)?;
    }
    if let Some(account) = &record.account {
        orchestrator.set_field("account_number", account)?;
    }
    if let Some(zone) = &record.zone {
        let field = match record.provider.as_deref() {
            Some("genshin") => "server_id",
            _ => "zone_id",
        };
        orchestrator.set_field(field, zone)?;
    }
    if let Some(target) = &record.target {
        let variant = record
            .provider
            .as_deref()
            .or(record.destination.as_deref());
        orchestrator.set_field(schema::primary_field(record.category, variant), target)?;
    }
    if let Some(product) = &record.product {
        orchestrator.select_product(product)?;
    }
    if let Some(amount) = record.amount {
        orchestrator.set_amount(amount)?;
    }

    orchestrator.submit().await?;
    orchestrator.execute().await
}
