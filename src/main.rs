use brokerdesk::application::accounts::AccountService;
use brokerdesk::application::comparator::PolicyComparator;
use brokerdesk::application::content::ContentAgent;
use brokerdesk::application::ledger::{ImportReport, LedgerService};
use brokerdesk::application::settlement::SettlementService;
use brokerdesk::config::Config;
use brokerdesk::domain::commission::{CommissionDraft, PaymentFrequency, PolicyStatus};
use brokerdesk::domain::content::Platform;
use brokerdesk::domain::insurer::Insurer;
use brokerdesk::domain::money::{Money, Percentage};
use brokerdesk::domain::ports::{CommissionStore, InsurerStore, UserStore};
use brokerdesk::domain::settlement::SettlementWindow;
use brokerdesk::domain::user::Role;
use brokerdesk::error::PortalError;
use brokerdesk::infrastructure::anthropic::AnthropicClient;
use brokerdesk::infrastructure::in_memory::{
    InMemoryCommissionStore, InMemoryInsurerStore, InMemoryUserStore,
};
use brokerdesk::infrastructure::pdf;
#[cfg(feature = "storage-rocksdb")]
use brokerdesk::infrastructure::rocksdb::RocksDBStore;
use brokerdesk::infrastructure::web::HttpFetcher;
use brokerdesk::interfaces::columns::{parse_date, parse_money, parse_percentage};
use brokerdesk::interfaces::csv::commission_reader::CommissionReader;
use brokerdesk::interfaces::csv::commission_writer::CommissionWriter;
use brokerdesk::interfaces::csv::comparison_writer::ComparisonWriter;
use brokerdesk::interfaces::xlsx::is_workbook;
use brokerdesk::interfaces::xlsx::workbook_reader::WorkbookReader;
use brokerdesk::interfaces::xlsx::workbook_writer::WorkbookWriter;
use brokerdesk::logging;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage insurers
    #[command(subcommand)]
    Insurer(InsurerCommand),
    /// Manage individual commission records
    #[command(subcommand)]
    Record(RecordCommand),
    /// Import a commissions spreadsheet (CSV, XLSX, XLS or ODS) into an insurer's ledger
    Import {
        #[arg(long)]
        insurer: String,
        file: PathBuf,
    },
    /// Write an insurer's ledger as CSV to stdout, or to a file
    Export {
        #[arg(long)]
        insurer: String,
        /// Output file; a `.xlsx` extension writes a workbook
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Generate a settlement report for a date window
    Settle {
        #[arg(long)]
        insurer: String,
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
        /// Spreadsheet to import before settling; creates the insurer if needed
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output file; a `.xlsx` extension writes a workbook
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Compare coverages of policy PDFs side by side
    Compare {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Merge PDF files, in the order given, into one document
    Merge {
        #[arg(long, short)]
        output: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write social media posts about a web page
    Content {
        url: String,
        #[arg(long, default_value = "instagram")]
        platform: Platform,
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
    /// Manage users and passwords
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand)]
enum InsurerCommand {
    Add { name: String },
    List,
    /// Removes the insurer and all its commission records
    Remove { name: String },
}

#[derive(Subcommand)]
enum RecordCommand {
    Add {
        #[arg(long)]
        insurer: String,
        #[command(flatten)]
        fields: DraftArgs,
    },
    /// Replace the given fields; reconciliation figures are recomputed
    Edit {
        id: Uuid,
        #[command(flatten)]
        changes: DraftChanges,
    },
    Show { id: Uuid },
    Remove { id: Uuid },
}

#[derive(Subcommand)]
enum UserCommand {
    Add {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "broker")]
        role: Role,
        #[arg(long, env = "BROKERDESK_PASSWORD")]
        password: String,
    },
    List,
    Remove { email: String },
    Login {
        email: String,
        #[arg(long, env = "BROKERDESK_PASSWORD")]
        password: String,
    },
    /// Issue a single-use password reset token
    RequestReset { email: String },
    Reset {
        token: Uuid,
        #[arg(long, env = "BROKERDESK_PASSWORD")]
        password: String,
    },
}

#[derive(Args)]
struct DraftArgs {
    #[arg(long)]
    client: String,
    #[arg(long, default_value = "ALTA")]
    status: PolicyStatus,
    #[arg(long, default_value = "ANUAL")]
    frequency: PaymentFrequency,
    #[arg(long)]
    policy: String,
    #[arg(long, value_parser = parse_date)]
    effective_date: NaiveDate,
    #[arg(long, value_parser = parse_money, default_value = "0")]
    payout: Money,
    #[arg(long, default_value = "")]
    product: String,
    #[arg(long, value_parser = parse_money)]
    net_premium: Money,
    #[arg(long, value_parser = parse_money)]
    total_premium: Money,
    #[arg(long, value_parser = parse_percentage)]
    pct: Percentage,
    #[arg(long, value_parser = parse_money)]
    net_commission: Money,
    #[arg(long, value_parser = parse_money)]
    amount_to_settle: Money,
}

impl From<DraftArgs> for CommissionDraft {
    fn from(args: DraftArgs) -> Self {
        CommissionDraft {
            client_name: args.client,
            status: args.status,
            frequency: args.frequency,
            policy_number: args.policy,
            effective_date: args.effective_date,
            insurer_payout: args.payout,
            product: args.product,
            net_premium: args.net_premium,
            total_premium: args.total_premium,
            commission_pct: args.pct,
            net_commission: args.net_commission,
            amount_to_settle: args.amount_to_settle,
        }
    }
}

#[derive(Args)]
struct DraftChanges {
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    status: Option<PolicyStatus>,
    #[arg(long)]
    frequency: Option<PaymentFrequency>,
    #[arg(long)]
    policy: Option<String>,
    #[arg(long, value_parser = parse_date)]
    effective_date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_money)]
    payout: Option<Money>,
    #[arg(long)]
    product: Option<String>,
    #[arg(long, value_parser = parse_money)]
    net_premium: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    total_premium: Option<Money>,
    #[arg(long, value_parser = parse_percentage)]
    pct: Option<Percentage>,
    #[arg(long, value_parser = parse_money)]
    net_commission: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    amount_to_settle: Option<Money>,
}

impl DraftChanges {
    fn apply(self, draft: CommissionDraft) -> CommissionDraft {
        CommissionDraft {
            client_name: self.client.unwrap_or(draft.client_name),
            status: self.status.unwrap_or(draft.status),
            frequency: self.frequency.unwrap_or(draft.frequency),
            policy_number: self.policy.unwrap_or(draft.policy_number),
            effective_date: self.effective_date.unwrap_or(draft.effective_date),
            insurer_payout: self.payout.unwrap_or(draft.insurer_payout),
            product: self.product.unwrap_or(draft.product),
            net_premium: self.net_premium.unwrap_or(draft.net_premium),
            total_premium: self.total_premium.unwrap_or(draft.total_premium),
            commission_pct: self.pct.unwrap_or(draft.commission_pct),
            net_commission: self.net_commission.unwrap_or(draft.net_commission),
            amount_to_settle: self.amount_to_settle.unwrap_or(draft.amount_to_settle),
        }
    }
}

struct Services {
    ledger: LedgerService,
    settlement: SettlementService,
    accounts: AccountService,
}

impl Services {
    fn wire<I, C, U>(insurers: I, commissions: C, users: U) -> Self
    where
        I: InsurerStore + Clone + 'static,
        C: CommissionStore + Clone + 'static,
        U: UserStore + 'static,
    {
        Self {
            ledger: LedgerService::new(Box::new(insurers.clone()), Box::new(commissions.clone())),
            settlement: SettlementService::new(Box::new(insurers), Box::new(commissions)),
            accounts: AccountService::new(Box::new(users)),
        }
    }

    fn open(db_path: Option<PathBuf>) -> Result<Self> {
        #[cfg(feature = "storage-rocksdb")]
        if let Some(db_path) = db_path {
            // Use persistent storage (RocksDB)
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            return Ok(Self::wire(store.clone(), store.clone(), store));
        }

        #[cfg(not(feature = "storage-rocksdb"))]
        if db_path.is_some() {
            tracing::warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }

        Ok(Self::wire(
            InMemoryInsurerStore::new(),
            InMemoryCommissionStore::new(),
            InMemoryUserStore::new(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().into_diagnostic()?;
    logging::init(&config.log_filter, cli.verbose);

    let services = Services::open(cli.db_path)?;
    run(cli.command, &services, &config).await
}

async fn run(command: Command, services: &Services, config: &Config) -> Result<()> {
    let ledger = &services.ledger;
    match command {
        Command::Insurer(InsurerCommand::Add { name }) => {
            let insurer = ledger.add_insurer(&name).await.into_diagnostic()?;
            println!("{}\t{}", insurer.id, insurer.name);
        }
        Command::Insurer(InsurerCommand::List) => {
            for insurer in ledger.list_insurers().await.into_diagnostic()? {
                println!("{}\t{}", insurer.id, insurer.name);
            }
        }
        Command::Insurer(InsurerCommand::Remove { name }) => {
            let removed = ledger.remove_insurer(&name).await.into_diagnostic()?;
            println!("Removed '{}' and {removed} commission records", name.trim());
        }
        Command::Record(command) => run_record(command, ledger).await?,
        Command::Import { insurer, file } => {
            let insurer = ledger.insurer_named(&insurer).await.into_diagnostic()?;
            let report = import_file(ledger, &insurer, &file).await?;
            println!(
                "Imported {} records into '{}' ({} rejected)",
                report.imported.len(),
                insurer.name,
                report.rejected.len()
            );
        }
        Command::Export { insurer, output } => {
            let insurer = ledger.insurer_named(&insurer).await.into_diagnostic()?;
            let records = ledger.records_for(insurer.id).await.into_diagnostic()?;
            match output {
                Some(path) if is_workbook(&path) => WorkbookWriter::new()
                    .write_records(&path, &insurer.name, &records)
                    .into_diagnostic()?,
                Some(path) => CommissionWriter::new(File::create(path).into_diagnostic()?)
                    .write_records(&insurer.name, &records)
                    .into_diagnostic()?,
                None => CommissionWriter::new(io::stdout().lock())
                    .write_records(&insurer.name, &records)
                    .into_diagnostic()?,
            }
        }
        Command::Settle {
            insurer,
            from,
            to,
            input,
            output,
        } => {
            let window = SettlementWindow::new(from, to).into_diagnostic()?;
            if let Some(input) = input {
                let target = insurer_or_create(ledger, &insurer).await?;
                import_file(ledger, &target, &input).await?;
            }
            let (insurer, settlement) = services
                .settlement
                .generate(&insurer, window)
                .await
                .into_diagnostic()?;
            match output {
                Some(path) if is_workbook(&path) => WorkbookWriter::new()
                    .write_settlement(&path, &insurer.name, &settlement)
                    .into_diagnostic()?,
                Some(path) => CommissionWriter::new(File::create(path).into_diagnostic()?)
                    .write_settlement(&insurer.name, &settlement)
                    .into_diagnostic()?,
                None => CommissionWriter::new(io::stdout().lock())
                    .write_settlement(&insurer.name, &settlement)
                    .into_diagnostic()?,
            }
        }
        Command::User(command) => run_user(command, &services.accounts).await?,
        Command::Compare { files } => {
            let comparator = PolicyComparator::new(Box::new(AnthropicClient::from_config(config)));
            let comparison = comparator
                .compare_files(files.as_slice())
                .await
                .into_diagnostic()?;
            ComparisonWriter::new(io::stdout().lock())
                .write_comparison(&comparison)
                .into_diagnostic()?;
        }
        Command::Merge { output, files } => {
            let pages = pdf::merge_files(files.as_slice(), &output).await.into_diagnostic()?;
            println!("Wrote {pages} pages to {}", output.display());
        }
        Command::Content {
            url,
            platform,
            count,
        } => {
            let agent = ContentAgent::new(
                Box::new(AnthropicClient::from_config(config)),
                Box::new(HttpFetcher::new()),
            );
            let campaign = agent
                .campaign(&url, platform, count)
                .await
                .into_diagnostic()?;
            let json = serde_json::to_string_pretty(&campaign).into_diagnostic()?;
            println!("{json}");
        }
    }
    Ok(())
}

async fn run_record(command: RecordCommand, ledger: &LedgerService) -> Result<()> {
    match command {
        RecordCommand::Add { insurer, fields } => {
            let insurer = ledger.insurer_named(&insurer).await.into_diagnostic()?;
            let record = ledger
                .create_record(insurer.id, fields.into())
                .await
                .into_diagnostic()?;
            println!("{}", record.id);
        }
        RecordCommand::Edit { id, changes } => {
            let current = ledger.get_record(id).await.into_diagnostic()?;
            let record = ledger
                .edit_record(id, changes.apply(current.to_draft()))
                .await
                .into_diagnostic()?;
            println!(
                "{}\tcommission difference {}\tsettlement difference {}",
                record.id, record.commission_difference, record.settlement_difference
            );
        }
        RecordCommand::Show { id } => {
            let record = ledger.get_record(id).await.into_diagnostic()?;
            let json = serde_json::to_string_pretty(&record).into_diagnostic()?;
            println!("{json}");
        }
        RecordCommand::Remove { id } => {
            ledger.delete_record(id).await.into_diagnostic()?;
            println!("Removed {id}");
        }
    }
    Ok(())
}

async fn run_user(command: UserCommand, accounts: &AccountService) -> Result<()> {
    match command {
        UserCommand::Add {
            email,
            name,
            role,
            password,
        } => {
            let user = accounts
                .create_user(&email, &name, role, &password)
                .await
                .into_diagnostic()?;
            println!("{}\t{}\t{}", user.email, user.name, user.role);
        }
        UserCommand::List => {
            for user in accounts.list_users().await.into_diagnostic()? {
                println!("{}\t{}\t{}", user.email, user.name, user.role);
            }
        }
        UserCommand::Remove { email } => {
            accounts.remove_user(&email).await.into_diagnostic()?;
            println!("Removed {}", email.trim());
        }
        UserCommand::Login { email, password } => {
            let user = accounts
                .authenticate(&email, &password)
                .await
                .into_diagnostic()?;
            println!("Authenticated {} ({})", user.email, user.role);
        }
        UserCommand::RequestReset { email } => {
            let reset = accounts
                .request_password_reset(&email)
                .await
                .into_diagnostic()?;
            println!("{}\texpires {}", reset.token, reset.expires_at);
        }
        UserCommand::Reset { token, password } => {
            accounts
                .reset_password(token, &password)
                .await
                .into_diagnostic()?;
            println!("Password updated");
        }
    }
    Ok(())
}

async fn insurer_or_create(ledger: &LedgerService, name: &str) -> Result<Insurer> {
    match ledger.insurer_named(name).await {
        Ok(insurer) => Ok(insurer),
        Err(PortalError::NotFound(_)) => ledger.add_insurer(name).await.into_diagnostic(),
        Err(e) => Err(e).into_diagnostic(),
    }
}

async fn import_file(ledger: &LedgerService, insurer: &Insurer, path: &Path) -> Result<ImportReport> {
    let report = if is_workbook(path) {
        let drafts = WorkbookReader::open(path)
            .and_then(WorkbookReader::drafts)
            .into_diagnostic()?;
        ledger.import_records(insurer.id, drafts).await
    } else {
        let file = File::open(path).into_diagnostic()?;
        let drafts = CommissionReader::new(file).drafts().into_diagnostic()?;
        ledger.import_records(insurer.id, drafts).await
    }
    .into_diagnostic()?;
    for rejected in &report.rejected {
        eprintln!("Rejected {rejected}");
    }
    Ok(report)
}
