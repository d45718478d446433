use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paysign::application::checkout::{CheckoutRequest, MajorAmountInput, OzowCheckout};
use paysign::application::initiate::{InitiateOrder, PayGateInitiator};
use paysign::application::notify::verify_ozow_notify;
use paysign::application::paypage::build_paypage_request;
use paysign::config::GatewayConfig;
use paysign::domain::digest::digest_hex;
use paysign::domain::fields::FieldMap;
use paysign::domain::format::{MajorAmount, TRANSACTION_DATE_FORMAT};
use paysign::domain::paygate::build_initiate_checksum;
use paysign::infrastructure::http::{HttpInitiateTransport, OzowStatusClient};
use paysign::interfaces::form::{parse_form_body, render_forward_page};
use serde::Serialize;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file. Process environment is used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hex digest of INPUT with sha512, md5 or hmac-sha256
    Digest {
        #[arg(long)]
        algorithm: String,
        #[arg(long)]
        key: Option<String>,
        input: String,
    },
    /// Ozow hash-redirect operations
    #[command(subcommand)]
    Ozow(OzowCommand),
    /// PayGate PayWeb3 operations
    #[command(subcommand)]
    Paygate(PayGateCommand),
}

#[derive(Subcommand)]
enum OzowCommand {
    /// Build a signed checkout form
    Checkout {
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        bank_ref: Option<String>,
        #[arg(long)]
        customer: Option<String>,
        /// Print an auto-submitting HTML page instead of JSON
        #[arg(long)]
        html: bool,
    },
    /// Verify a form-encoded notify body
    Verify { payload: PathBuf },
    /// Look up a transaction through the Ozow API
    Status { reference: String },
}

#[derive(Subcommand)]
enum PayGateCommand {
    /// Initiate checksum of a JSON field map
    Checksum { fields: PathBuf },
    /// Run the initiate protocol against the configured endpoint
    Initiate {
        #[arg(long)]
        reference: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        email: String,
        /// Transaction date as "YYYY-MM-DD HH:MM:SS"; defaults to now
        #[arg(long)]
        date: Option<String>,
    },
    /// Build a signed PayPage redirect request
    Paypage {
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<GatewayConfig> {
    let config = match path {
        Some(path) => GatewayConfig::from_json_reader(File::open(path).into_diagnostic()?),
        None => GatewayConfig::from_env(),
    };
    config.into_diagnostic()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Digest {
            algorithm,
            key,
            input,
        } => {
            println!("{}", digest_hex(&algorithm, key.as_deref(), &input).into_diagnostic()?);
        }
        Command::Ozow(command) => {
            let config = load_config(cli.config.as_ref())?;
            match command {
                OzowCommand::Checkout {
                    order_id,
                    amount,
                    bank_ref,
                    customer,
                    html,
                } => {
                    let request = CheckoutRequest {
                        order_id,
                        amount: Some(MajorAmountInput::Text(amount)),
                        bank_reference: bank_ref,
                        customer,
                        optional: Default::default(),
                    };
                    let form = OzowCheckout::new(&config.ozow)
                        .build(&request)
                        .into_diagnostic()?;
                    if html {
                        println!("{}", render_forward_page(&form.action, &form.fields));
                    } else {
                        print_json(&form)?;
                    }
                }
                OzowCommand::Verify { payload } => {
                    let body = fs::read_to_string(payload).into_diagnostic()?;
                    let fields = parse_form_body(&body);
                    print_json(&verify_ozow_notify(&fields, config.ozow.private_key.expose()))?;
                }
                OzowCommand::Status { reference } => {
                    let client = OzowStatusClient::new(&config.ozow, config.ozow.timeout())
                        .into_diagnostic()?;
                    let data = client
                        .transaction_by_reference(&reference)
                        .await
                        .into_diagnostic()?;
                    print_json(&data)?;
                }
            }
        }
        Command::Paygate(command) => {
            let config = load_config(cli.config.as_ref())?;
            match command {
                PayGateCommand::Checksum { fields } => {
                    let fields: FieldMap =
                        serde_json::from_reader(File::open(fields).into_diagnostic()?)
                            .into_diagnostic()?;
                    println!(
                        "{}",
                        build_initiate_checksum(&fields, config.paygate.encryption_key.expose())
                    );
                }
                PayGateCommand::Initiate {
                    reference,
                    amount,
                    email,
                    date,
                } => {
                    let transaction_date = date
                        .map(|d| NaiveDateTime::parse_from_str(&d, TRANSACTION_DATE_FORMAT))
                        .transpose()
                        .into_diagnostic()?;
                    let order = InitiateOrder {
                        reference,
                        amount: amount.parse::<MajorAmount>().into_diagnostic()?,
                        email,
                        transaction_date,
                    };
                    let transport =
                        HttpInitiateTransport::from_config(&config.paygate).into_diagnostic()?;
                    let initiator = PayGateInitiator::new(config.paygate, Box::new(transport));
                    let outcome = initiator.initiate(&order).await.into_diagnostic()?;
                    print_json(&outcome)?;
                }
                PayGateCommand::Paypage {
                    order_id,
                    amount,
                    description,
                } => {
                    let amount = amount.parse::<MajorAmount>().into_diagnostic()?;
                    let timestamp = chrono::Utc::now().timestamp_millis();
                    let signed = build_paypage_request(
                        &config.paygate,
                        &order_id,
                        amount,
                        &description,
                        timestamp,
                    )
                    .into_diagnostic()?;
                    print_json(&signed)?;
                }
            }
        }
    }

    Ok(())
}
