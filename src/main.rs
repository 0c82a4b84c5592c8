use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use transfer_gate::captcha::CaptchaChallenge;
use transfer_gate::configure::load_config;
use transfer_gate::logger::setup_logger;
use transfer_gate::models::{TransferRequest, WizardError};
use transfer_gate::transfer::adapters::{
    ConsoleDispatcher, HttpEmailDispatcher, InMemoryBackend, PasscodeDispatcher,
};
use transfer_gate::transfer::{Collaborators, Stage, SystemClock, TransferWizard};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Unset,
    Success,
    Failure,
}

impl PolicyArg {
    fn flag(self) -> Option<bool> {
        match self {
            Self::Unset => None,
            Self::Success => Some(true),
            Self::Failure => Some(false),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive transfer wizard against in-memory collaborators", long_about = None)]
struct Args {
    /// Opening account balance
    #[arg(long, default_value = "500.00")]
    balance: String,

    /// Force-success flag set for the demo user
    #[arg(long, value_enum, default_value = "unset")]
    policy: PolicyArg,

    /// Sign in as an administrator (skips the authorization chain)
    #[arg(long)]
    admin: bool,
}

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

async fn captcha_gate(input: &mut Input) -> Result<bool, Box<dyn std::error::Error>> {
    let mut challenge = CaptchaChallenge::generate();
    loop {
        println!("Captcha: {}", challenge.code());
        let Some(answer) = prompt(input, "Enter the code above: ").await? else {
            return Ok(false);
        };
        match challenge.verify(&answer) {
            Ok(()) => return Ok(true),
            Err(e) => {
                println!("{}", e);
                challenge = CaptchaChallenge::generate();
            }
        }
    }
}

async fn read_request(input: &mut Input) -> Result<Option<TransferRequest>, Box<dyn std::error::Error>> {
    let mut fields = Vec::with_capacity(6);
    for label in [
        "Amount: ",
        "Recipient name: ",
        "Account number: ",
        "Bank name: ",
        "Sort code (NN-NN-NN): ",
        "Description (optional): ",
    ] {
        match prompt(input, label).await? {
            Some(value) => fields.push(value),
            None => return Ok(None),
        }
    }

    // Unparseable input falls through to the amount validation error
    let amount = Decimal::from_str(&fields[0]).unwrap_or(Decimal::ZERO);
    let description = fields.pop().filter(|d| !d.is_empty());

    Ok(Some(TransferRequest {
        amount,
        recipient: fields[1].clone(),
        account_number: fields[2].clone(),
        bank_name: fields[3].clone(),
        sort_code: fields[4].clone(),
        description,
    }))
}

fn report(result: Result<Stage, WizardError>) {
    match result {
        Ok(stage) => log::debug!("Now at {}", stage),
        Err(e) => println!("[{}] {}", e.error_code(), e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let args = Args::parse();

    let config = load_config()?;
    setup_logger(&config)?;
    let wizard_config = config.wizard_config()?;

    let balance = Decimal::from_str(&args.balance)?;
    let backend = if args.admin {
        InMemoryBackend::administrator(balance)
    } else {
        InMemoryBackend::customer(balance)
    };
    backend.policy.set_force_success(&backend.user_id, args.policy.flag());

    let dispatcher: Arc<dyn PasscodeDispatcher> = match &config.email_endpoint {
        Some(endpoint) => {
            let http = HttpEmailDispatcher::new(
                endpoint.clone(),
                config.email_api_key.clone(),
                wizard_config.passcode_ttl,
            )?;
            log::info!("Passcode emails posted to {}", http.endpoint());
            Arc::new(http)
        }
        None => Arc::new(ConsoleDispatcher::new(wizard_config.passcode_ttl)),
    };
    log::info!("Passcodes delivered via {}", dispatcher.name());

    let collaborators = Collaborators {
        dispatcher,
        clock: Arc::new(SystemClock),
        ..backend.collaborators()
    };
    let mut wizard = TransferWizard::new(collaborators, wizard_config);

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if !captcha_gate(&mut input).await? {
        return Ok(());
    }

    println!("Signed in as {} with balance {}", backend.user_id, balance);
    println!(
        "Demo credentials: TAC {}, security code {}, TIN {}",
        InMemoryBackend::TAC,
        InMemoryBackend::SECURITY_CODE,
        InMemoryBackend::TIN
    );

    loop {
        match wizard.stage() {
            Stage::AmountEntry => {
                let Some(request) = read_request(&mut input).await? else {
                    break;
                };
                report(wizard.submit_transfer(request).await);
            }
            Stage::Confirm => {
                if let Some(transfer) = wizard.transfer() {
                    let summary = transfer.summary();
                    println!(
                        "Send {} to {} at {} ({})?",
                        summary.amount, summary.recipient, summary.bank_name, summary.account_hint
                    );
                }
                match prompt(&mut input, "Confirm [y/n]: ").await?.as_deref() {
                    Some("y") | Some("Y") => report(wizard.confirm().await),
                    Some(_) => wizard.cancel(),
                    None => break,
                }
            }
            stage @ (Stage::Tac | Stage::SecurityCode | Stage::Tin) => {
                let label = stage.credential_kind().map(|k| k.label()).unwrap_or("credential");
                let Some(value) = prompt(&mut input, &format!("Enter your {}: ", label)).await? else {
                    break;
                };
                report(wizard.submit_credential(&value).await);
            }
            Stage::Passcode => {
                let remaining = wizard
                    .passcode_countdown()
                    .map(|c| c.display())
                    .unwrap_or_default();
                let label = format!("Passcode ({} left, 'resend' for a new one): ", remaining);
                let Some(value) = prompt(&mut input, &label).await? else {
                    break;
                };
                if value.eq_ignore_ascii_case("resend") {
                    report(wizard.resend_passcode().await);
                } else {
                    report(wizard.submit_passcode(&value).await);
                }
            }
            Stage::Completed | Stage::Pending | Stage::Failed => {
                match wizard.receipt() {
                    Some(receipt) => {
                        println!(
                            "Transfer {} ({}): {}",
                            receipt.record.id,
                            receipt.status().as_str(),
                            receipt.record.description
                        );
                        if let Some(balance) = receipt.balance_after {
                            println!("New balance: {}", balance);
                        } else {
                            println!("Awaiting approval; balance unchanged");
                        }
                    }
                    None => println!("Transfer failed"),
                }
                match prompt(&mut input, "Another transfer? [y/n]: ").await?.as_deref() {
                    Some("y") | Some("Y") => {
                        wizard.restart()?;
                    }
                    _ => break,
                }
            }
        }
    }

    Ok(())
}
