#![allow(clippy::result_large_err)]

use cashbook::{
    auth::LocalIdentityProvider,
    commands::{App, SignUpForm},
    config::{database, settings},
    core::validation::{CollectionForm, EmiForm},
    errors::Result,
    presentation::ConsolePresenter,
    store::{DatabaseStore, RecordId},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands:
  signup <name> <email> <password> <confirm>
  login <email> <password>
  logout
  collect <YYYY-MM-DD> <amount>
  drop-collection <id>
  emi <amount> <due-day> <YYYY-MM-DD> <months> <name...>
  pay <emi-id>        select an EMI, then `confirm` or `cancel`
  confirm
  cancel
  drop-emi <id>
  help
  quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible), on stderr so it stays out of the shell output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file
    dotenv().ok(); // Non-fatal, env vars can be set externally
    debug!("Attempted to load .env file.");

    // 3. Load settings
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Open the record store and ensure its tables
    let database_url = database::get_database_url();
    database::ensure_database_dir(&database_url)?;
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to record store: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Record store initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Wire the application
    let store = Arc::new(DatabaseStore::new(db.clone()));
    let identity = Arc::new(LocalIdentityProvider::new(db, &settings.auth));
    // Provider sign-ins live in memory, so every run starts signed out
    let mut app = App::new(store, identity, Arc::new(ConsolePresenter));

    // 6. Run the shell until EOF or `quit`
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        if command == "quit" {
            break;
        }
        if let Err(e) = dispatch(&mut app, command, args).await {
            // Already surfaced to the user by the handler
            debug!("Command `{}` failed: {}", command, e);
        }
    }

    if app.session().is_some() {
        app.sign_out().await.ok();
    }
    info!("Shell closed");
    Ok(())
}

fn parse_id(args: &[&str]) -> Option<RecordId> {
    args.first().and_then(|s| s.parse().ok())
}

async fn dispatch(app: &mut App, command: &str, args: &[&str]) -> Result<()> {
    match (command, args) {
        ("signup", [name, email, password, confirm]) => {
            let form = SignUpForm {
                name: (*name).to_string(),
                email: (*email).to_string(),
                password: (*password).to_string(),
                confirm_password: (*confirm).to_string(),
            };
            let principal = app.sign_up(&form).await?;
            println!("Signed in as {}", principal.display_label());
        }
        ("login", [email, password]) => {
            let principal = app.sign_in(email, password).await?;
            println!("Signed in as {}", principal.display_label());
        }
        ("logout", []) => app.sign_out().await?,
        ("collect", [date, amount]) => {
            app.add_collection(&CollectionForm::new(*date, *amount))
                .await?;
        }
        ("emi", [amount, due_day, start_date, total_months, name @ ..]) => {
            let form = EmiForm {
                name: name.join(" "),
                amount: (*amount).to_string(),
                due_day: (*due_day).to_string(),
                start_date: (*start_date).to_string(),
                total_months: (*total_months).to_string(),
            };
            app.add_emi(&form).await?;
        }
        ("pay", _) => match parse_id(args) {
            Some(id) => match app.begin_payment(id).await? {
                Some(emi) => println!(
                    "Mark \"{}\" as paid for this month? (confirm / cancel)",
                    emi.name
                ),
                None => println!("No EMI #{id}"),
            },
            None => println!("{HELP}"),
        },
        ("confirm", []) => {
            if !app.confirm_payment().await? {
                println!("No payment selected");
            }
        }
        ("cancel", []) => app.cancel_payment().await?,
        ("drop-collection", _) => match parse_id(args) {
            Some(id) => app.delete_collection(id).await?,
            None => println!("{HELP}"),
        },
        ("drop-emi", _) => match parse_id(args) {
            Some(id) => app.delete_emi(id).await?,
            None => println!("{HELP}"),
        },
        _ => println!("{HELP}"),
    }
    Ok(())
}
