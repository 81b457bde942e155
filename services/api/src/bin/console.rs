//! services/api/src/bin/console.rs
//!
//! A command-line client for the catalog. Keeps its session in a JSON file,
//! runs every page-like command through the route guard, and talks to the
//! `api` server over HTTP.

use api_lib::adapters::{ClientError, GraphQlClient, JsonFileStorage, ProductInput, ProductPatch};
use clap::{Parser, Subcommand};
use commodities_core::{
    domain::search_products,
    guard::{GuardOutcome, RouteGuard},
    navigation::{home_destination, menu_for, Route, DEFAULT_AFTER_LOGIN},
    AuthGate, Product, SessionStore,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "console", about = "Manage the commodities catalog from the terminal")]
struct Cli {
    /// Operation endpoint of the api server.
    #[arg(long, env = "COMMODITIES_API_URL", default_value = "http://localhost:3001/graphql")]
    endpoint: String,
    /// Where the session and theme preference are kept between runs.
    #[arg(long, env = "COMMODITIES_STATE_FILE", default_value = ".commodities-session.json")]
    state_file: PathBuf,
    /// Log filter directives, written to stderr.
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_filter: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Page to continue to after signing in.
        #[arg(long, default_value = DEFAULT_AFTER_LOGIN)]
        redirect: String,
    },
    Logout,
    /// Show the signed-in user and the pages they can open.
    Whoami,
    /// Catalog figures. Managers only.
    Dashboard,
    #[command(subcommand)]
    Products(ProductsCommand),
    /// Show the colour theme, or flip it with --toggle.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Subcommand)]
enum ProductsCommand {
    List {
        /// Only rows whose name or category contains this text.
        #[arg(long, default_value = "")]
        search: String,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        stock: u64,
        #[arg(long)]
        category: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        stock: Option<u64>,
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum ConsoleError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Redirected to {0}")]
    Redirected(String),
    #[error("{0}")]
    Invalid(&'static str),
}

type Gate = AuthGate<JsonFileStorage>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cli.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
    {
        eprintln!("Logging disabled: {e}");
    }

    let storage = JsonFileStorage::new(&cli.state_file);
    let mut gate = AuthGate::new(storage.clone());
    gate.initialize();

    match run(cli, &mut gate, storage).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, gate: &mut Gate, storage: JsonFileStorage) -> Result<(), ConsoleError> {
    let client = GraphQlClient::new(&cli.endpoint)
        .with_token(gate.access_token().map(str::to_string));

    match cli.command {
        Command::Login {
            email,
            password,
            redirect,
        } => {
            if gate.is_authenticated() {
                println!("Already signed in. Continuing to {}.", landing(gate, &redirect));
                return Ok(());
            }
            validate_login(&email, &password)?;
            let session = client.login(&email, &password).await?;
            gate.login(session.access_token, session.user);
            println!("Signed in. Continuing to {}.", landing(gate, &redirect));
        }
        Command::Logout => {
            gate.logout();
            println!("Signed out.");
        }
        Command::Whoami => match gate.user() {
            Some(user) => {
                println!("{} ({})", user.email, user.role.label());
                for item in menu_for(user.role) {
                    println!("  {:<10} {}", item.label, item.route.path());
                }
            }
            None => {
                let home = home_destination(&gate.snapshot()).unwrap_or(Route::Login);
                println!("Not signed in. Start at {}.", home.path());
            }
        },
        Command::Dashboard => {
            enter(gate, Route::Dashboard)?;
            let stats = client.dashboard_stats().await?;
            println!("Total products   {}", stats.total_products);
            println!("Low stock items  {}", stats.low_stock_items);
            println!("Categories       {}", stats.total_categories);
        }
        Command::Products(command) => {
            enter(gate, Route::Products)?;
            run_products(&client, command).await?;
        }
        Command::Theme { toggle } => {
            let store = SessionStore::new(storage);
            let theme = if toggle {
                store.toggle_theme()
            } else {
                store.load_theme()
            };
            println!("Theme: {}", theme.as_str());
        }
    }
    Ok(())
}

async fn run_products(
    client: &GraphQlClient,
    command: ProductsCommand,
) -> Result<(), ConsoleError> {
    match command {
        ProductsCommand::List { search } => {
            let products = client.products().await?;
            let rows = search_products(&products, &search);
            if rows.is_empty() {
                println!("No products found.");
            }
            for product in rows {
                print_product(product);
            }
        }
        ProductsCommand::Add {
            name,
            price,
            stock,
            category,
        } => {
            validate_text(&name, "Name is required")?;
            validate_price(price)?;
            validate_text(&category, "Category is required")?;
            let input = ProductInput {
                name,
                price,
                stock,
                category,
            };
            print_product(&client.create_product(&input).await?);
        }
        ProductsCommand::Edit {
            id,
            name,
            price,
            stock,
            category,
        } => {
            if let Some(name) = &name {
                validate_text(name, "Name is required")?;
            }
            if let Some(price) = price {
                validate_price(price)?;
            }
            if let Some(category) = &category {
                validate_text(category, "Category is required")?;
            }
            let patch = ProductPatch {
                name,
                price,
                stock,
                category,
            };
            print_product(&client.update_product(&id, &patch).await?);
        }
    }
    Ok(())
}

/// Where a post-login `redirect` actually lands once the guard has run on it.
/// Paths outside the route table are passed through untouched.
fn landing(gate: &Gate, redirect: &str) -> String {
    match Route::from_path(redirect) {
        Some(route) => match enter(gate, route) {
            Err(ConsoleError::Redirected(target)) => target,
            _ => route.path().to_string(),
        },
        None => redirect.to_string(),
    }
}

/// Runs the route guard for a page. Anything but `Render` stops the command.
fn enter(gate: &Gate, route: Route) -> Result<(), ConsoleError> {
    if route.is_public() {
        return Ok(());
    }
    match RouteGuard::new(route.path(), route.required_roles()).evaluate(gate) {
        GuardOutcome::Render => Ok(()),
        outcome => Err(ConsoleError::Redirected(
            outcome
                .redirect_target()
                .unwrap_or_else(|| route.path().to_string()),
        )),
    }
}

fn print_product(product: &Product) {
    let flag = if product.is_low_stock() { "  LOW" } else { "" };
    println!(
        "{:>4}  {:<16} {:>10.2} {:>6}  {}{}",
        product.id, product.name, product.price, product.stock, product.category, flag
    );
}

fn validate_login(email: &str, password: &str) -> Result<(), ConsoleError> {
    validate_text(email, "Email is required")?;
    if !email.contains('@') {
        return Err(ConsoleError::Invalid("Invalid email"));
    }
    validate_text(password, "Password is required")
}

fn validate_text(value: &str, message: &'static str) -> Result<(), ConsoleError> {
    if value.trim().is_empty() {
        return Err(ConsoleError::Invalid(message));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), ConsoleError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ConsoleError::Invalid("Price must be non-negative"));
    }
    Ok(())
}
