use clap::{Parser, Subcommand};
use stockroom::{config::StoreConfig, context::AppContext};

mod cart;
mod order;
mod output;
mod product;
mod session;

#[derive(Debug, Parser)]
#[command(name = "stockroom", about = "Stockroom CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    store: StoreConfig,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    pub(crate) log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a user account
    Register(session::RegisterArgs),
    /// Start a session
    Login(session::LoginArgs),
    /// End the current session
    Logout,
    Product(product::ProductCommand),
    Cart(cart::CartCommand),
    Order(order::OrderCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let ctx = AppContext::from_config(&self.store);

        match self.command {
            Commands::Register(args) => session::register(&ctx, args).await,
            Commands::Login(args) => session::login(&ctx, args).await,
            Commands::Logout => session::logout(&ctx).await,
            Commands::Product(command) => product::run(&ctx, command).await,
            Commands::Cart(command) => cart::run(&ctx, command).await,
            Commands::Order(command) => order::run(&ctx, command).await,
        }
    }
}
