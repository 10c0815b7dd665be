use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{LedgerConfig, LedgerService};
use crate::domain::{Account, AccountId, TransferRequest, format_cents, parse_cents};
use crate::storage::{MemoryStorage, SqliteStorage};

/// ledgerd - Account Ledger
#[derive(Parser)]
#[command(name = "ledgerd")]
#[command(about = "A minimal account ledger with atomic transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "ledger.db")]
    pub database: String,

    /// Per-operation storage timeout in milliseconds (0 disables it)
    #[arg(long, default_value_t = 0)]
    pub timeout_ms: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        listen_addr: String,

        /// Keep accounts in memory instead of the database file
        #[arg(long)]
        in_memory: bool,
    },

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transfer money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source account id
        #[arg(long)]
        from: AccountId,

        /// Destination account id
        #[arg(long)]
        to: AccountId,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        first_name: String,
        last_name: String,
    },

    /// List all accounts
    List,

    /// Show a single account
    Show { id: AccountId },

    /// Delete an account
    Delete { id: AccountId },

    /// Credit an account
    Deposit {
        id: AccountId,
        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Debit an account
    Withdraw {
        id: AccountId,
        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },
}

impl Cli {
    fn config(&self) -> LedgerConfig {
        LedgerConfig::from_timeout_ms(self.timeout_ms)
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();

        match self.command {
            Commands::Init => {
                LedgerService::<SqliteStorage>::init(&self.database, config).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Serve {
                listen_addr,
                in_memory,
            } => {
                let service = if in_memory {
                    tracing::warn!("serving from memory; accounts are lost on exit");
                    LedgerService::with_config(Arc::new(MemoryStorage::new()), config).into_dyn()
                } else {
                    LedgerService::<SqliteStorage>::init(&self.database, config)
                        .await?
                        .into_dyn()
                };
                crate::http::serve(&listen_addr, service).await?;
            }

            Commands::Account(account_cmd) => {
                let service =
                    LedgerService::<SqliteStorage>::connect(&self.database, config).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let service =
                    LedgerService::<SqliteStorage>::connect(&self.database, config).await?;
                let amount = parse_cents(&amount)
                    .context("Invalid amount format. Use '50.00' or '50'")?;

                service.transfer(TransferRequest::new(from, to, amount)).await?;
                println!("Transferred {} from #{} to #{}", format_cents(amount), from, to);
            }
        }

        Ok(())
    }
}

async fn run_account_command(
    service: &LedgerService<SqliteStorage>,
    cmd: AccountCommands,
) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            first_name,
            last_name,
        } => {
            let account = service.create_account(first_name, last_name).await?;
            println!("Created account #{}: {}", account.id, account.display_name());
        }

        AccountCommands::List => {
            let accounts = service.get_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<6} {:<30} {:>14}", "ID", "NAME", "BALANCE");
                println!("{}", "-".repeat(52));
                for account in accounts {
                    println!(
                        "{:<6} {:<30} {:>14}",
                        account.id,
                        account.display_name(),
                        format_cents(account.balance)
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let account = service.get_account(id).await?;
            print_account(&account);
        }

        AccountCommands::Delete { id } => {
            service.delete_account(id).await?;
            println!("Deleted account #{}", id);
        }

        AccountCommands::Deposit { id, amount } => {
            let amount = parse_cents(&amount)
                .context("Invalid amount format. Use '50.00' or '50'")?;
            let account = service.deposit(id, amount).await?;
            println!(
                "Deposited {} into #{} (balance {})",
                format_cents(amount),
                id,
                format_cents(account.balance)
            );
        }

        AccountCommands::Withdraw { id, amount } => {
            let amount = parse_cents(&amount)
                .context("Invalid amount format. Use '50.00' or '50'")?;
            let account = service.withdraw(id, amount).await?;
            println!(
                "Withdrew {} from #{} (balance {})",
                format_cents(amount),
                id,
                format_cents(account.balance)
            );
        }
    }

    Ok(())
}

fn print_account(account: &Account) {
    println!("Account #{}", account.id);
    println!("  Name:     {}", account.display_name());
    println!("  Balance:  {}", format_cents(account.balance));
    println!(
        "  Created:  {}",
        account.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}
