//! Layerline CLI - Database migrations and tracking reference tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! layerline migrate
//!
//! # Generate the tracking reference for an order
//! layerline tracking generate --order-id gid://shopify/Order/1001
//!
//! # Tag the order in Shopify with its reference
//! layerline tracking issue --order-id gid://shopify/Order/1001
//!
//! # Verify a reference against an order
//! layerline tracking verify --order-id gid://shopify/Order/1001 --reference ord_XXXXXXXXXXXXXXXX
//!
//! # Classify raw tracker input
//! layerline tracking classify "cot-123"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "layerline")]
#[command(author, version, about = "Layerline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Generate, issue, verify, and classify tracking references
    Tracking {
        #[command(subcommand)]
        action: TrackingAction,
    },
}

#[derive(Subcommand)]
enum TrackingAction {
    /// Print the tracking reference for an order
    Generate {
        /// Shopify order GID
        #[arg(short, long)]
        order_id: String,
    },
    /// Tag an order with its tracking reference so the tracker can find it
    Issue {
        /// Shopify order GID
        #[arg(short, long)]
        order_id: String,
    },
    /// Check that a reference was issued for an order
    Verify {
        /// Shopify order GID
        #[arg(short, long)]
        order_id: String,

        /// Tracking reference as the shopper typed it
        #[arg(short, long)]
        reference: String,
    },
    /// Show how the order tracker reads some input
    Classify {
        /// Raw input
        raw: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Tracking { action } => match action {
            TrackingAction::Generate { order_id } => commands::tracking::generate(&order_id)?,
            TrackingAction::Issue { order_id } => commands::tracking::issue(&order_id).await?,
            TrackingAction::Verify {
                order_id,
                reference,
            } => commands::tracking::verify(&order_id, &reference)?,
            TrackingAction::Classify { raw } => commands::tracking::classify(&raw)?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_issue() {
        let cli = Cli::try_parse_from([
            "layerline",
            "tracking",
            "issue",
            "--order-id",
            "gid://shopify/Order/1001",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Tracking {
                action: TrackingAction::Issue { order_id }
            }) if order_id == "gid://shopify/Order/1001"
        ));
    }

    #[test]
    fn test_parse_verify() {
        let cli = Cli::try_parse_from([
            "layerline",
            "tracking",
            "verify",
            "--order-id",
            "gid://shopify/Order/1001",
            "--reference",
            "ord_EBXrPFhTdTNQbgGV",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Tracking {
                action: TrackingAction::Verify { .. }
            })
        ));
    }
}
