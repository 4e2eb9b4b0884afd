use clap::{Parser, Subcommand};
use profix_core::booking::{BookingRequest, BookingService};
use profix_core::scoring::{HonorBadge, ScoreUpdater};
use profix_core::store::types::{BookingId, BookingStatus, ProviderId, UserId};
use profix_core::store::{file, DataStore, MemoryStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_DOMAIN: i32 = 1;
const EXIT_STORE: i32 = 2;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute honor scores (one provider, or every verified provider)
    Recompute {
        /// Provider to recompute; omit to run the whole verified batch
        #[arg(long)]
        provider: Option<ProviderId>,
    },
    /// Show a provider's current honor score breakdown and badge
    Show { provider: ProviderId },
    /// Place a new booking (enters the pending state)
    Book {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        provider: ProviderId,
        /// Service date, e.g. 2026-09-15
        #[arg(long)]
        date: String,
        #[arg(long)]
        hours: u32,
        #[arg(long)]
        description: Option<String>,
    },
    /// Move a booking to a new status, firing the transition's side effects
    SetStatus {
        booking: BookingId,
        /// pending|accepted|in_progress|completed|cancelled
        status: BookingStatus,
        /// Provider identity to assert; must match the booking's provider
        #[arg(long)]
        provider: Option<ProviderId>,
    },
    /// Submit a review for a completed booking
    Review {
        booking: BookingId,
        #[arg(long)]
        user: UserId,
        /// Star rating, 1-5
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "profix-core")]
#[command(about = "Provider reputation engine for the ProFix marketplace", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the JSON store file
    #[arg(short, long, global = true, default_value = "profix.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let data = match file::load_store(&cli.store) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Store error: {:#}", e);
            std::process::exit(EXIT_STORE);
        }
    };
    let store = MemoryStore::from_data(data);
    let use_colors = profix_core::output::should_use_colors();

    let mutated = match run(&cli.command, &store, use_colors) {
        Ok(mutated) => mutated,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_DOMAIN);
        }
    };

    if mutated {
        let snapshot = match store.snapshot() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Store error: {}", e);
                std::process::exit(EXIT_STORE);
            }
        };
        if let Err(e) = file::save_store(&cli.store, &snapshot) {
            eprintln!("Store error: {:#}", e);
            std::process::exit(EXIT_STORE);
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Run one command against the store. Returns whether the store was mutated
/// and should be written back.
fn run(
    command: &Commands,
    store: &MemoryStore,
    use_colors: bool,
) -> profix_core::Result<bool> {
    match command {
        Commands::Recompute { provider } => {
            let updater = ScoreUpdater::new(store);
            match provider {
                Some(provider_id) => {
                    let breakdown = updater.recompute(*provider_id)?;
                    let provider = store.provider(*provider_id)?;
                    println!(
                        "{}",
                        profix_core::output::format_breakdown(&provider, &breakdown, use_colors)
                    );
                }
                None => {
                    let outcomes = updater.recompute_all()?;
                    println!(
                        "{}",
                        profix_core::output::format_outcomes(&outcomes, use_colors)
                    );
                }
            }
            Ok(true)
        }
        Commands::Show { provider } => {
            let record = store.provider(*provider)?;
            let inputs = store.score_inputs(*provider)?;
            let breakdown = profix_core::scoring::calculate_score(&inputs);
            println!(
                "{}",
                profix_core::output::format_breakdown(&record, &breakdown, use_colors)
            );
            // Both sides come out of the same round-to-one-decimal
            // pipeline, so exact equality is the right staleness check.
            if breakdown.total != record.honor_score {
                let badge = HonorBadge::for_score(record.honor_score);
                println!(
                    "  (stored score {} [{}] is stale; run recompute)",
                    record.honor_score,
                    badge.label()
                );
            }
            Ok(false)
        }
        Commands::Book {
            user,
            provider,
            date,
            hours,
            description,
        } => {
            let service = BookingService::new(store, store);
            let booking_id = service.create_booking(BookingRequest {
                user_id: *user,
                provider_id: *provider,
                booking_date: date.clone(),
                estimated_hours: *hours,
                description: description.clone(),
            })?;
            let booking = store.booking(booking_id)?;
            println!(
                "Booking {} created (pending), total amount {}",
                booking_id, booking.total_amount
            );
            Ok(true)
        }
        Commands::SetStatus {
            booking,
            status,
            provider,
        } => {
            let service = BookingService::new(store, store);
            let breakdown = service.set_status(*booking, *status, *provider)?;
            println!("Booking {} -> {}", booking, status);
            if let Some(breakdown) = breakdown {
                let record = store.provider(store.booking(*booking)?.provider_id)?;
                println!(
                    "{}",
                    profix_core::output::format_breakdown(&record, &breakdown, use_colors)
                );
            }
            Ok(true)
        }
        Commands::Review {
            booking,
            user,
            rating,
            comment,
        } => {
            let service = BookingService::new(store, store);
            let review_id = service.submit_review(*booking, *user, *rating, comment.clone())?;
            let provider_id = store.booking(*booking)?.provider_id;
            let record = store.provider(provider_id)?;
            println!(
                "Review {} recorded; provider {} now rated {} over {} reviews",
                review_id, provider_id, record.rating, record.total_reviews
            );
            Ok(true)
        }
    }
}
