use clap::{Parser, Subcommand};

use lulu_core::models::BookingStatus;

#[derive(Parser, Debug)]
#[command(name = "lulu", version, about = "LuLu farm site and admin panel client")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Backend base URL (overrides LULU_BACKEND_URL and the config file)"
    )]
    pub backend_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to the admin panel
    Login {
        #[arg(long, short)]
        username: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Farm contacts and opening hours
    SiteInfo,
    /// Services offered on the farm
    Services,
    /// Approved visitor reviews
    Reviews {
        #[arg(long, default_value_t = lulu_core::api::endpoints::DEFAULT_REVIEW_LIMIT)]
        limit: u32,
    },
    /// Latest farm news
    News {
        #[arg(long, default_value_t = lulu_core::api::endpoints::DEFAULT_NEWS_LIMIT)]
        limit: u32,
    },
    /// Photo gallery
    Gallery,
    /// Request a visit
    Book {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long, help = "Id of the service to book")]
        service: Option<String>,
        #[arg(long, help = "Preferred date, YYYY-MM-DD or YYYY-MM-DDTHH:MM")]
        date: Option<String>,
        #[arg(long)]
        people: Option<u32>,
    },
    /// Leave a review (shown after moderation)
    Review {
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        #[arg(long)]
        email: Option<String>,
    },
    /// Admin panel commands (requires login)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Dashboard counters
    Stats,
    /// List bookings
    Bookings {
        #[arg(long, value_parser = parse_status)]
        status: Option<BookingStatus>,
    },
    /// Change a booking's status
    SetStatus {
        id: String,
        #[arg(value_parser = parse_status)]
        status: BookingStatus,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Reviews waiting for moderation
    PendingReviews,
    ApproveReview {
        id: String,
    },
    DeleteReview {
        id: String,
    },
    DeleteService {
        id: String,
    },
    DeletePost {
        id: String,
    },
    DeleteNews {
        id: String,
    },
}

fn parse_status(s: &str) -> Result<BookingStatus, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_status() {
        let cli = Cli::parse_from(["lulu", "admin", "set-status", "b-1", "confirmed", "--notes", "ok"]);
        match cli.command {
            Commands::Admin {
                command: AdminCommands::SetStatus { id, status, notes },
            } => {
                assert_eq!(id, "b-1");
                assert_eq!(status, BookingStatus::Confirmed);
                assert_eq!(notes.as_deref(), Some("ok"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_out_of_range_rating() {
        let result = Cli::try_parse_from([
            "lulu", "review", "--name", "Анна", "--text", "Супер", "--rating", "6",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_json_flag() {
        let cli = Cli::parse_from(["lulu", "reviews", "--json", "--limit", "3"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Reviews { limit: 3 }));
    }
}
