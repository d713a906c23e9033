//! Command handlers.
//!
//! Read-only commands load through [`Fetch`], form submissions and admin
//! actions go through [`Mutation`], and every admin command is gated on
//! [`SessionContext::guard_settled`] after restoring the stored session.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use lulu_core::api::ApiError;
use lulu_core::auth::{Redirect, RedirectReason};
use lulu_core::models::{BookingRequest, Credentials, MessageResponse, ReviewDraft};
use lulu_core::{
    Access, ApiClient, Config, Fetch, FetchState, LoginOutcome, Mutation, MutationCallbacks,
    SessionContext, SessionPhase,
};

use crate::cli::{AdminCommands, Commands};
use crate::output::{
    emit, emit_fetch, format_date, format_datetime, format_optional, parse_visit_date, truncate,
};

/// Environment variable read instead of prompting for the password
const PASSWORD_ENV: &str = "LULU_PASSWORD";

/// Review text is cut to this many characters in listings
const REVIEW_PREVIEW_CHARS: usize = 80;

pub async fn run(
    command: Commands,
    session: &SessionContext,
    config: &mut Config,
    json: bool,
) -> Result<()> {
    match command {
        Commands::Login { username } => login(session, config, username, json).await,
        Commands::Logout => {
            session.logout();
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => whoami(session, json).await,
        Commands::SiteInfo => {
            let state = load(session.api(), (), |api| async move { api.site_info().await }).await;
            emit_fetch(state, json, |info| {
                println!("{}", info.name);
                println!("  {}, {}", info.location, info.distance);
                println!("  Address: {}", info.address);
                println!("  Phone:   {}", info.phone);
                println!("  Email:   {}", info.email);
                println!("  Hours:   {}", info.working_hours);
                let mut social: Vec<_> = info.social_media.iter().collect();
                social.sort();
                for (network, url) in social {
                    println!("  {}: {}", network, url);
                }
            })
        }
        Commands::Services => {
            let state = load(session.api(), (), |api| async move { api.services().await }).await;
            emit_fetch(state, json, |services| {
                for s in services {
                    println!("{:<32} {:>10}  {}", s.title, s.price, s.slug);
                    if let Some(duration) = &s.duration {
                        println!("  duration: {}", duration);
                    }
                }
            })
        }
        Commands::Reviews { limit } => {
            let state =
                load(session.api(), limit, move |api| async move { api.reviews(limit).await })
                    .await;
            emit_fetch(state, json, |reviews| {
                for r in reviews {
                    println!(
                        "{} {} ({})",
                        r.stars(),
                        r.name,
                        format_date(&r.date)
                    );
                    println!("  {}", truncate(&r.text, REVIEW_PREVIEW_CHARS));
                    if let Some(response) = &r.response {
                        println!("  Farm: {}", truncate(response, REVIEW_PREVIEW_CHARS));
                    }
                }
            })
        }
        Commands::News { limit } => {
            let state =
                load(session.api(), limit, move |api| async move { api.news(limit).await }).await;
            emit_fetch(state, json, |news| {
                for n in news {
                    println!("{}  {}", format_date(&n.publish_date), n.title);
                    println!("  {}", n.excerpt);
                }
            })
        }
        Commands::Gallery => {
            let state = load(session.api(), (), |api| async move { api.gallery().await }).await;
            emit_fetch(state, json, |images| {
                for img in images {
                    println!(
                        "{}  {}",
                        format_optional(img.title.as_deref(), &img.alt_text),
                        img.image
                    );
                }
            })
        }
        Commands::Book {
            name,
            phone,
            email,
            message,
            service,
            date,
            people,
        } => {
            let preferred_date = date.as_deref().map(parse_visit_date).transpose()?;
            let request = BookingRequest {
                name,
                phone,
                email,
                message,
                service_id: service,
                preferred_date,
                people_count: people,
            };
            let api = session.api();
            submit(|| api.create_booking(&request), json).await
        }
        Commands::Review {
            name,
            text,
            rating,
            email,
        } => {
            let draft = ReviewDraft {
                name,
                email,
                text,
                rating,
            };
            let api = session.api();
            submit(|| api.create_review(&draft), json).await
        }
        Commands::Admin { command } => admin(session, command, json).await,
    }
}

/// Mount a fetch for `call` and wait for it to settle.
async fn load<T, D, F, Fut>(api: &ApiClient, deps: D, call: F) -> FetchState<T>
where
    T: Clone + Send + Sync + 'static,
    D: PartialEq,
    F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let api = api.clone();
    let fetch = Fetch::mount(deps, move || call(api.clone()));
    fetch.settled().await
}

/// Run a form submission and print the backend's confirmation.
async fn submit<F, Fut>(producer: F, json: bool) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<MessageResponse, ApiError>>,
{
    let mutation = Mutation::new();
    let response = mutation
        .mutate(producer, MutationCallbacks::new())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    emit(&response, json, |r| println!("{}", r.message))
}

async fn login(
    session: &SessionContext,
    config: &mut Config,
    username: Option<String>,
    json: bool,
) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?,
    };

    match session.login(&Credentials::new(&username, password)).await {
        LoginOutcome::Success(user) => {
            info!(username = %user.username, "Logged in");
            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            emit(&user, json, |u| {
                println!("Logged in as {} ({:?})", u.display_name(), u.role)
            })
        }
        LoginOutcome::Failure { message } => anyhow::bail!(message),
    }
}

async fn whoami(session: &SessionContext, json: bool) -> Result<()> {
    match session.restore().await {
        SessionPhase::Authenticated(user) => emit(&user, json, |u| {
            println!("{} <{}>", u.display_name(), u.email);
            println!("  username: {}", u.username);
            println!("  role:     {:?}", u.role);
            if let Some(last) = &u.last_login {
                println!("  last login: {}", format_datetime(last));
            }
        }),
        _ => {
            if json {
                println!("null");
            } else {
                println!("Not logged in.");
            }
            Ok(())
        }
    }
}

async fn admin(session: &SessionContext, command: AdminCommands, json: bool) -> Result<()> {
    let mut redirects = session.redirects();
    session.restore().await;

    let user = match session.guard_settled().await {
        Access::Granted(user) => user,
        Access::Denied(redirect) => return Err(login_hint(&redirect)),
        Access::Pending => anyhow::bail!("Session is still being validated"),
    };
    debug!(username = %user.username, ?command, "Running admin command");

    let result = run_admin(session.api(), command, json).await;

    // A 401 mid-command logs the session out and publishes a redirect
    if let Ok(redirect) = redirects.try_recv() {
        return Err(login_hint(&redirect));
    }
    result
}

async fn run_admin(api: &ApiClient, command: AdminCommands, json: bool) -> Result<()> {
    match command {
        AdminCommands::Stats => {
            let state = load(api, (), |api| async move { api.admin_stats().await }).await;
            emit_fetch(state, json, |s| {
                println!("Bookings:  {} ({} new)", s.total_bookings, s.pending_bookings);
                println!("Reviews:   {} ({} pending)", s.total_reviews, s.pending_reviews);
                println!("Services:  {}", s.total_services);
                println!("Posts:     {}", s.total_blog_posts);
                println!("Gallery:   {}", s.total_gallery_images);
            })
        }
        AdminCommands::Bookings { status } => {
            let mut state = load(api, (), |api| async move { api.admin_bookings().await }).await;
            if let (Some(filter), Some(bookings)) = (status, state.data.as_mut()) {
                bookings.retain(|b| b.status == filter);
            }
            emit_fetch(state, json, |bookings| {
                for b in bookings {
                    println!(
                        "{:<10} {:<10} {}  {} {}",
                        b.id,
                        b.status.as_str(),
                        format_datetime(&b.created_at),
                        b.name,
                        b.phone
                    );
                    if let Some(message) = &b.message {
                        println!("  {}", truncate(message, REVIEW_PREVIEW_CHARS));
                    }
                }
            })
        }
        AdminCommands::SetStatus { id, status, notes } => {
            submit(
                || api.update_booking_status(&id, status, notes.as_deref()),
                json,
            )
            .await
        }
        AdminCommands::PendingReviews => {
            let state = load(api, (), |api| async move { api.pending_reviews().await }).await;
            emit_fetch(state, json, |reviews| {
                for r in reviews {
                    println!("{}  {} {}", r.id, r.stars(), r.name);
                    println!("  {}", r.text);
                }
            })
        }
        AdminCommands::ApproveReview { id } => submit(|| api.approve_review(&id), json).await,
        AdminCommands::DeleteReview { id } => submit(|| api.delete_review(&id), json).await,
        AdminCommands::DeleteService { id } => submit(|| api.delete_service(&id), json).await,
        AdminCommands::DeletePost { id } => submit(|| api.delete_blog_post(&id), json).await,
        AdminCommands::DeleteNews { id } => submit(|| api.delete_news(&id), json).await,
    }
}

fn login_hint(redirect: &Redirect) -> anyhow::Error {
    let reason = match redirect.reason {
        RedirectReason::SessionExpired => "Session expired",
        RedirectReason::LoginRequired => "Not logged in",
    };
    anyhow::anyhow!("{}. Run `lulu login` first.", reason)
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("Username required");
    }
    Ok(value)
}
