// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use mesa::auth::AuthService;
use mesa::chat::ChatService;
use mesa::client::ApiClient;
use mesa::config::Config;
use mesa::group::GroupService;
use mesa::menu::MenuService;
use mesa::orders::{CartLine, OrderService};
use mesa::ratings::RatingService;
use mesa::session::SessionSignal;
use mesa::tables::TableService;

/// Table-ordering client.
#[derive(Parser)]
#[command(name = "mesa", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password, or print the Google OAuth URL
    Login {
        #[arg(long, required_unless_present = "google")]
        email: Option<String>,
        #[arg(long, required_unless_present = "google")]
        password: Option<String>,
        /// Print the browser OAuth entry URL instead
        #[arg(long)]
        google: bool,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and clear local credentials
    Logout,
    /// Show the current session
    Whoami,
    /// Browse the menu
    Menu {
        /// Narrow to a category
        #[arg(long)]
        category: Option<String>,
    },
    /// Place an order; items are `menu-item-id` or `menu-item-id:qty`
    Order { items: Vec<String> },
    /// Follow an order until it reaches a terminal status
    Track {
        order_id: String,
        #[arg(long, default_value = "5")]
        interval_secs: u64,
    },
    /// Call a waiter to the configured table
    CallWaiter {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Rate an order (1-5 stars)
    Rate {
        order_id: String,
        stars: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Group ordering
    #[command(subcommand)]
    Group(GroupCommand),
    /// Ask the assistant
    Chat {
        message: String,
        /// Also fetch speech audio and write it here
        #[arg(long)]
        audio_out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    /// Start a group order for the configured table
    Start,
    /// Join a group order by code
    Join {
        code: String,
        #[arg(long, default_value = "guest")]
        name: String,
    },
    /// Stream a group's events until interrupted
    Watch { group_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&cli.config);

    std::process::exit(run(cli).await);
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).init();
        }
    }
}

async fn run(cli: Cli) -> i32 {
    let client = ApiClient::new(&cli.config);

    // Table-scoped guest sessions are issued lazily, before the first
    // authenticated call.
    if let Err(e) = client.ensure_session(cli.config.table.as_deref()).await {
        eprintln!("warning: guest session unavailable: {e}");
    }

    match cli.command {
        Command::Login { email, password, google } => {
            let auth = AuthService::new(client);
            if google {
                println!("Open this URL to sign in with Google:");
                println!("  {}", auth.google_login_url());
                println!();
                println!("Then re-run with --oauth-redirect <returned URL>.");
                return 0;
            }
            let (Some(email), Some(password)) = (email, password) else {
                eprintln!("error: --email and --password are required");
                return 2;
            };
            match auth.login(&email, &password).await {
                Ok(profile) => {
                    println!("Signed in as {} <{}> ({})", profile.name, profile.email, profile.role);
                    0
                }
                Err(e) => fail(&e),
            }
        }

        Command::Register { name, email, password } => {
            match AuthService::new(client).register(&name, &email, &password).await {
                Ok(profile) => {
                    println!("Account created for {} <{}>", profile.name, profile.email);
                    0
                }
                Err(e) => fail(&e),
            }
        }

        Command::Logout => match AuthService::new(client).logout().await {
            Ok(()) => {
                println!("Signed out.");
                0
            }
            Err(e) => {
                // Local credentials are gone either way.
                eprintln!("warning: server logout failed: {e}");
                0
            }
        },

        Command::Whoami => {
            match client.signal() {
                SessionSignal::Anonymous => println!("Not signed in."),
                SessionSignal::OpaqueSession => println!("Signed in (server-managed session)."),
                SessionSignal::Authenticated { subject, role } => {
                    println!("Signed in as {subject} ({role})");
                    if let Some(profile) = AuthService::new(client).cached_profile() {
                        println!("  name:  {}", profile.name);
                        println!("  email: {}", profile.email);
                    }
                }
            }
            0
        }

        Command::Menu { category } => {
            match MenuService::new(client).list(category.as_deref()).await {
                Ok(items) => {
                    let name_w = items.iter().map(|i| i.name.len()).max().unwrap_or(0).max(4);
                    let cat_w = items.iter().map(|i| i.category.len()).max().unwrap_or(0).max(8);
                    println!("{:<name_w$}  {:<cat_w$}  {:>8}  {}", "NAME", "CATEGORY", "PRICE", "ID");
                    for item in &items {
                        let marker = if item.available { "" } else { "  (unavailable)" };
                        println!(
                            "{:<name_w$}  {:<cat_w$}  {:>8}  {}{marker}",
                            item.name,
                            item.category,
                            format_price(item.price),
                            item.id,
                        );
                    }
                    0
                }
                Err(e) => fail(&e),
            }
        }

        Command::Order { items } => {
            let mut lines = Vec::new();
            for spec in &items {
                match parse_cart_line(spec) {
                    Some(line) => lines.push(line),
                    None => {
                        eprintln!("error: invalid item spec: {spec}");
                        return 2;
                    }
                }
            }
            if lines.is_empty() {
                eprintln!("error: no items given");
                return 2;
            }
            match OrderService::new(client).place(&lines, cli.config.table.as_deref()).await {
                Ok(order) => {
                    println!(
                        "Order {} placed: {} ({})",
                        order.id,
                        format_price(order.total),
                        order.status,
                    );
                    0
                }
                Err(e) => fail(&e),
            }
        }

        Command::Track { order_id, interval_secs } => {
            let orders = OrderService::new(client);
            let mut last = None;
            loop {
                match orders.get(&order_id).await {
                    Ok(order) => {
                        if last != Some(order.status) {
                            println!("{}: {}", order.id, order.status);
                            last = Some(order.status);
                        }
                        if order.status.is_terminal() {
                            return 0;
                        }
                    }
                    Err(e) => return fail(&e),
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval_secs.max(1))).await;
            }
        }

        Command::CallWaiter { reason } => {
            let Some(table) = cli.config.table.clone() else {
                eprintln!("error: --table is required to call a waiter");
                return 2;
            };
            match TableService::new(client).call_waiter(&table, reason.as_deref()).await {
                Ok(call) => {
                    println!("Waiter called (request {}).", call.id);
                    0
                }
                Err(e) => fail(&e),
            }
        }

        Command::Rate { order_id, stars, comment } => {
            match RatingService::new(client).submit(&order_id, stars, comment.as_deref()).await {
                Ok(_) => {
                    println!("Thanks for the feedback.");
                    0
                }
                Err(e) => fail(&e),
            }
        }

        Command::Group(cmd) => run_group(client, cli.config.table.as_deref(), cmd).await,

        Command::Chat { message, audio_out } => {
            let chat = ChatService::new(client);
            let reply = match chat.send(&message, &[]).await {
                Ok(r) => r,
                Err(e) => return fail(&e),
            };
            println!("{reply}");
            if let Some(path) = audio_out {
                match chat.tts(&reply).await {
                    Ok(audio) => {
                        if let Err(e) = std::fs::write(&path, &audio) {
                            eprintln!("error: cannot write {}: {e}", path.display());
                            return 1;
                        }
                        println!("(audio written to {})", path.display());
                    }
                    Err(e) => return fail(&e),
                }
            }
            0
        }
    }
}

async fn run_group(client: ApiClient, table: Option<&str>, cmd: GroupCommand) -> i32 {
    let groups = GroupService::new(client);
    match cmd {
        GroupCommand::Start => {
            let Some(table) = table else {
                eprintln!("error: --table is required to start a group order");
                return 2;
            };
            match groups.create(table).await {
                Ok(group) => {
                    println!("Group order {} started.", group.id);
                    println!("Share this join code: {}", group.join_code);
                    0
                }
                Err(e) => fail(&e),
            }
        }
        GroupCommand::Join { code, name } => match groups.join(&code, &name).await {
            Ok(group) => {
                println!("Joined group order {} ({} participants).", group.id, group.participants.len());
                0
            }
            Err(e) => fail(&e),
        },
        GroupCommand::Watch { group_id } => {
            let cancel = CancellationToken::new();
            let mut events = groups.spawn_event_feed(&group_id, cancel.clone());
            println!("Watching group {group_id} (Ctrl+C to stop)...");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        cancel.cancel();
                        return 0;
                    }
                    event = events.recv() => match event {
                        Ok(event) => println!("{event:?}"),
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => return 0,
                    }
                }
            }
        }
    }
}

fn fail(e: &mesa::error::ApiError) -> i32 {
    eprintln!("error: {e}");
    1
}

fn format_price(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn parse_cart_line(spec: &str) -> Option<CartLine> {
    let (id, qty) = match spec.split_once(':') {
        Some((id, qty)) => (id, qty.parse::<u32>().ok()?),
        None => (spec, 1),
    };
    if id.is_empty() || qty == 0 {
        return None;
    }
    Some(CartLine { menu_item_id: id.to_owned(), quantity: qty, notes: None })
}
