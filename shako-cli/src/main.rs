mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Shako - a keyboard-first client for the Noroff social API
#[derive(Parser)]
#[command(name = "shako")]
#[command(about = "Browse posts, comment, react and follow from the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new profile
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Log in and store the session
    Login { email: String, password: String },
    /// Delete the stored session
    Logout,
    /// Show a page of the feed
    Feed {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        limit: u32,
        /// Sort field: created, updated or title
        #[arg(long, default_value = "created")]
        sort: String,
        /// Sort direction: asc or desc
        #[arg(long, default_value = "desc")]
        order: String,
    },
    /// Search posts by text
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        limit: u32,
    },
    /// Operate on a single post
    #[command(subcommand)]
    Post(PostCommands),
    /// Comment on a post, optionally as a reply to another comment
    Comment {
        post_id: String,
        body: String,
        /// Comment id this reply answers
        #[arg(long)]
        reply_to: Option<i64>,
    },
    /// Toggle a reaction symbol on a post
    React { post_id: String, symbol: String },
    /// Show or edit a profile
    #[command(subcommand)]
    Profile(ProfileCommands),
    /// Follow a profile
    Follow { name: String },
    /// Unfollow a profile
    Unfollow { name: String },
}

#[derive(Subcommand)]
enum PostCommands {
    /// Show a post with its comment threads and reactions
    Show { id: String },
    /// Create a new post
    Create {
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        media_url: Option<String>,
        #[arg(long)]
        media_alt: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Edit an existing post
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        media_url: Option<String>,
        #[arg(long)]
        media_alt: Option<String>,
    },
    /// Delete a post
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show a profile with follower stats and recent posts
    Show {
        /// Profile name; defaults to the logged-in user
        name: Option<String>,
    },
    /// Edit the logged-in user's profile
    Edit {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[arg(long)]
        banner_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => commands::register(name, email, password).await,
        Commands::Login { email, password } => commands::login(email, password).await,
        Commands::Logout => commands::logout(),
        Commands::Feed {
            page,
            limit,
            sort,
            order,
        } => commands::feed(page, limit, &sort, &order).await,
        Commands::Search { query, page, limit } => commands::search(&query, page, limit).await,
        Commands::Post(PostCommands::Show { id }) => commands::show_post(&id).await,
        Commands::Post(PostCommands::Create {
            title,
            body,
            media_url,
            media_alt,
            tags,
        }) => commands::create_post(title, body, media_url, media_alt, tags).await,
        Commands::Post(PostCommands::Edit {
            id,
            title,
            body,
            media_url,
            media_alt,
        }) => commands::edit_post(&id, title, body, media_url, media_alt).await,
        Commands::Post(PostCommands::Delete { id }) => commands::delete_post(&id).await,
        Commands::Comment {
            post_id,
            body,
            reply_to,
        } => commands::comment(&post_id, &body, reply_to).await,
        Commands::React { post_id, symbol } => commands::react(&post_id, &symbol).await,
        Commands::Profile(ProfileCommands::Show { name }) => commands::show_profile(name).await,
        Commands::Profile(ProfileCommands::Edit {
            bio,
            avatar_url,
            banner_url,
        }) => commands::edit_profile(bio, avatar_url, banner_url).await,
        Commands::Follow { name } => commands::follow(&name, true).await,
        Commands::Unfollow { name } => commands::follow(&name, false).await,
    }
}
