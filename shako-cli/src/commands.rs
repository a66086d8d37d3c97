use anyhow::{anyhow, bail, Context, Result};
use shako_client::{
    build_threads, ApiClient, ClientConfig, FeedPage, FeedQuery, ReactionPanel, Session,
    SessionStore,
};
use shako_types::{
    CreatePostRequest, LoginRequest, Media, Post, RegisterRequest, SortDirection, SortField,
    UpdateProfileRequest,
};

fn client() -> Result<ApiClient> {
    Ok(ApiClient::new(ClientConfig::from_env()?))
}

/// Load the stored session and attach its token to a fresh client.
fn authed() -> Result<(ApiClient, Session)> {
    let store = SessionStore::new()?;
    let session = store
        .load()?
        .ok_or_else(|| anyhow!("Not logged in; run `shako login <email> <password>` first"))?;
    let mut api = client()?;
    api.set_access_token(Some(session.access_token.clone()));
    Ok((api, session))
}

fn media_from(url: Option<String>, alt: Option<String>) -> Option<Media> {
    url.map(|url| Media {
        url,
        alt: alt.unwrap_or_default(),
    })
}

pub async fn register(name: String, email: String, password: String) -> Result<()> {
    let api = client()?;
    let profile = api
        .register(&RegisterRequest {
            name,
            email,
            password,
        })
        .await?;
    println!("Registered {} <{}>. Log in to get started.", profile.name, profile.email);
    Ok(())
}

pub async fn login(email: String, password: String) -> Result<()> {
    let mut api = client()?;
    let data = api.login(&LoginRequest { email, password }).await?;
    let session = Session {
        access_token: data.access_token,
        name: data.name,
        email: data.email,
        avatar: data.avatar,
    };
    SessionStore::new()?
        .save(&session)
        .context("Logged in, but the session could not be stored")?;
    println!("Logged in as {}.", session.name);
    Ok(())
}

pub fn logout() -> Result<()> {
    SessionStore::new()?.delete()?;
    println!("Logged out.");
    Ok(())
}

fn parse_feed_query(page: u32, limit: u32, sort: &str, order: &str) -> Result<FeedQuery> {
    let sort = SortField::parse(sort)
        .ok_or_else(|| anyhow!("Unknown sort field '{sort}' (created, updated or title)"))?;
    let direction = SortDirection::parse(order)
        .ok_or_else(|| anyhow!("Unknown sort direction '{order}' (asc or desc)"))?;
    Ok(FeedQuery {
        limit,
        page,
        sort,
        direction,
    })
}

fn print_post_line(post: &Post) {
    let author = post
        .author
        .as_ref()
        .map(|a| a.name.as_str())
        .unwrap_or("unknown");
    println!(
        "{}  {}  by {}  ({} comments, {} reactions)",
        post.created.format("%Y-%m-%d %H:%M"),
        post.title,
        author,
        post.counts.comments,
        post.counts.reactions,
    );
    println!("    id: {}", post.id);
}

fn print_page(page: &FeedPage) {
    for post in &page.posts {
        print_post_line(post);
    }
    if page.posts.is_empty() {
        println!("No posts.");
    }
    println!(
        "\nPage {} of {} ({} posts total)",
        page.meta.current_page, page.meta.page_count, page.meta.total_count
    );
    // Navigation hints follow the service flags, not recomputed bounds.
    match (page.previous_page(), page.next_page()) {
        (Some(prev), Some(next)) => println!("Use --page {prev} or --page {next} to navigate."),
        (Some(prev), None) => println!("Use --page {prev} to go back."),
        (None, Some(next)) => println!("Use --page {next} for more."),
        (None, None) => {}
    }
}

pub async fn feed(page: u32, limit: u32, sort: &str, order: &str) -> Result<()> {
    let (api, _session) = authed()?;
    let query = parse_feed_query(page, limit, sort, order)?;
    let (posts, meta) = api.get_posts(&query).await?;
    print_page(&FeedPage::new(posts, meta));
    Ok(())
}

pub async fn search(q: &str, page: u32, limit: u32) -> Result<()> {
    let (api, _session) = authed()?;
    let query = FeedQuery {
        limit,
        page,
        ..FeedQuery::default()
    };
    let (posts, meta) = api.search_posts(q, &query).await?;
    print_page(&FeedPage::new(posts, meta));
    Ok(())
}

pub async fn show_post(id: &str) -> Result<()> {
    let (api, _session) = authed()?;
    let post = api.get_post(id).await?;

    println!("{}", post.title);
    if let Some(author) = &post.author {
        println!("by {} on {}", author.name, post.created.format("%Y-%m-%d %H:%M"));
    }
    if !post.tags.is_empty() {
        println!("tags: {}", post.tags.join(", "));
    }
    if let Some(body) = &post.body {
        println!("\n{body}");
    }

    let reactions = post.reactions.clone().unwrap_or_default();
    if !reactions.is_empty() {
        let summary: Vec<String> = reactions
            .iter()
            .map(|r| format!("{} {}", r.symbol, r.count))
            .collect();
        println!("\nReactions: {}", summary.join("  "));
    }

    let comments = post.comments.clone().unwrap_or_default();
    let threads = build_threads(&comments);
    println!("\n{} comments", comments.len());
    for thread in &threads {
        println!(
            "\n[{}] {}: {}",
            thread.root.id, thread.root.author.name, thread.root.body
        );
        for reply in &thread.replies {
            match &reply.replying_to_name {
                Some(name) => println!(
                    "    [{}] {} @{}: {}",
                    reply.comment.id, reply.comment.author.name, name, reply.comment.body
                ),
                None => println!(
                    "    [{}] {}: {}",
                    reply.comment.id, reply.comment.author.name, reply.comment.body
                ),
            }
        }
    }
    Ok(())
}

pub async fn create_post(
    title: String,
    body: Option<String>,
    media_url: Option<String>,
    media_alt: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("Title is required");
    }
    let (api, _session) = authed()?;
    let post = api
        .create_post(&CreatePostRequest {
            title,
            body,
            media: media_from(media_url, media_alt),
            tags,
        })
        .await?;
    println!("Created post {}.", post.id);
    Ok(())
}

pub async fn edit_post(
    id: &str,
    title: Option<String>,
    body: Option<String>,
    media_url: Option<String>,
    media_alt: Option<String>,
) -> Result<()> {
    let (api, _session) = authed()?;
    // The update endpoint replaces the post, so start from the
    // current values and apply the changed fields.
    let current = api.get_post(id).await?;
    let request = CreatePostRequest {
        title: title.unwrap_or(current.title),
        body: body.or(current.body),
        media: media_from(media_url, media_alt).or(current.media),
        tags: current.tags,
    };
    let post = api.update_post(id, &request).await?;
    println!("Updated post {}.", post.id);
    Ok(())
}

pub async fn delete_post(id: &str) -> Result<()> {
    let (api, _session) = authed()?;
    api.delete_post(id).await?;
    println!("Deleted post {id}.");
    Ok(())
}

pub async fn comment(post_id: &str, body: &str, reply_to: Option<i64>) -> Result<()> {
    let (api, _session) = authed()?;
    let comment = api.create_comment(post_id, body, reply_to).await?;
    match reply_to {
        Some(parent) => println!("Posted reply {} to comment {parent}.", comment.id),
        None => println!("Posted comment {}.", comment.id),
    }
    Ok(())
}

pub async fn react(post_id: &str, symbol: &str) -> Result<()> {
    let (api, session) = authed()?;
    let post = api.get_post(post_id).await?;
    let mut panel = ReactionPanel::new(post.reactions.unwrap_or_default());

    let had_reacted = panel
        .reactions()
        .iter()
        .any(|r| r.symbol == symbol && r.reactors.iter().any(|n| n == &session.name));

    panel
        .toggle_remote(&api, post_id, &session.name, symbol)
        .await?;

    if had_reacted {
        println!("Removed {symbol} from post {post_id}.");
    } else {
        println!("Reacted with {symbol} on post {post_id}.");
    }
    let summary: Vec<String> = panel
        .reactions()
        .iter()
        .map(|r| format!("{} {}", r.symbol, r.count))
        .collect();
    if !summary.is_empty() {
        println!("Now: {}", summary.join("  "));
    }
    Ok(())
}

pub async fn show_profile(name: Option<String>) -> Result<()> {
    let (api, session) = authed()?;
    let name = name.unwrap_or_else(|| session.name.clone());
    let profile = api.get_profile(&name, true).await?;

    println!("{} <{}>", profile.name, profile.email);
    if let Some(bio) = &profile.bio {
        println!("{bio}");
    }
    println!(
        "{} posts, {} followers, {} following",
        profile.counts.posts, profile.counts.followers, profile.counts.following
    );
    if profile.name != session.name && profile.is_followed_by(&session.name) {
        println!("You follow {}.", profile.name);
    }

    let (posts, meta) = api.get_profile_posts(&name, &FeedQuery::default()).await?;
    if !posts.is_empty() {
        println!("\nRecent posts:");
        print_page(&FeedPage::new(posts, meta));
    }
    Ok(())
}

pub async fn edit_profile(
    bio: Option<String>,
    avatar_url: Option<String>,
    banner_url: Option<String>,
) -> Result<()> {
    if bio.is_none() && avatar_url.is_none() && banner_url.is_none() {
        bail!("Nothing to change; pass --bio, --avatar-url or --banner-url");
    }
    let (api, session) = authed()?;
    let request = UpdateProfileRequest {
        bio,
        avatar: avatar_url.map(|url| Media {
            alt: format!("{}'s avatar", session.name),
            url,
        }),
        banner: banner_url.map(|url| Media {
            alt: format!("{}'s banner", session.name),
            url,
        }),
    };
    let profile = api.update_profile(&session.name, &request).await?;
    println!("Updated profile {}.", profile.name);
    Ok(())
}

pub async fn follow(name: &str, following: bool) -> Result<()> {
    let (api, session) = authed()?;
    if name == session.name {
        bail!("You cannot follow yourself");
    }
    if following {
        api.follow(name).await?;
        println!("Now following {name}.");
    } else {
        api.unfollow(name).await?;
        println!("Unfollowed {name}.");
    }
    Ok(())
}
