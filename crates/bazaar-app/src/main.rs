mod seed;

use tracing::info;

use bazaar_core::Marketplace;
use bazaar_db::OWNER_USER_ID;
use bazaar_types::api::{CatalogFilter, ModerationDecision, RegisterRequest};
use bazaar_types::models::{MessageKind, Role};

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar=debug".into()),
        )
        .init();

    // Config
    let seed_catalog = std::env::var("BAZAAR_SEED").map(|v| v != "0").unwrap_or(true);

    // The store is built once here and handed by reference to everything
    // else; all state is in-memory and gone when the process exits.
    let mut store = Marketplace::open()?;

    if seed_catalog {
        seed::sample_catalog(&store)?;
    }

    walkthrough(&mut store)?;

    let listed = store.browse(&CatalogFilter::default())?;
    info!(assets = listed.len(), "catalog at exit");
    for asset in &listed {
        info!(
            title = %asset.title,
            price = asset.price,
            downloads = asset.download_count,
            rating = asset.rating,
            "  listed"
        );
    }

    Ok(())
}

/// A scripted session standing in for the interactive client.
fn walkthrough(store: &mut Marketplace) -> anyhow::Result<()> {
    // A creator signs up; the issued code stands in for a delivered email.
    let req = RegisterRequest {
        username: "demo_creator".to_string(),
        email: "creator@demo.dev".to_string(),
        password: "pw123456".to_string(),
        confirm_password: "pw123456".to_string(),
        role: Role::Creator,
    };
    let code = store.request_register_otp(&req)?;
    let creator = store.register(req, &code)?;

    let submission = store.upload(
        creator.id,
        bazaar_types::api::UploadRequest {
            title: "Handpainted Crates".to_string(),
            description: "A set of nine stylized wooden crates.".to_string(),
            category: "Models".to_string(),
            tags: vec!["props".to_string(), "stylized".to_string()],
            price: 0.0,
            is_free: true,
            file_size: "2.4 MB".to_string(),
            thumbnail: String::new(),
            images: vec![],
        },
    )?;
    info!(status = submission.status.as_str(), "submission queued for review");

    store.moderate(OWNER_USER_ID, submission.id, ModerationDecision::Approve)?;
    store.logout();

    // A regular user signs up, grabs the free asset, and rates it.
    let req = RegisterRequest {
        username: "demo_user".to_string(),
        email: "user@demo.dev".to_string(),
        password: "pw123456".to_string(),
        confirm_password: "pw123456".to_string(),
        role: Role::User,
    };
    let code = store.request_register_otp(&req)?;
    let user = store.register(req, &code)?;

    store.download(user.id, submission.id)?;
    store.rate(user.id, submission.id, 5, "exactly what I needed")?;
    store.follow(user.id, creator.id)?;
    store.post_chat(user.id, "showcase", "check out these crates!")?;
    store.send_message(user.id, creator.id, "thanks for sharing", MessageKind::Chat)?;

    let ticket = store.open_ticket(user.id, OWNER_USER_ID, "How do I become a creator?")?;
    store.post_to_ticket(OWNER_USER_ID, ticket.id, "Re-register with the creator role.")?;
    store.resolve_ticket(OWNER_USER_ID, ticket.id)?;

    info!(
        unread = store.unread_count(creator.id)?,
        followers = store.user(creator.id)?.followers.len(),
        "walkthrough complete"
    );
    Ok(())
}
