use std::path::PathBuf;
use clap::Parser;
use tracing::{error, info, Instrument};
use sapjuice::app_system::{setup_tracing, OrderSystem};
use sapjuice::config::Config;
use sapjuice::domain::{LineItem, OrderStatus, ProfileCreate, ReviewDraft};
use sapjuice::lifecycle::PlaceOrder;
use sapjuice::reviews::{average_rating, submit_review};
use sapjuice::stores::{OrderQuery, ProfileStore, ReviewStore};

/// Walks one customer through ordering, tracking and reviewing a juice.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };

    setup_tracing(&config.log_filter);
    info!("Starting SapJuice order demo");

    let system = OrderSystem::new(&config);

    let span = tracing::info_span!("signup");
    let user_id = async {
        info!("Creating customer profile");
        let user_id = system
            .profile_client
            .create_profile(ProfileCreate::new("Alice", "alice@example.com", "9876543210"))
            .await?;
        // Points from earlier orders.
        system.profile_client.set_balance(&user_id, 100).await?;
        Ok::<_, sapjuice::profile_actor::ProfileError>(user_id)
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    info!(user_id = %user_id, "Customer ready");

    let cart = vec![
        LineItem::new("orange", "Orange Sunrise", 150),
        LineItem::new("beet", "Beet It", 150),
    ];
    let subtotal: u64 = cart.iter().map(|item| item.unit_price).sum();
    let redeem = system.lifecycle.redeemable_points(&user_id, subtotal).await;

    let span = tracing::info_span!("checkout");
    let placed = async {
        info!(redeem, "Placing order");
        system
            .lifecycle
            .place_order(
                PlaceOrder::new(user_id.clone(), cart, "12 MG Road, Bengaluru")
                    .with_notes("Less ice please")
                    .redeem(redeem)
                    .save_address(),
            )
            .await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    info!(
        order_code = %placed.code,
        total = placed.total,
        points_balance = placed.points_balance,
        "Order placed"
    );

    let mut tracker = system.track(placed.code.clone()).await;
    if let Some(status) = tracker.wait_for(|s| *s != OrderStatus::Placed).await {
        info!(status = %status, "Tracker moved on: {}", status.description());
    }

    for status in [OrderStatus::OutForDelivery, OrderStatus::Delivered] {
        match system.admin.update_status(&placed.code, status).await {
            Ok(change) => info!(applied = change.is_applied(), status = %change.snapshot().status, "Admin update"),
            Err(e) => error!(error = %e, "Admin update failed"),
        }
    }
    tracker.wait_for(|s| s.is_terminal()).await;
    tracker.close().await;

    match system.admin.list_orders(&OrderQuery::new()).await {
        Ok(page) => info!(orders = page.orders.len(), "Admin dashboard loaded"),
        Err(e) => error!(error = %e, "Admin listing failed"),
    }

    let draft = ReviewDraft::new("orange", "", 5, 4).with_comment("Fresh and tangy");
    if let Err(e) = submit_review(&system.review_client, draft).await {
        error!(error = %e, "Review submission failed");
    }
    match system.review_client.list_reviews_for_item("orange").await {
        Ok(reviews) => info!(count = reviews.len(), average = average_rating(&reviews), "Orange Sunrise rating"),
        Err(e) => error!(error = %e, "Could not load reviews"),
    }

    info!(delivered = placed.notification.await.unwrap_or(false), "Admin notification outcome");

    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Demo completed successfully");
    Ok(())
}
