//! # Seed Data Generator
//!
//! Populates the database with development data: a small catalog (with a
//! bundle), loyalty tiers, customers, a wholesaler, a promotion, and a
//! gift card.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p reef-db --bin seed
//!
//! # Specify database path
//! cargo run -p reef-db --bin seed -- --db ./data/reef.db
//! ```

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use reef_core::types::{
    BundleComponent, Customer, GiftCard, LoyaltyTier, Product, Promotion, PromotionKind,
    Wholesaler,
};
use reef_db::{Database, DbConfig};

/// Catalog seeded per category: (name, price_laari, wholesale_laari, stock).
const CATALOG: &[(&str, &[(&str, i64, i64, i64)])] = &[
    (
        "BEVERAGES",
        &[
            ("Rehendhi Juice 500ml", 1500, 900, 48),
            ("Kurumba Water 1.5L", 1200, 700, 60),
            ("Lime Fizz 330ml", 1000, 550, 72),
            ("Black Tea 100 bags", 3500, 2200, 20),
        ],
    ),
    (
        "GROCERY",
        &[
            ("Tuna Can 185g", 1800, 1100, 96),
            ("Basmathi Rice 5kg", 9500, 7000, 25),
            ("Wheat Flour 1kg", 1600, 1000, 40),
            ("Sugar 1kg", 1400, 900, 40),
            ("Rihaakuru Jar 250g", 4500, 3000, 18),
        ],
    ),
    (
        "BAKERY",
        &[
            ("Roshi Pack", 500, 250, 50),
            ("Sweet Bun", 700, 350, 30),
            ("Hedhika Platter", 2500, 1400, 10),
        ],
    ),
    (
        "HOUSEHOLD",
        &[
            ("Dish Soap 500ml", 2200, 1300, 24),
            ("Laundry Powder 1kg", 3800, 2400, 16),
            ("Mosquito Coils 10pk", 1800, 1100, 32),
        ],
    ),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./reef.db".to_string());
    tracing::info!(db = %db_path, "Seeding database");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(?e, "Failed to open database");
            std::process::exit(1);
        }
    };

    if let Err(e) = seed(&db).await {
        tracing::error!(?e, "Seeding failed");
        std::process::exit(1);
    }

    tracing::info!("Seeding complete");
}

fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}

async fn seed(db: &Database) -> Result<(), reef_db::DbError> {
    let now = Utc::now();

    // ------------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------------
    let mut roshi_id = String::new();
    let mut tuna_id = String::new();

    for (category, items) in CATALOG {
        for (name, price, wholesale, stock) in *items {
            let id = Uuid::new_v4().to_string();
            if *name == "Roshi Pack" {
                roshi_id = id.clone();
            }
            if *name == "Tuna Can 185g" {
                tuna_id = id.clone();
            }

            db.products()
                .insert(&Product {
                    id,
                    name: name.to_string(),
                    category: category.to_string(),
                    price_laari: *price,
                    wholesale_price_laari: *wholesale,
                    stock: *stock,
                    is_bundle: false,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
        }
    }

    // A breakfast bundle: 2 roshi packs + 1 tuna can. Its own stock stays
    // zero; the till derives it from the components.
    let bundle_id = Uuid::new_v4().to_string();
    db.products()
        .insert(&Product {
            id: bundle_id.clone(),
            name: "Breakfast Bundle".to_string(),
            category: "BUNDLES".to_string(),
            price_laari: 2600,
            wholesale_price_laari: 1600,
            stock: 0,
            is_bundle: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;
    db.products()
        .set_components(
            &bundle_id,
            &[
                BundleComponent {
                    bundle_id: bundle_id.clone(),
                    component_id: roshi_id,
                    quantity: 2,
                },
                BundleComponent {
                    bundle_id: bundle_id.clone(),
                    component_id: tuna_id,
                    quantity: 1,
                },
            ],
        )
        .await?;

    // ------------------------------------------------------------------------
    // Loyalty tiers
    // ------------------------------------------------------------------------
    for (id, name, min_points, multiplier) in [
        ("tier-bronze", "Bronze", 0, 10000),
        ("tier-silver", "Silver", 500, 12500),
        ("tier-gold", "Gold", 2000, 15000),
    ] {
        db.customers()
            .insert_tier(&LoyaltyTier {
                id: id.to_string(),
                name: name.to_string(),
                min_points,
                point_multiplier_bps: multiplier,
            })
            .await?;
    }

    // ------------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------------
    for (name, phone, limit) in [
        ("Aminath Shifa", "7771234", Some(100_000)),
        ("Hassan Rasheed", "9990011", None),
        ("Mariyam Waheedha", "7654321", Some(250_000)),
    ] {
        db.customers()
            .insert(&Customer {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                phone: Some(phone.to_string()),
                max_credit_limit_laari: limit,
                credit_blocked: false,
                loyalty_points: 0,
                loyalty_tier_id: None,
                created_at: now,
            })
            .await?;
    }

    // ------------------------------------------------------------------------
    // Wholesaler, promotion, gift card
    // ------------------------------------------------------------------------
    db.purchase_orders()
        .insert_wholesaler(&Wholesaler {
            id: Uuid::new_v4().to_string(),
            name: "Male' Traders".to_string(),
            contact: Some("3325544".to_string()),
            created_at: now,
        })
        .await?;

    db.promotions()
        .insert(&Promotion {
            id: Uuid::new_v4().to_string(),
            code: "EID10".to_string(),
            kind: PromotionKind::Percentage,
            value: 1000, // 10%
            is_active: true,
            created_at: now,
        })
        .await?;

    db.gift_cards()
        .issue(&GiftCard {
            id: "GC-WELCOME".to_string(),
            initial_balance_laari: 5000,
            current_balance_laari: 5000,
            is_enabled: true,
            customer_id: None,
            expires_at: Some(now + Duration::days(365)),
            created_at: now,
        })
        .await?;

    Ok(())
}
