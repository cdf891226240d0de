use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{products, users, vouchers},
    services::{auth_service::hash_password, product_service::slugify, settings_service},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let email = std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
    let password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    ensure_admin(&orm, &email, &password).await?;
    seed_products(&orm).await?;
    seed_vouchers(&orm).await?;
    let settings = settings_service::load(&orm).await?;

    println!(
        "Seed completed. Store: {}",
        settings
            .store_name
            .as_deref()
            .unwrap_or(settings_service::DEFAULT_STORE_NAME)
    );
    Ok(())
}

async fn ensure_admin(orm: &DatabaseConnection, email: &str, password: &str) -> anyhow::Result<()> {
    let admin = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Admin".into()),
        email: Set(email.to_lowercase()),
        password_hash: Set(hash_password(password)?),
        created_at: Set(Utc::now().into()),
    };
    let inserted = users::Entity::insert(admin)
        .on_conflict(OnConflict::column(users::Column::Email).do_nothing().to_owned())
        .exec_without_returning(orm)
        .await?;

    if inserted == 0 {
        println!("Admin {email} already exists");
    } else {
        println!("Created admin {email}");
    }
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let catalog = vec![
        ("Netflix Premium 1 Bulan", "Streaming", 45000, Some(20), "30 hari"),
        ("Spotify Premium 1 Bulan", "Music", 25000, Some(50), "30 hari"),
        ("Canva Pro 1 Tahun", "Design", 60000, None, "365 hari"),
        ("YouTube Premium 1 Bulan", "Streaming", 30000, Some(15), "30 hari"),
    ];

    let now = Utc::now();
    for (name, category, price, stock, duration) in catalog {
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slugify(name)),
            description: Set(Some(format!("Akun {name}"))),
            price: Set(price),
            category: Set(Some(category.to_string())),
            image_url: Set(None),
            duration: Set(Some(duration.to_string())),
            warranty: Set(Some("Full garansi".to_string())),
            product_images: Set(None),
            discount_type: Set(None),
            discount_value: Set(0),
            stock: Set(stock),
            flash_sale_active: Set(false),
            flash_sale_discount_type: Set(None),
            flash_sale_discount_value: Set(None),
            flash_sale_start_at: Set(None),
            flash_sale_end_at: Set(None),
            flash_sale_stock: Set(None),
            flash_sale_sold: Set(0),
            max_qty_per_customer: Set(None),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        products::Entity::insert(product)
            .on_conflict(OnConflict::column(products::Column::Slug).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_vouchers(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now();
    let vouchers = vec![
        ("WELCOME10", "PERCENT", 10, Some(20000), Some(50000), Some(100)),
        ("POTONG5", "FIXED", 5000, None, Some(30000), Some(200)),
    ];

    for (code, kind, value, max_discount, min_order, usage_limit) in vouchers {
        let voucher = vouchers::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            kind: Set(kind.to_string()),
            value: Set(value),
            max_discount: Set(max_discount),
            min_order: Set(min_order),
            usage_limit: Set(usage_limit),
            used_count: Set(0),
            starts_at: Set(None),
            ends_at: Set(None),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        vouchers::Entity::insert(voucher)
            .on_conflict(OnConflict::column(vouchers::Column::Code).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
    }

    println!("Seeded vouchers");
    Ok(())
}
