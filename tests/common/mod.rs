#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{
    config::{AppConfig, ReservationMode},
    db::{create_orm_conn, run_migrations},
    dto::orders::{CreateOrderItem, CreateOrderRequest, OrderPlaced},
    entity::{orders, products, users, vouchers},
    error::{AppError, AppResult, RuleViolation},
    middleware::auth::AdminUser,
    notify::{Delivery, Notifier},
    services::{order_service, payment_proof_service::ProofUpload},
    state::AppState,
    storage::LocalStorage,
};
use tempfile::TempDir;
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub const ADMIN_WHATSAPP: &str = "6280000000000";

/// Captures outgoing messages; can be switched to fail every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, target: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == target)
            .map(|(_, message)| message)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, target: &str, message: &str) -> Delivery {
        if self.failing.load(Ordering::SeqCst) {
            return Delivery::failed("gateway down");
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((target.to_string(), message.to_string()));
        }
        Delivery::delivered()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    storage_dir: TempDir,
}

impl TestApp {
    pub fn stored_proofs(&self) -> usize {
        std::fs::read_dir(self.storage_dir.path().join("payment-proofs"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn product(&self, id: Uuid) -> products::Model {
        products::Entity::find_by_id(id)
            .one(&self.state.orm)
            .await
            .expect("query product")
            .expect("product exists")
    }

    pub async fn voucher(&self, id: Uuid) -> vouchers::Model {
        vouchers::Entity::find_by_id(id)
            .one(&self.state.orm)
            .await
            .expect("query voucher")
            .expect("voucher exists")
    }
}

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`). Returns `None` when
/// neither is set so database tests can be skipped.
pub async fn setup(reservation: ReservationMode) -> anyhow::Result<Option<TestApp>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&orm).await })
        .await?;

    let storage_dir = tempfile::tempdir()?;
    let mut config = AppConfig::for_database(database_url);
    config.reservation = reservation;
    config.storage_dir = storage_dir.path().to_path_buf();
    config.notify.admin_whatsapp = Some(ADMIN_WHATSAPP.into());
    config.order_code_prefix = "TST-".into();

    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
        orm,
        storage: LocalStorage::new(storage_dir.path(), &config.public_url)?,
        config: Arc::new(config),
        notifier: notifier.clone(),
    };

    Ok(Some(TestApp {
        state,
        notifier,
        storage_dir,
    }))
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_uppercase()
}

/// A WhatsApp number no other test uses.
pub fn whatsapp() -> String {
    format!("62899{:010}", Uuid::new_v4().as_u128() % 10_000_000_000)
}

/// Active product with no discount; tweak fields before inserting.
pub fn new_product(price: i64, stock: Option<i32>) -> products::ActiveModel {
    let suffix = unique_suffix();
    let now = Utc::now();
    products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Test Product {suffix}")),
        slug: Set(format!("test-product-{}", suffix.to_lowercase())),
        description: Set(None),
        price: Set(price),
        category: Set(Some("Test".into())),
        image_url: Set(None),
        duration: Set(Some("30 hari".into())),
        warranty: Set(None),
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
    }
}

/// A running flash sale at `percent` off with a `quota` of units.
pub fn with_flash_sale(mut product: products::ActiveModel, percent: i64, quota: i32) -> products::ActiveModel {
    let now = Utc::now();
    product.flash_sale_active = Set(true);
    product.flash_sale_discount_type = Set(Some("PERCENT".into()));
    product.flash_sale_discount_value = Set(Some(percent));
    product.flash_sale_start_at = Set(Some((now - chrono::Duration::hours(1)).into()));
    product.flash_sale_end_at = Set(Some((now + chrono::Duration::hours(1)).into()));
    product.flash_sale_stock = Set(Some(quota));
    product
}

pub async fn insert_product(app: &TestApp, product: products::ActiveModel) -> products::Model {
    product.insert(&app.state.orm).await.expect("insert product")
}

/// Active voucher with a unique code and no limits.
pub fn new_voucher(kind: &str, value: i64) -> vouchers::ActiveModel {
    let now = Utc::now();
    vouchers::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(format!("T{}", unique_suffix())),
        kind: Set(kind.into()),
        value: Set(value),
        max_discount: Set(None),
        min_order: Set(None),
        usage_limit: Set(None),
        used_count: Set(0),
        starts_at: Set(None),
        ends_at: Set(None),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

pub async fn insert_voucher(app: &TestApp, voucher: vouchers::ActiveModel) -> vouchers::Model {
    voucher.insert(&app.state.orm).await.expect("insert voucher")
}

pub async fn insert_admin(app: &TestApp) -> AdminUser {
    let suffix = unique_suffix().to_lowercase();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Test Admin".into()),
        email: Set(format!("admin-{suffix}@example.com")),
        password_hash: Set("not-a-real-hash".into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&app.state.orm)
    .await
    .expect("insert admin");

    AdminUser {
        user_id: user.id,
        session_id: Uuid::new_v4(),
        name: user.name,
        email: user.email,
    }
}

/// A minimal upload that passes the PNG signature check.
pub fn png_upload() -> ProofUpload {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 64]);
    ProofUpload {
        file_name: "transfer.png".into(),
        bytes,
    }
}

/// Unwraps the business rule a call was rejected with.
pub fn rule_of<T>(result: AppResult<T>) -> RuleViolation {
    match result {
        Ok(_) => panic!("expected a rule violation, call succeeded"),
        Err(AppError::Rule(rule)) => rule,
        Err(other) => panic!("expected a rule violation, got {other:?}"),
    }
}

/// Checkout payload for `(product_id, qty, is_flash_sale)` lines.
pub fn order_request(
    whatsapp: &str,
    items: &[(Uuid, i32, bool)],
    voucher_code: Option<&str>,
) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_name: "Budi".into(),
        customer_whatsapp: whatsapp.into(),
        voucher_code: voucher_code.map(str::to_string),
        items: items
            .iter()
            .map(|&(product_id, qty, flash)| CreateOrderItem {
                product_id,
                qty,
                is_flash_sale: Some(flash),
            })
            .collect(),
    }
}

pub async fn place(app: &TestApp, request: CreateOrderRequest) -> OrderPlaced {
    order_service::place_order(&app.state, request)
        .await
        .expect("order placed")
        .data
        .expect("order data")
}

pub async fn load_order(app: &TestApp, id: Uuid) -> orders::Model {
    orders::Entity::find_by_id(id)
        .one(&app.state.orm)
        .await
        .expect("query order")
        .expect("order exists")
}
