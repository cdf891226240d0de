use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        orders::{
            CreateOrderItem, CreateOrderRequest, OrderList, OrderPlaced, OrderUpdated,
            OrderWithItems, ProofAccepted, UpdateOrderRequest,
        },
        products::{ProductList, ProductRemoved, ProductRequest},
        settings::UpdateSettingsRequest,
        stocks::{StockList, StockRequest},
        vouchers::{ValidateVoucherRequest, VoucherList, VoucherPreview, VoucherRequest},
    },
    models::{DiscountType, Order, OrderItem, OrderStatus, Product, SiteSetting, Stock, User, Voucher},
    response::{ApiResponse, Meta},
    routes::{admin, auth, health, orders, params, products, settings, vouchers},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("opaque token")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        settings::get_settings,
        orders::create_order,
        orders::get_order,
        orders::upload_payment_proof,
        vouchers::validate_voucher,
        auth::login,
        auth::logout,
        admin::list_orders,
        admin::get_order,
        admin::update_order,
        admin::list_products,
        admin::get_product,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_vouchers,
        admin::create_voucher,
        admin::update_voucher,
        admin::delete_voucher,
        admin::list_stocks,
        admin::create_stock,
        admin::update_stock,
        admin::delete_stock,
        admin::get_settings,
        admin::update_settings
    ),
    components(
        schemas(
            User,
            Product,
            Voucher,
            Order,
            OrderItem,
            OrderStatus,
            DiscountType,
            Stock,
            SiteSetting,
            health::HealthData,
            CreateOrderItem,
            CreateOrderRequest,
            OrderPlaced,
            OrderWithItems,
            OrderList,
            ProofAccepted,
            UpdateOrderRequest,
            OrderUpdated,
            ValidateVoucherRequest,
            VoucherPreview,
            VoucherRequest,
            VoucherList,
            ProductRequest,
            ProductList,
            ProductRemoved,
            StockRequest,
            StockList,
            UpdateSettingsRequest,
            LoginRequest,
            LoginResponse,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<health::HealthData>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<SiteSetting>,
            ApiResponse<OrderPlaced>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ProofAccepted>,
            ApiResponse<OrderUpdated>,
            ApiResponse<VoucherPreview>,
            ApiResponse<Voucher>,
            ApiResponse<VoucherList>,
            ApiResponse<Stock>,
            ApiResponse<StockList>,
            ApiResponse<LoginResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Storefront catalog"),
        (name = "Settings", description = "Public store settings"),
        (name = "Orders", description = "Checkout and payment proof"),
        (name = "Vouchers", description = "Voucher preview"),
        (name = "Auth", description = "Admin sessions"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
