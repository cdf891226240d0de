pub mod admin_sessions;
pub mod audit_logs;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod site_settings;
pub mod stocks;
pub mod users;
pub mod vouchers;

pub use admin_sessions::Entity as AdminSessions;
pub use audit_logs::Entity as AuditLogs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use site_settings::Entity as SiteSettings;
pub use stocks::Entity as Stocks;
pub use users::Entity as Users;
pub use vouchers::Entity as Vouchers;
