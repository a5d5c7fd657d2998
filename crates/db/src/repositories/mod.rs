//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool` as the first argument. Methods that must run inside a caller's
//! transaction take `&mut PgConnection` instead (pass `&mut *tx`).

pub mod category_repo;
pub mod item_repo;
pub mod offer_repo;
pub mod order_repo;
pub mod review_repo;
pub mod settings_repo;
pub mod slider_repo;
pub mod user_repo;

pub use category_repo::CategoryRepo;
pub use item_repo::ItemRepo;
pub use offer_repo::OfferRepo;
pub use order_repo::OrderRepo;
pub use review_repo::ReviewRepo;
pub use settings_repo::SettingsRepo;
pub use slider_repo::SliderRepo;
pub use user_repo::UserRepo;
