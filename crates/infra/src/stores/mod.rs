pub mod cart;
pub mod catalog;
pub mod orders;
pub mod postgres;
pub mod stock;
pub mod voucher;

pub use cart::InMemoryCartStore;
pub use catalog::InMemoryCatalog;
pub use orders::InMemoryOrderStore;
pub use postgres::{PgStockLedger, PgVoucherLedger};
pub use stock::InMemoryStockLedger;
pub use voucher::InMemoryVoucherLedger;
