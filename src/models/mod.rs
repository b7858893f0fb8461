mod account;
mod category;
mod transaction;

pub use account::{Account, AccountType};
pub use category::Category;
pub use transaction::{Split, Transaction};
