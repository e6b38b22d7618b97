pub mod catalog;
pub mod checkout;
pub mod identity;
pub mod membership;
pub mod tenant;
