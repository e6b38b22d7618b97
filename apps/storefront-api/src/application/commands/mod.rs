pub mod add_to_cart;
pub mod create_address;
pub mod create_product;
pub mod create_tenant;
pub mod issue_session;
pub mod place_order;
pub mod set_active_tenant;
pub mod update_tenant;
