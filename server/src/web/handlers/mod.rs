// grocer_server/src/web/handlers/mod.rs

pub mod order_handlers;
pub mod return_handlers;
pub mod rider_handlers;
