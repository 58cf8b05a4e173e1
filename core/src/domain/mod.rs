// grocer/src/domain/mod.rs

//! Entities the order lifecycle reads and writes.

pub mod actor;
pub mod catalog;
pub mod order;
pub mod return_request;
pub mod rider;

pub use actor::{Actor, Role};
pub use catalog::{PriceOption, ShopProduct};
pub use order::{AddressSnapshot, Order, OrderDetails, OrderHistoryEntry, OrderItem, OrderStatus, PaymentMethod};
pub use return_request::{ReturnDecision, ReturnHistoryEntry, ReturnRequest, ReturnStatus};
pub use rider::{GeoPoint, Rider};
