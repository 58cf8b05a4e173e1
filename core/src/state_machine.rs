// grocer/src/state_machine.rs

//! The order transition table.
//!
//! Every status change an actor may request is one row below. A request that
//! matches no row is an invalid transition, including a request for the
//! status the order is already in.

use crate::domain::{OrderStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
  pub role: Role,
  pub from: &'static [OrderStatus],
  pub to: OrderStatus,
  /// The acting rider must be the order's assigned rider.
  pub requires_assigned_rider: bool,
  pub requires_otp: bool,
  pub restores_stock: bool,
  pub cancels: bool,
  /// Confirmation hands the order straight to the shop's only available rider.
  pub may_auto_assign: bool,
}

const fn edge(role: Role, from: &'static [OrderStatus], to: OrderStatus) -> Edge {
  Edge {
    role,
    from,
    to,
    requires_assigned_rider: false,
    requires_otp: false,
    restores_stock: false,
    cancels: false,
    may_auto_assign: false,
  }
}

const fn cancel(role: Role, from: &'static [OrderStatus]) -> Edge {
  Edge {
    restores_stock: true,
    cancels: true,
    ..edge(role, from, OrderStatus::Cancelled)
  }
}

use OrderStatus::*;

pub const ORDER_EDGES: &[Edge] = &[
  Edge {
    may_auto_assign: true,
    ..edge(Role::Shopkeeper, &[Pending], Confirmed)
  },
  edge(Role::Shopkeeper, &[Pending], Preparing),
  edge(Role::Shopkeeper, &[Pending], Ready),
  cancel(Role::Shopkeeper, &[Pending]),
  Edge {
    requires_assigned_rider: true,
    ..edge(Role::Rider, &[Confirmed, Ready], Shipped)
  },
  Edge {
    requires_assigned_rider: true,
    requires_otp: true,
    ..edge(Role::Rider, &[Shipped], Delivered)
  },
  Edge {
    requires_assigned_rider: true,
    ..cancel(Role::Rider, &[Confirmed, Shipped])
  },
  cancel(Role::Customer, &[Pending, Confirmed]),
];

pub fn find_edge(role: Role, from: OrderStatus, to: OrderStatus) -> Option<&'static Edge> {
  ORDER_EDGES
    .iter()
    .find(|e| e.role == role && e.to == to && e.from.contains(&from))
}

/// Targets `role` may move an order in `from` to.
pub fn allowed_targets(role: Role, from: OrderStatus) -> Vec<OrderStatus> {
  ORDER_EDGES
    .iter()
    .filter(|e| e.role == role && e.from.contains(&from))
    .map(|e| e.to)
    .collect()
}
