// grocer/src/domain/return_request.rs

use super::actor::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
  Requested,
  Approved,
  Rejected,
  PickedUp,
  Received,
  Refunded,
}

impl ReturnStatus {
  pub const ALL: [ReturnStatus; 6] = [
    ReturnStatus::Requested,
    ReturnStatus::Approved,
    ReturnStatus::Rejected,
    ReturnStatus::PickedUp,
    ReturnStatus::Received,
    ReturnStatus::Refunded,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ReturnStatus::Requested => "requested",
      ReturnStatus::Approved => "approved",
      ReturnStatus::Rejected => "rejected",
      ReturnStatus::PickedUp => "picked_up",
      ReturnStatus::Received => "received",
      ReturnStatus::Refunded => "refunded",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, ReturnStatus::Rejected | ReturnStatus::Refunded)
  }

  /// The only status a request must be in to move to `self`.
  pub fn predecessor(self) -> Option<ReturnStatus> {
    match self {
      ReturnStatus::Requested => None,
      ReturnStatus::Approved | ReturnStatus::Rejected => Some(ReturnStatus::Requested),
      ReturnStatus::PickedUp => Some(ReturnStatus::Approved),
      ReturnStatus::Received => Some(ReturnStatus::PickedUp),
      ReturnStatus::Refunded => Some(ReturnStatus::Received),
    }
  }
}

impl fmt::Display for ReturnStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ReturnStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ReturnStatus::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| format!("unknown return status '{}'", s))
  }
}

/// Shopkeeper verdict on a freshly requested return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnDecision {
  Approve,
  Reject,
}

impl ReturnDecision {
  pub fn target(self) -> ReturnStatus {
    match self {
      ReturnDecision::Approve => ReturnStatus::Approved,
      ReturnDecision::Reject => ReturnStatus::Rejected,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
  pub id: Uuid,
  pub order_item_id: Uuid,
  pub order_id: Uuid,
  pub customer_id: Uuid,
  pub shop_id: Uuid,
  pub status: ReturnStatus,
  pub reason: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnHistoryEntry {
  pub id: Uuid,
  pub return_id: Uuid,
  pub order_item_id: Uuid,
  pub status: ReturnStatus,
  pub actor_id: Uuid,
  pub actor_role: Role,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}
