// grocer/src/domain/actor.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Customer,
  Shopkeeper,
  Rider,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Customer => "customer",
      Role::Shopkeeper => "shopkeeper",
      Role::Rider => "rider",
      Role::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "customer" => Ok(Role::Customer),
      "shopkeeper" => Ok(Role::Shopkeeper),
      "rider" | "delivery_boy" => Ok(Role::Rider),
      "admin" => Ok(Role::Admin),
      other => Err(format!("unknown role '{}'", other)),
    }
  }
}

/// The authenticated caller of a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id: Uuid,
  pub role: Role,
}

impl Actor {
  pub fn new(id: Uuid, role: Role) -> Self {
    Self { id, role }
  }

  pub fn customer(id: Uuid) -> Self {
    Self::new(id, Role::Customer)
  }

  pub fn shopkeeper(id: Uuid) -> Self {
    Self::new(id, Role::Shopkeeper)
  }

  pub fn rider(id: Uuid) -> Self {
    Self::new(id, Role::Rider)
  }

  pub fn admin(id: Uuid) -> Self {
    Self::new(id, Role::Admin)
  }
}
