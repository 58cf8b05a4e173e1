// grocer/src/policy.rs

use crate::domain::Rider;

/// Decides whether a rider may take one more order.
///
/// `active_orders` counts the rider's orders in confirmed, ready or shipped state.
pub trait AssignmentPolicy: Send + Sync {
  fn admits(&self, rider: &Rider, active_orders: u32) -> bool;

  /// Policies that ignore `active_orders` let callers skip counting.
  fn needs_active_count(&self) -> bool {
    true
  }

  /// A limit on active orders that the store enforces atomically with the
  /// assignment. `admits` alone reads a count that concurrent assignments
  /// can outdate.
  fn hard_cap(&self) -> Option<u32> {
    None
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl AssignmentPolicy for Unbounded {
  fn admits(&self, _rider: &Rider, _active_orders: u32) -> bool {
    true
  }

  fn needs_active_count(&self) -> bool {
    false
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxActiveOrders(pub u32);

/// At most `n` active orders per rider, enforced as a hard cap.
impl AssignmentPolicy for MaxActiveOrders {
  fn admits(&self, _rider: &Rider, active_orders: u32) -> bool {
    active_orders < self.0
  }

  fn hard_cap(&self) -> Option<u32> {
    Some(self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn rider() -> Rider {
    Rider {
      id: Uuid::new_v4(),
      shop_id: Uuid::new_v4(),
      name: "R".into(),
      available: true,
      location: None,
      location_updated_at: None,
      vehicle_number: "V-1".into(),
      license_number: "L-1".into(),
    }
  }

  #[test]
  fn max_active_orders_is_exclusive_upper_bound() {
    let policy = MaxActiveOrders(2);
    let r = rider();
    assert!(policy.admits(&r, 0));
    assert!(policy.admits(&r, 1));
    assert!(!policy.admits(&r, 2));
    assert_eq!(policy.hard_cap(), Some(2));
  }

  #[test]
  fn unbounded_admits_everyone() {
    assert!(Unbounded.admits(&rider(), 10_000));
    assert!(!Unbounded.needs_active_count());
    assert_eq!(Unbounded.hard_cap(), None);
  }
}
