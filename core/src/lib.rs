// grocer/src/lib.rs

//! Grocer: the order lifecycle of a multi-shop grocery delivery marketplace.
//!
//! The crate owns:
//!  - the order state machine (who may move an order where),
//!  - stock reservation at checkout and restoration on cancellation,
//!  - rider assignment, including auto-assignment on confirmation,
//!  - OTP-gated delivery with a bounded number of attempts,
//!  - return requests with a single active request per item.
//!
//! Each mutating operation is a `Workflow` of named steps run over a typed
//! context. `LifecycleManager` builds the context and dispatches it through a
//! `WorkflowRegistry`. Persistence, identity lookups, notifications and time
//! are collaborator traits so the same rules run against PostgreSQL in the
//! server and against `MemoryStore` in tests.

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod flows;
pub mod lifecycle;
pub mod notify;
pub mod policy;
pub mod state_machine;
pub mod store;
pub mod workflow;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::LifecycleConfig;
pub use crate::domain::{
  Actor, AddressSnapshot, GeoPoint, Order, OrderDetails, OrderHistoryEntry, OrderItem, OrderStatus, PaymentMethod,
  PriceOption, ReturnDecision, ReturnHistoryEntry, ReturnRequest, ReturnStatus, Rider, Role, ShopProduct,
};
pub use crate::error::{ErrorKind, LifecycleError, Result};
pub use crate::flows::{Checkout, TransitionRequest};
pub use crate::lifecycle::{LifecycleManager, LifecycleManagerBuilder};
pub use crate::notify::{Notifier, OrderNotice, TracingNotifier};
pub use crate::policy::{AssignmentPolicy, MaxActiveOrders, Unbounded};
pub use crate::store::{CheckoutLine, Directory, MemoryStore, OrderStore, OtpCheck};
pub use crate::workflow::{ContextData, FlowOutcome, StepControl, Workflow, WorkflowError, WorkflowRegistry};

/*
    Adding an operation:
    1. Define a `*CtxData` struct in `flows::contexts` holding `Arc<Services>`,
       the inputs and an output slot.
    2. Declare a `Workflow<YourCtxData, LifecycleError>` with its steps and
       register handlers with `.before()`, `.on()` and `.after()`.
    3. Register it in `flows::register_all_flows`.
    4. Add a `LifecycleManager` method that builds the context, runs it through
       the registry and takes the output slot.
*/
