// View State Machine
// Pure transitions live in `view`; `controller` drives them through the
// refinement client, timers, and the usage store.

pub mod controller;
pub mod handlers;
pub mod stats;
pub mod timing;
pub mod usage;
pub mod view;

pub use controller::{Session, SessionTimings};
