//! Application core: the boundary the control loop is written against.
//!
//! The scheduler and controller never see hardware directly.  Everything
//! they need goes through the **port traits** in [`ports`], keeping the
//! domain layer fully testable on the host.

pub mod events;
pub mod ports;
