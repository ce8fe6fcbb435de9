//! Pulseboard feed data model
//!
//! Defines the records shared by every feed component:
//! - Notification records and their type vocabulary
//! - Severity and stickiness policy per kind
//! - Wire events of the push channel
//!
//! The collaborator API owns these shapes; this crate only mirrors them on
//! the client side.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod notification;
pub mod stream;

// Re-exports for convenience
pub use notification::{Notification, NotificationId, NotificationKind, Severity};
pub use stream::StreamEvent;
