//! Route handlers.

pub mod forms;
pub mod newsletter;
