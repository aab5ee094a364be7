//! Control algorithms.
//!
//! [`pump`] holds the pump policy state machine driven once per sampling
//! tick by [`AppService`](crate::app::service::AppService).

pub mod pump;
