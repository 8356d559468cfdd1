//! Media-query driven state lifecycle.
//!
//! A [`state::MediaState`] follows one media query through an
//! [`observer::MediaQueryObserver`] and runs enter/leave/resize callbacks as
//! the query starts or stops matching. [`observer::ViewportEnvironment`] is an
//! in-process observer driven by a virtual viewport.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod observer;
pub mod query;
pub mod state;
pub mod util;
