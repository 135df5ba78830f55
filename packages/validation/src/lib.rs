#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geofence validation.
//!
//! [`validator`] checks one location against a zone snapshot and classifies
//! violations. [`recorder`] appends those violations to a sample's history
//! and announces them through a [`ViolationEventSink`].

pub mod recorder;
pub mod validator;

pub use recorder::{
    ChannelSink, CollectingSink, NullSink, ViolationEventSink, announce, append_batch, null_sink,
    record, record_at,
};
pub use validator::{find_nearest_zone, validate};
