//! Cairn Result
//!
//! A [`TaskResult`] wraps a task's computed value together with:
//! - an optional *location*: where the value is persisted,
//! - one [`Serializer`](cairn_serializer::Serializer) that turns the value into bytes,
//! - a [`Storage`] mode that says what a location means.
//!
//! Results are immutable: [`TaskResult::format`], [`TaskResult::write`] and
//! [`TaskResult::read`] all return a new result.
//!
//! # Lifecycle
//!
//! ```text
//! TaskResult (template, no value)
//!   │ format(ctx)        location rendered from the template
//!   │ write(value, ctx)  location rendered, value serialized and stored
//!   ▼
//! TaskResult (location + value) ── record() ──▶ ResultRecord (location only)
//!   │
//!   │ read(location)     value loaded and deserialized
//!   ▼
//! TaskResult (location + value)
//! ```
//!
//! Only [`ResultRecord`]s leave the process: tracking stores never see values.

mod error;
mod factory;
mod location;
mod result;
mod value;

pub use error::ResultError;
pub use factory::ResultFactory;
pub use location::{Location, LocationContext, default_location, render_location};
pub use result::{ResultRecord, Storage, TaskResult};
pub use value::ResultValue;
