//! Livecheck Capture Model
//!
//! Defines the input data contract produced by a client device during one
//! liveness check:
//! - **Frame:** One sampling instant (face mesh, accelerometer, gyroscope,
//!   scene motion, background variance, capture metadata)
//! - **Session:** The ordered frame list, supplied whole and read-only
//! - **Numeric:** Lenient coercion of loosely typed client values
//!
//! Every field is optional on the wire. Missing or malformed values never
//! fail parsing of the session as a whole.

pub mod frame;
pub mod numeric;
pub mod session;

pub use frame::*;
pub use numeric::*;
pub use session::*;
