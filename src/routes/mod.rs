//! Router Module Index
//!
//! Splits the JSON API by who may call it. Page navigation is not routed here; it falls
//! through to the static bundle behind the route guard.

/// Routes open to everyone, signed in or not.
pub mod public;

/// Routes that need a parseable user cookie.
pub mod authenticated;

/// Routes restricted to staff roles (admin, omod, cmod).
pub mod staff;
