//! Live OSC remote for VRChat avatar parameters.
//!
//! VRChat writes a JSON descriptor per avatar listing every controllable
//! parameter with its OSC addresses and types. This crate loads such a
//! descriptor, mirrors one canonical value per parameter, keeps it
//! consistent across local edits and inbound network updates, and exposes a
//! filtered, sorted view for display layers.

pub mod avatar;
pub mod config;
pub mod osc;
pub mod translate;
