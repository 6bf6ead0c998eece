//! Browser client: upload form and result viewer.
//!
//! - [`shell`]: server-rendered page with the inline client script
//! - [`view_state`]: the client state record and its transitions

pub mod shell;
pub mod view_state;
