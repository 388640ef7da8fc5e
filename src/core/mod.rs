//! Purpose: Pure reply-processing layer for the registrar text protocol.
//! Exports: `decode`, `error`, `reply`, `value`.
//! Role: Text-to-structure transforms with no transport dependency.
//! Invariants: Nothing under this module performs I/O or touches the network.
pub mod decode;
pub mod error;
pub mod reply;
pub mod value;
