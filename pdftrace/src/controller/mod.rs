//! # Interactive Controller
//!
//! Everything the operator sees and touches while a trace is paused.
//!
//! ## Sub-Modules
//!
//! - `keys` - Blocking single-keystroke input and function-key decoding
//! - `render` - Fixed-layout status lines, optionally cursor-homed
//! - `terminal` - Raw input mode for the controlling terminal
//!
//! ## Keys
//!
//! | Key | Effect |
//! |-----|--------|
//! | F3  | Stop on every read |
//! | F4  | Stop only when the record changes |
//! | any | Resume |

pub mod keys;
pub mod render;
pub mod terminal;

pub use keys::{wait_for_key, FunctionKey, KeyPolicy, KeySource, ScriptedKeys, StdinKeys};
pub use render::{StatusRenderer, StdioOrdered};
pub use terminal::TerminalMode;
