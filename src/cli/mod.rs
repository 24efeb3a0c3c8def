//! CLI output formatting
//!
//! Provides human-readable, colored terminal log lines for timer events.

pub mod display;

pub use display::format_event;
pub use display::format_record;
pub use display::render_event;
pub use display::render_fatal;
