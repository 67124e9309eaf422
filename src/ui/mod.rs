//! Terminal user interface.
//!
//! - `surface` - [`TerminalSurface`], the terminal implementation of the view's `Renderer`
//! - `draw` - ratatui drawing of the surface
//! - `input` - keyboard handling
//! - `loop_runner` - main event loop and terminal management

mod draw;
mod input;
mod loop_runner;
mod surface;

pub use loop_runner::{run, Action};
pub use input::TerminalView;
pub use surface::{CardView, TerminalSurface};
