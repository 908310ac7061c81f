//! User interface rendering and input handling.
//!
//! - **keymapper**: crossterm key events to editor keys
//! - **frame**: off-screen grid of styled cells
//! - **highlight**: per-character theme roles for a text line
//! - **view**: composes a frame from the editor or the shell grid
//! - **renderer**: writes frames to the console

pub mod frame;
pub mod highlight;
pub mod keymapper;
pub mod renderer;
pub mod view;

pub use frame::Frame;
pub use keymapper::KeyMapper;
pub use renderer::Renderer;
