//! Terminal rendering of agent message streams.

pub mod console;
pub mod input;
pub mod style;

pub use console::{Console, ConsoleError, ConsoleFactory, Processed};
pub use input::UserInputManager;
pub use style::Style;
