pub mod console;
pub mod output;
pub mod session_view;

pub use self::console::{ConsoleNavigator, ConsoleNotifier};
