pub mod add;
pub mod batch;
pub mod clear;
pub mod command;
pub mod dispatcher;
pub mod edit;
pub mod error;
pub mod history;
pub mod resolver;

pub use add::{AddArgs, AddCommand};
pub use command::{ExecContext, Executable, Feedback, IndexTargeted, Reversible, TwoWayCommand};
pub use dispatcher::Dispatcher;
pub use edit::{EditCommand, EditPatch};
pub use error::CommandError;
pub use history::History;
pub use resolver::{IndexResolver, ViewMode};
