pub mod state;

pub use state::{Outputs, StateDocument, StateError, StateModule};
