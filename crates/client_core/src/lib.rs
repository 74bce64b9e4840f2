//! Client-side workbook logic: the worksheet editors, the backend seam, and the
//! session/gating rules every screen follows.

pub mod adapter;
pub mod error;
pub mod gate;
pub mod http;
pub mod interests;
pub mod life_categories;
pub mod priority;
pub mod save;
pub mod selection;
pub mod session;

pub use adapter::{InMemoryAdapter, PersistenceAdapter};
pub use error::{ClientError, EditorError};
pub use gate::{Gate, PrerequisiteGate};
pub use http::HttpAdapter;
pub use interests::InterestsEditor;
pub use life_categories::LifeCategoriesEditor;
pub use priority::{Phase, PriorityEditor};
pub use save::SaveGuard;
pub use selection::SelectionSet;
pub use session::Session;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
