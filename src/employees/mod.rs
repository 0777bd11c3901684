//! Employee records and the store that serves them.
//!
//! Both the RPC and HTTP adapters read through [`EmployeeStore`]; neither owns
//! the data.

pub mod directory;
pub mod model;
pub mod store;

pub use directory::DirectoryRoutes;
pub use model::{Employee, EmployeeHierarchy, EmployeeId};
pub use store::{EmployeeStore, MemoryStore, StoreError};
