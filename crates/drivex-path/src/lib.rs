//! Path resolution for drivex.
//!
//! A path is walked one segment at a time, each segment a unique-name lookup
//! under the previous segment's node. Segment N+1 is looked up only after
//! segment N is known.
//!
//! - [`PathStepper`] -- one hop: parent + name to child node
//! - [`PathResolver`] -- a full path through repeated steps from a root
//! - [`FolderCreator`] -- creates a single folder under a parent
//! - [`FolderFactory`] -- get-or-create for a single folder segment
//! - [`PathCreator`] -- a full path through the factory, creating what is
//!   missing
//!
//! Folder-chain creation is not transactional, and two callers creating the
//! same segment at once can both create it.

pub mod creator;
pub mod error;
pub mod factory;
pub mod resolver;
pub mod stepper;

pub use creator::PathCreator;
pub use error::{PathError, PathResult};
pub use factory::{FolderCreator, FolderFactory};
pub use resolver::PathResolver;
pub use stepper::PathStepper;
