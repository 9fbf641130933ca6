//! The normalized object graph: resolved entities, their fields, and the
//! lazy accessors that stand in for edges between them.

mod collection;
mod node;
mod resource;

pub use collection::{Collection, PageInfo};
pub use node::{Accessor, CollectionAccessor, Node};
pub use resource::{Resolved, Resource};
