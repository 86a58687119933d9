mod id;

pub use id::{EntityId, IdGenerator};
