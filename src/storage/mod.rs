//! Datastore side of the writer: records, connections, inserts, batching.

pub mod insert;
pub mod pool;
pub mod record;
pub mod writer;

// Re-export commonly used items
pub use insert::save_queue;
pub use record::{Batch, Record, Value};
pub use writer::Writer;
