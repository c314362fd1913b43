//! Event-fabric bridge internals: records, the partition-reader seam,
//! the bounded window retriever, the in-memory backend and login state.

pub mod memory;
pub mod reader;
pub mod record;
pub mod retriever;
pub mod session;

pub use memory::{MemoryFabric, MemoryReader, PartitionLog, ProduceAck};
pub use reader::{PartitionReader, RawMessage, RawRecord, ReaderFactory, PARTITION_ZERO};
pub use record::{to_safe_text, ConsumedRecord, MessageTimestamp, TimestampKind};
pub use retriever::{ConsumeBatch, WindowMode, WindowRetriever};
pub use session::{FabricSession, Identity, IdentityClient};
