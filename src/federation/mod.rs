//! Federation bridges: typed forwarding clients for the compute,
//! transfer, search and flows REST APIs.

pub mod client;
pub mod compute;
pub mod flows;
pub mod schemas;
pub mod search;
pub mod transfer;

pub use client::{FederationCore, TokenSource};
pub use compute::ComputeBridge;
pub use flows::FlowsBridge;
pub use search::SearchBridge;
pub use transfer::TransferBridge;
