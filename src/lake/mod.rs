pub mod client;
pub mod location;

pub use client::LakeClient;
pub use location::StorageLocation;
