pub mod in_memory;
pub mod media;
pub mod notify;
pub mod paystack;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
