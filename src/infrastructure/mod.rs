pub mod bootpay;
pub mod in_memory;
pub mod mock_gateway;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
