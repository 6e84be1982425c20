pub mod fixtures;
pub mod password;
pub mod storage;
