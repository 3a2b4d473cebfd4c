pub mod classify;
pub mod filter;
pub mod init;
pub mod status;
pub mod validate;
