pub mod batch;
pub mod compare;
pub mod evaluate;
pub mod init;
pub mod validate;
