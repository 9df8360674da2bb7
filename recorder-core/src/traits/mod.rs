pub mod container_writer;
pub mod device_source;
pub mod session_delegate;
