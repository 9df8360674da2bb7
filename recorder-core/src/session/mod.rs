pub mod capture_loop;
pub mod controller;
pub mod stop_signal;
