pub mod consumption;
pub mod endpoint;
pub mod time_window;
