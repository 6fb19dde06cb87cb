pub mod alert;
pub mod maintenance;
pub mod panel;
pub mod reading;
pub mod trends;
pub mod weather;
