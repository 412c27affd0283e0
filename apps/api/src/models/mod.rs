pub mod attribution;
pub mod campaign;
pub mod event;
