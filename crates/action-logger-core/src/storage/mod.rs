mod local_store;

pub use local_store::{today, LocalStore, DAY_FORMAT};
