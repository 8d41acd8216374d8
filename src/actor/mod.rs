pub mod city;
pub mod model;

pub use city::CityHandle;
pub use model::{InternalMessage, Notification};
