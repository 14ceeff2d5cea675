pub mod stock;
pub mod analysis;
pub mod response;

pub use stock::*;
pub use analysis::*;
pub use response::*;
