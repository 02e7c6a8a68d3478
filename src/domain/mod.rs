pub mod forecast;
pub mod series;
pub mod types;

pub use forecast::*;
pub use series::*;
pub use types::*;
