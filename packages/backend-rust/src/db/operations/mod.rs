pub mod audit;
pub mod cards;
pub mod review_logs;

pub use audit::*;
pub use cards::*;
pub use review_logs::*;
