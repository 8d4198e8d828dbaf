pub mod clock;
pub mod config;
pub mod criteria;
pub mod error;
pub mod identity;
pub mod model;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use criteria::SearchCriteria;
pub use error::*;
pub use identity::*;
pub use model::*;
pub use traits::*;
