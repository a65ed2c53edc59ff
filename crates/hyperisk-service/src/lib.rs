//! Assessment service: fans a patient out to every registered model and
//! serves the result over HTTP.

mod assess;
mod error;
pub mod routes;

pub use assess::{AssessLimits, Assessor};
pub use error::AssessError;
pub use routes::{router, serve};
