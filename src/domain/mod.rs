pub mod review;
pub mod signature;

pub use review::{RawFields, Rating, ReviewRecord};
pub use signature::ItemSignature;
