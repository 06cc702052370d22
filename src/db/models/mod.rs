mod bid;
mod product;
mod user;

pub use bid::*;
pub use product::*;
pub use user::*;
