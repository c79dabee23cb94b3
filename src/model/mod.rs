mod category;
pub mod price;
mod product;

pub use category::{Category, CategoryField};
pub use product::{Product, ProductField};
