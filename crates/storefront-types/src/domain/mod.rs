pub mod cart;
pub mod identity;
pub mod order;
pub mod product;
