//! View controllers.
//!
//! Each controller owns the state one page renders and the orchestration of
//! its gateway and cart calls. Routes stay thin: extract, call a controller,
//! turn the outcome into a toast or a page.
//!
//! - `product_list` - the signed-in user's products, delete, add to cart
//! - `cart_view` - cart entries, clear, remove
//! - `product_form` - create and update a product with its image

pub mod cart_view;
pub mod product_form;
pub mod product_list;

pub use cart_view::CartView;
pub use product_form::{ProductForm, SaveProductError};
pub use product_list::ProductList;
