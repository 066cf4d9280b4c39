pub mod domain;
pub mod ports;

pub use domain::{NewProduct, Notes, Product, ProductId, ProductPatch};
pub use ports::{PortError, PortResult, ProductStore};
