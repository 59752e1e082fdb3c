pub mod store;

pub use store::ChurnStore;
