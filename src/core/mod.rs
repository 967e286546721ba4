// Core modules implementing values, columnar storage, and the transform engines.
pub mod column;
pub mod dtype;
pub mod error;
pub mod mutate;
pub mod row;
pub mod slice;
pub mod store;
pub mod value;
