pub mod conditional;
pub mod flow;
pub mod schema;
pub mod step;
pub mod store;
pub mod validation;
pub mod wizard;
