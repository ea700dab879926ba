pub mod catalog;
pub mod error;
pub mod ledger;
pub mod money;
pub mod orchestrator;
pub mod reader;
pub mod schema;
pub mod surface;
pub mod token;
pub mod transaction;
pub mod writer;
