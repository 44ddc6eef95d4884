pub mod datastore;
pub mod processor;
pub mod repository;
