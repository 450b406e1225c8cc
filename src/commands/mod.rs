pub mod ingest;
pub mod inspect;
pub mod inventory;
pub mod status;
