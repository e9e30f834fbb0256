pub mod parse;
pub mod verify_depot;
pub mod verify_docstore;
