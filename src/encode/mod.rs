pub mod script;
pub mod table;
