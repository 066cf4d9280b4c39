pub mod db;
pub mod json_file;

pub use db::DbAdapter;
pub use json_file::JsonFileAdapter;
