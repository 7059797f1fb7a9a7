mod db;
mod schema;

pub use db::*;
