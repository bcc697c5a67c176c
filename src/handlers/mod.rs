// handlers/mod.rs
//
// Two public entry points:
//   /db        generic table gateway, dispatched on method + query string
//   /download  Google Drive download proxy
pub mod download;
pub mod gateway;

pub use download::download;
pub use gateway::dispatch;
