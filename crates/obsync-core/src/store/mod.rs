// ── State store ──

pub(crate) mod cell;
pub(crate) mod schema;
mod state_store;

pub use cell::{CellValue, StateCell};
pub use schema::Schema;
pub use state_store::{StateStore, WEBSOCKET_FILE};
