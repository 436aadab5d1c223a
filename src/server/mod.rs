mod handlers;
mod models;
mod state;
mod upload;
mod util;

pub use handlers::{router, run_server};
pub use state::ServerState;
