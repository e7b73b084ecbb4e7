pub mod handlers;
mod middleware;
pub mod routes;
pub mod server;

pub use server::start_server;
