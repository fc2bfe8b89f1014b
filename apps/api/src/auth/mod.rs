// Authentication: registration, login, and the JWT session guard for
// resume routes.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod repository;
pub mod token;
