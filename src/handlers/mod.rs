pub mod health;
pub mod proxy;

// Re-export handler functions for use in routing
pub use health::get as health_get;
pub use proxy::forward as proxy_forward;
