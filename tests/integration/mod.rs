pub mod health;
pub mod internal_proxy;
pub mod openai_passthrough;
