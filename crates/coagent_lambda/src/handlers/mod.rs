pub mod ai_proxy;
pub mod http;
pub mod lifecycle;
pub mod post_traffic;
pub mod pre_traffic;
