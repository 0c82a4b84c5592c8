pub mod captcha;
pub mod configure;
pub mod logger;
pub mod logging;
pub mod models;
pub mod transfer;
