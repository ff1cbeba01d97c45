//! 具体渠道实现

pub mod slack;

pub use slack::SlackChannel;
