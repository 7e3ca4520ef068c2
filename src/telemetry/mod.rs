pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one per command family
pub fn feed() -> LogCtx<ops::feed::Feed> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn submit() -> LogCtx<ops::submit::Submit> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn tasks() -> LogCtx<ops::tasks::Tasks> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
