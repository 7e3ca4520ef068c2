use anyhow::Result;
use serde::Serialize;

pub mod config;
pub mod presenter;
pub mod types;

use config::{OutputConfig, OutputFormat};
use presenter::Emitter;
use types::{Envelope, Meta};

fn current_config() -> OutputConfig {
    let mut cfg = OutputConfig::from_env();
    if crate::telemetry::config::json_mode() { cfg.format = OutputFormat::Json; }
    cfg
}

pub fn emit_plan<T: Serialize>(op: &'static str, plan: &T) -> Result<()> {
    let env = Envelope::plan(op, plan, None)?;
    Emitter::from_env(current_config()).emit(&env)?;
    Ok(())
}

pub fn emit_result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::result(op, result, meta)?;
    Emitter::from_env(current_config()).emit(&env)?;
    Ok(())
}
