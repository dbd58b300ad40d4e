//! `pikcel version`.

use crate::version::{COMMIT_SHA, TARGET_ARCH, TARGET_OS, VERSION};

pub fn render() -> String {
    format!("pikcel {VERSION}\ncommit: {COMMIT_SHA}\nplatform: {TARGET_OS}/{TARGET_ARCH}")
}
