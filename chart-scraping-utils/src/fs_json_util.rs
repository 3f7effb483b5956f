use std::{fmt::Debug, io::BufWriter, path::PathBuf};

use anyhow::Context;
use fs_err::File;
use serde::Serialize;

/// Pretty-prints `value` into `path`, creating missing parent directories.
pub fn write_json<P: Into<PathBuf> + Debug, T: Serialize>(path: P, value: &T) -> anyhow::Result<()> {
    let path = path.into();
    (|| {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), value)?;
        anyhow::Ok(())
    })()
    .with_context(|| {
        format!(
            "While trying to write {} to {path:?}",
            std::any::type_name::<T>()
        )
    })
}
