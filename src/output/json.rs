use std::path::Path;

use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::output::error::OutputError;

/// Writes `data` to `path`, or to stdout when no path is configured.
pub async fn write_json<T>(path: Option<&Path>, data: &T, pretty: bool) -> Result<(), OutputError>
where
    T: Serialize + ?Sized,
{
    let mut encoded = if pretty {
        serde_json::to_vec_pretty(data)?
    } else {
        serde_json::to_vec(data)?
    };
    encoded.push(b'\n');

    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, encoded).await?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&encoded).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
