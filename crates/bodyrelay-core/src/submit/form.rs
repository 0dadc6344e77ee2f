//! curl multipart POST for the submission endpoint.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

use super::{parse_reply, FileType, SubmitReply};

/// POSTs `path` as multipart `{file, filetype, region}` to `endpoint`.
///
/// Non-2xx responses are errors; a 2xx reply is parsed as `SubmitReply`.
pub fn submit_file(
    endpoint: &str,
    path: &Path,
    filetype: FileType,
    region: &str,
    timeout: Duration,
) -> Result<SubmitReply> {
    if !path.is_file() {
        anyhow::bail!("not a file: {}", path.display());
    }
    let region = region.trim();
    if region.is_empty() {
        anyhow::bail!("region must not be empty");
    }

    let mut form = curl::easy::Form::new();
    form.part("file")
        .file(path)
        .add()
        .context("multipart: file part")?;
    form.part("filetype")
        .contents(filetype.as_str().as_bytes())
        .add()
        .context("multipart: filetype part")?;
    form.part("region")
        .contents(region.as_bytes())
        .add()
        .context("multipart: region part")?;

    let mut easy = curl::easy::Easy::new();
    easy.url(endpoint).context("invalid URL")?;
    easy.httppost(form)?;
    easy.timeout(timeout)?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("submission request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !crate::retry::is_success(code) {
        anyhow::bail!("POST {} returned HTTP {}", endpoint, code);
    }
    tracing::debug!("submission of {} accepted with HTTP {}", path.display(), code);
    parse_reply(&body)
}
