//! Pairbook storage host
//!
//! The privileged side of the bridge as a process: one JSON request per
//! stdin line, one `CommandResult` JSON per stdout line, in order.
//! Logs go to stderr.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use pairbook_core::{Catalog, CommandResult, Config, Response, StorageBridge};

pub async fn run() -> anyhow::Result<()> {
    pairbook_core::init_logging();

    let config = Config::from_env()?;
    let catalog = Catalog::open_or_detached(config).await;

    tracing::info!(persistent = catalog.is_persistent(), "Storage host ready");

    let stdin = BufReader::new(tokio::io::stdin());
    let served = serve(catalog.bridge(), stdin, tokio::io::stdout()).await;

    catalog.shutdown().await;

    let served = served?;
    tracing::info!(served, "Storage host finished");

    Ok(())
}

/// Answer every request line until the reader is exhausted.
///
/// Returns the number of requests answered.
pub async fn serve<R, W>(
    bridge: &StorageBridge,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut served = 0;

    // Raw bytes so a line that is not UTF-8 fails only its own request
    while reader.read_until(b'\n', &mut buf).await? > 0 {
        if buf.iter().all(u8::is_ascii_whitespace) {
            buf.clear();
            continue;
        }

        let result: CommandResult<Response> = match serde_json::from_slice::<Value>(&buf) {
            Ok(payload) => bridge.invoke_value(payload).await,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed request line");
                CommandResult::err(format!("Malformed JSON: {e}"))
            }
        };
        buf.clear();

        let mut out = serde_json::to_vec(&result)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;

        served += 1;
    }

    Ok(served)
}
