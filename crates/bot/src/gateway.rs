use crews::CrewEngine;
use shared::protocol::GatewayEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Feeds newline-delimited JSON gateway events into the engine, in arrival order,
/// until the reader hits end of input. Returns the number of events delivered.
pub async fn run_event_stream<R>(engine: &CrewEngine, reader: R) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut delivered = 0;
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let Some(event) = decode_line(line_no, &line) else {
            continue;
        };
        debug!(line = line_no, guild_id = %event.guild_id(), "gateway event");
        engine.handle_event(event).await;
        delivered += 1;
    }

    Ok(delivered)
}

fn decode_line(line_no: usize, line: &str) -> Option<GatewayEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(line = line_no, error = %err, "skipping malformed gateway event");
            None
        }
    }
}
