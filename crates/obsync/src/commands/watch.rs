//! `obsync watch`: mirror every state cell and transition notice to stdout
//! until interrupted.

use futures::StreamExt;
use futures::stream::{BoxStream, select_all};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use obsync_core::{StateCell, WebsocketConfig};

use super::open_session;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Target;
use crate::error::CliError;

/// One line of watch output.
#[derive(Debug, Serialize)]
struct Update {
    cell: String,
    value: Value,
}

impl Update {
    fn line(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Plain => format!("{} {}", self.cell, self.value),
            OutputFormat::Json | OutputFormat::JsonCompact => {
                json!({"cell": self.cell, "value": self.value}).to_string()
            }
        }
    }
}

/// Current value first, then every change, as JSON.
fn cell_updates<T>(cell: &StateCell<T>) -> BoxStream<'static, Update>
where
    T: obsync_core::store::CellValue + Serialize,
{
    let name = cell.name().to_owned();
    cell.subscribe()
        .into_stream()
        .map(move |value| Update {
            cell: name.clone(),
            value: serde_json::to_value(&value).unwrap_or(Value::Null),
        })
        .boxed()
}

fn redact(mut cfg: WebsocketConfig) -> WebsocketConfig {
    if !cfg.password.is_empty() {
        cfg.password = "****".into();
    }
    cfg
}

pub async fn handle(target: Target, global: &GlobalOpts) -> Result<(), CliError> {
    let bridge = open_session(&target).await?;
    let store = bridge.store();

    let websocket_name = store.websocket.name().to_owned();
    let websocket = store
        .websocket
        .subscribe()
        .into_stream()
        .map(move |cfg| Update {
            cell: websocket_name.clone(),
            value: serde_json::to_value(redact(cfg)).unwrap_or(Value::Null),
        })
        .boxed();

    let mut updates = select_all([
        websocket,
        cell_updates(&store.program_scene),
        cell_updates(&store.preview_scene),
        cell_updates(&store.scene_list),
        cell_updates(&store.source_list),
        cell_updates(&store.transitioning),
        cell_updates(&store.studio_mode),
    ]);
    let mut notices = bridge.notifications();

    loop {
        tokio::select! {
            Some(update) = updates.next() => {
                if !global.quiet {
                    println!("{}", update.line(global.output));
                }
            }
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    let update = Update {
                        cell: format!("{}:transitioning-notice", bridge.namespace()),
                        value: notice.to_json(),
                    };
                    if !global.quiet {
                        println!("{}", update.line(global.output));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "transition notices dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
        }
    }

    // Leave the persisted status alone so the next run resumes.
    bridge.shutdown().await;
    Ok(())
}
