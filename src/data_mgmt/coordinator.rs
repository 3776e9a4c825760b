use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use flume::{Receiver, RecvTimeoutError, Sender};

use crate::helpers::Clock;
use crate::interfaces::tuya_api::{ApiError, TuyaClient};

use super::models::{DpValue, StatusMap};

/// Outcome of one poll, as seen by listeners.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    Status(StatusMap),
    Unavailable(String),
}

enum Request {
    SendCommand {
        code: String,
        value: DpValue,
        reply: Sender<bool>,
    },
    Refresh,
    Shutdown,
}

/// Handle to the polling worker. The worker owns the client; everything else
/// talks to it through this handle.
pub struct CoordinatorHandle<C: Clock + Send + 'static> {
    requests: Sender<Request>,
    worker: JoinHandle<TuyaClient<C>>,
}

/// Start polling on a dedicated thread. Updates arrive on the returned
/// receiver, the first one right away.
pub fn spawn<C: Clock + Send + 'static>(
    client: TuyaClient<C>,
    interval: Duration,
) -> Result<(CoordinatorHandle<C>, Receiver<Update>)> {
    let (requests_tx, requests_rx) = flume::unbounded();
    let (updates_tx, updates_rx) = flume::unbounded();

    let worker = thread::Builder::new()
        .name("poll".to_string())
        .spawn(move || run(client, interval, requests_rx, updates_tx))?;

    Ok((
        CoordinatorHandle {
            requests: requests_tx,
            worker,
        },
        updates_rx,
    ))
}

fn poll<C: Clock>(client: &mut TuyaClient<C>) -> Update {
    match client.fetch_device_status() {
        Ok(status) if status.is_empty() => {
            log::warn!("Device {} returned no data points", client.device_id());
            Update::Unavailable("no data returned".to_string())
        }
        Ok(status) => Update::Status(status),
        Err(err @ ApiError::DeviceOffline(_)) => {
            log::warn!("Device offline: {}", err);
            Update::Unavailable(err.to_string())
        }
        Err(err) => {
            log::error!("Error fetching device status: {}", err);
            Update::Unavailable(err.to_string())
        }
    }
}

fn run<C: Clock>(
    mut client: TuyaClient<C>,
    interval: Duration,
    requests: Receiver<Request>,
    updates: Sender<Update>,
) -> TuyaClient<C> {
    log::debug!("Polling every {}s", interval.as_secs());
    loop {
        if updates.send(poll(&mut client)).is_err() {
            log::debug!("No update listeners left; stopping");
            break;
        }
        match requests.recv_timeout(interval) {
            Ok(Request::SendCommand { code, value, reply }) => {
                let success = client.send_command(&code, value);
                let _ = reply.send(success);
            }
            Ok(Request::Refresh) | Err(RecvTimeoutError::Timeout) => {}
            Ok(Request::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    client
}

impl<C: Clock + Send + 'static> CoordinatorHandle<C> {
    /// Send one command through the worker and wait for the result. A
    /// refresh follows straight after.
    pub fn send_command(&self, code: &str, value: impl Into<DpValue>) -> bool {
        let (reply_tx, reply_rx) = flume::bounded(1);
        let request = Request::SendCommand {
            code: code.to_string(),
            value: value.into(),
            reply: reply_tx,
        };
        if self.requests.send(request).is_err() {
            log::error!("Poll worker has stopped; command {} not sent", code);
            return false;
        }
        reply_rx.recv().unwrap_or(false)
    }

    pub fn refresh(&self) {
        let _ = self.requests.send(Request::Refresh);
    }

    /// Stop the worker and take the client back.
    pub fn shutdown(self) -> Result<TuyaClient<C>> {
        let _ = self.requests.send(Request::Shutdown);
        self.worker
            .join()
            .map_err(|_| anyhow!("Poll worker panicked"))
    }
}
