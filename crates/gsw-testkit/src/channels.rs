use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gsw_feed::{ChannelSource, FetchError};
use gsw_schemas::RawMessage;

/// Scripted channel contents. An unscripted channel is empty.
#[derive(Default)]
pub struct FakeChannels {
    latest: Mutex<HashMap<String, Result<RawMessage, FetchError>>>,
    reads: Mutex<Vec<String>>,
}

impl FakeChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `msg` the latest message of `channel_id`.
    pub fn post(&self, channel_id: &str, msg: RawMessage) {
        self.latest.lock().unwrap().insert(channel_id.to_string(), Ok(msg));
    }

    /// Empty the channel.
    pub fn clear(&self, channel_id: &str) {
        self.latest.lock().unwrap().remove(channel_id);
    }

    /// Every read of `channel_id` fails with `err`.
    pub fn fail(&self, channel_id: &str, err: FetchError) {
        self.latest.lock().unwrap().insert(channel_id.to_string(), Err(err));
    }

    pub fn read_count(&self, channel_id: &str) -> usize {
        self.reads.lock().unwrap().iter().filter(|c| *c == channel_id).count()
    }
}

#[async_trait]
impl ChannelSource for FakeChannels {
    async fn latest_message(&self, channel_id: &str) -> Result<Option<RawMessage>, FetchError> {
        self.reads.lock().unwrap().push(channel_id.to_string());
        match self.latest.lock().unwrap().get(channel_id) {
            None => Ok(None),
            Some(Ok(m)) => Ok(Some(m.clone())),
            Some(Err(e)) => Err(e.clone()),
        }
    }
}
