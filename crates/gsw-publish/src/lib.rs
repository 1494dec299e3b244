//! gsw-publish
//!
//! Renders the committed snapshot and upserts it as the single live summary
//! message: update in place when a reference exists, recreate if the sink
//! reports it deleted, create otherwise.

pub mod render;
pub mod sink;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use gsw_schemas::{CanonicalSnapshot, RoleInfo};
use tracing::info;

pub use render::{mention_prefix, minutes_until, render_message};
pub use sink::{MessageSink, SinkError, WebhookSink};

/// What a publish call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing to show; sink not called.
    Skipped,
    /// Existing message edited in place.
    Updated { message_id: String },
    /// New message posted. `recreated` when it replaces a deleted one.
    Created { message_id: String, recreated: bool },
}

impl PublishOutcome {
    /// `true` when the snapshot's message reference changed.
    pub fn changed_ref(&self) -> bool {
        matches!(self, PublishOutcome::Created { .. })
    }
}

#[derive(Clone)]
pub struct Publisher {
    sink: Arc<dyn MessageSink>,
    tz: Tz,
}

impl Publisher {
    pub fn new(sink: Arc<dyn MessageSink>, tz: Tz) -> Self {
        Self { sink, tz }
    }

    /// Upsert the rendered snapshot. Updates `published_message_ref` in place
    /// when a new message is created or the old one turned out deleted.
    ///
    /// Update failures other than not-found are returned untouched; no second
    /// message is created for them.
    pub async fn publish(
        &self,
        snapshot: &mut CanonicalSnapshot,
        own_roles: Option<&[RoleInfo]>,
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, SinkError> {
        if !snapshot.has_content() {
            return Ok(PublishOutcome::Skipped);
        }

        let message = render_message(snapshot, own_roles, now, self.tz);

        let mut recreated = false;
        if let Some(id) = snapshot.published_message_ref.clone() {
            match self.sink.update(&id, &message).await {
                Ok(()) => {
                    info!(message_id = %id, provenance = snapshot.source.as_str(), "summary updated");
                    return Ok(PublishOutcome::Updated { message_id: id });
                }
                Err(SinkError::NotFound) => {
                    info!(message_id = %id, "published summary was deleted; recreating");
                    snapshot.published_message_ref = None;
                    recreated = true;
                }
                Err(e) => return Err(e),
            }
        }

        let id = self.sink.create(&message).await?;
        info!(message_id = %id, provenance = snapshot.source.as_str(), "summary created");
        snapshot.published_message_ref = Some(id.clone());
        Ok(PublishOutcome::Created {
            message_id: id,
            recreated,
        })
    }
}
