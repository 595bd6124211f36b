//! Turn the configured key table into registered actions.

use std::{collections::BTreeMap, sync::Arc};

use config::{ActionDescriptor, Config};
use macropad_engine::{ActionContext, Orchestrator, RealTimeTracker, TimeTracker, build_action};
use tracing::{info, warn};

use crate::error::Result;

/// Build the time tracker from the `tracking` section, if present.
pub fn tracker(cfg: &Config) -> Result<Option<Arc<dyn TimeTracker>>> {
    let Some(tracking) = &cfg.tracking else {
        return Ok(None);
    };
    let client = time_track::Client::new(&tracking.base_url, tracking.resolved_token())?;
    if !client.has_token() {
        warn!(url = %tracking.base_url, "tracking_without_token");
    }
    Ok(Some(Arc::new(RealTimeTracker::new(client))))
}

/// Register an action for every buildable descriptor. Returns the number bound.
pub fn register(
    orch: &mut Orchestrator,
    keys: &BTreeMap<String, ActionDescriptor>,
    ctx: &ActionContext,
) -> usize {
    let mut bound = 0;
    for (key, desc) in keys {
        let Some(action) = build_action(key, desc, ctx) else {
            continue;
        };
        info!(key = %key, kind = %action.kind(), "key_bound");
        orch.register_action(key.as_str(), action);
        bound += 1;
    }
    if bound < keys.len() {
        warn!(bound, configured = keys.len(), "keys_skipped");
    }
    bound
}

#[cfg(test)]
mod tests {
    use macropad_engine::{
        ActionKind,
        test_support::{MockCommandRunner, RecordingNotifier},
    };
    use tokio::io::duplex;

    use super::*;

    fn desc(kind: &str, args: &[&str]) -> ActionDescriptor {
        ActionDescriptor {
            kind: kind.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            duration: 25,
            ..ActionDescriptor::default()
        }
    }

    #[tokio::test]
    async fn skips_unbuildable_descriptors() {
        let (_device, host) = duplex(64);
        let (r, w) = tokio::io::split(host);
        let mut orch = Orchestrator::new(r, w, Arc::new(RecordingNotifier::new()));
        let ctx = ActionContext {
            messages: orch.messages(),
            runner: Arc::new(MockCommandRunner::new()),
            tracker: None,
        };
        let mut keys = BTreeMap::new();
        keys.insert("K1".to_string(), desc("Type", &["t:hi"]));
        keys.insert("K2".to_string(), desc("Macro", &[]));
        keys.insert("K3".to_string(), desc("Track", &[]));
        keys.insert("K4".to_string(), desc("pomodoro", &[]));
        keys.insert("K5".to_string(), desc("Launch", &["x"]));

        assert_eq!(register(&mut orch, &keys, &ctx), 2);
        assert_eq!(orch.action("K1").map(|a| a.kind()), Some(ActionKind::Type));
        assert_eq!(
            orch.action("K4").map(|a| a.kind()),
            Some(ActionKind::Pomodoro)
        );
        assert!(orch.action("K2").is_none());
        assert!(orch.action("K3").is_none());
        assert!(orch.action("K5").is_none());
    }

    #[test]
    fn tracker_follows_tracking_section() {
        let mut cfg = Config::default();
        assert!(tracker(&cfg).unwrap().is_none());
        cfg.tracking = Some(config::TrackingConfig {
            base_url: "http://127.0.0.1:9/api".into(),
            token: Some("secret".into()),
        });
        assert!(tracker(&cfg).unwrap().is_some());
        cfg.tracking = Some(config::TrackingConfig {
            base_url: "not a url".into(),
            token: None,
        });
        assert!(tracker(&cfg).is_err());
    }
}
