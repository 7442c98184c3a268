//! Loopback driver.
//!
//! Stands in for a hardware-protocol layer: scripts ask it to raise events
//! and it posts them from a tokio task, the way a real driver's completion
//! callbacks would arrive on a background thread.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::events::Shared;
use crate::script::cond::parse_int;
use crate::script::Interpreter;

pub struct LoopbackDriver {
    name: String,
    handle: Handle,
    shared: Arc<Shared>,
}

impl LoopbackDriver {
    pub fn new(name: impl Into<String>, handle: Handle, shared: Arc<Shared>) -> Self {
        Self { name: name.into(), handle, shared }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Post `event` after `delay` from the background runtime.
    pub fn notify(&self, event: impl Into<String>, delay: Duration) -> JoinHandle<()> {
        let event = event.into();
        let shared = Arc::clone(&self.shared);
        tracing::debug!(event = %event, ?delay, "notify scheduled");
        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::debug!(event = %event, "notify fired");
            shared.post(event);
        })
    }

    /// `idle`, or the number of events waiting to be consumed.
    pub fn state(&self) -> String {
        match self.shared.pending_len() {
            0 => "idle".to_owned(),
            n => n.to_string(),
        }
    }

    /// Register the driver's verbs and resolvers.
    pub fn install(self: Arc<Self>, interp: &mut Interpreter) {
        let drv = Arc::clone(&self);
        interp.register(&["notify"], move |rt, t, ctx| {
            let Some(event) = t.get(1) else {
                ctx.fail(rt, "usage: notify NAME [delay_ms]");
                return false;
            };
            let delay = match t.get(2) {
                None => Some(0),
                Some(s) => parse_int(s).and_then(|n| u64::try_from(n).ok()),
            };
            match delay {
                Some(ms) => {
                    drv.notify(event.clone(), Duration::from_millis(ms));
                    ctx.status = 0;
                }
                None => ctx.fail(rt, format!("notify: bad delay '{}'", t[2])),
            }
            false
        });
        interp.register(&["post"], |rt, t, _| {
            for name in &t[1..] {
                rt.shared.post(name.clone());
            }
            false
        });

        interp.register_resolver("version", |_: &str| Some(env!("CARGO_PKG_VERSION").to_owned()));
        let drv = Arc::clone(&self);
        interp.register_resolver("driver", move |_: &str| Some(drv.name().to_owned()));
        interp.register_resolver("state", move |_: &str| Some(self.state()));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()
            .unwrap()
    }

    fn setup(rt: &tokio::runtime::Runtime) -> Interpreter {
        let shared = Arc::new(Shared::new());
        let mut interp = Interpreter::with_shared(Arc::clone(&shared), vec!["certsh".into()]);
        let drv = Arc::new(LoopbackDriver::new("loopback", rt.handle().clone(), shared));
        drv.install(&mut interp);
        interp
    }

    #[test]
    fn notify_wakes_wait() {
        let rt = runtime();
        let mut interp = setup(&rt);
        interp.execute_line("notify DEVICE_ARRIVAL 20");
        interp.execute_line("wait 5000");
        assert_eq!(interp.rt.top().ret, "DEVICE_ARRIVAL");
        assert_eq!(interp.rt.top().status, 0);
    }

    #[test]
    fn post_and_state() {
        let rt = runtime();
        let mut interp = setup(&rt);
        interp.execute_line("echo ${state:}");
        interp.execute_line("post A B");
        interp.execute_line("echo ${state:} ${driver:}");
        assert_eq!(interp.rt.output, ["idle", "2 loopback"]);
    }

    #[test]
    fn version_resolver() {
        let rt = runtime();
        let mut interp = setup(&rt);
        interp.execute_line("echo ${version:}");
        assert_eq!(interp.rt.output, [env!("CARGO_PKG_VERSION")]);
    }

    #[test]
    fn bad_delay_is_diagnostic() {
        let rt = runtime();
        let mut interp = setup(&rt);
        interp.execute_line("notify X soon");
        assert_eq!(interp.rt.top().status, 1);
        assert_eq!(interp.rt.diagnostics.len(), 1);
    }
}
