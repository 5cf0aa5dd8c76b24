use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Exit status used when a second signal forces the run to end
pub const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    Running,
    Stop,
    Force,
}

/// Cloneable stop request shared by the signal listener, the harvest loop
/// and the session.
///
/// A stop asks the loop to finish at its next check point. A forced stop
/// asks the session to abandon whatever it is awaiting, save what was
/// accepted, and release the browser.
#[derive(Debug, Clone)]
pub struct Interrupt {
    tx: Arc<watch::Sender<Level>>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Level::Running);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.escalate(Level::Stop);
    }

    /// Escalate to a forced stop. Implies [`trigger`](Self::trigger).
    pub fn force(&self) {
        self.escalate(Level::Force);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow() >= Level::Stop
    }

    pub fn is_forced(&self) -> bool {
        *self.tx.borrow() >= Level::Force
    }

    /// Resolves once a stop has been requested
    pub async fn triggered(&self) {
        self.reached(Level::Stop).await
    }

    /// Resolves once a forced stop has been requested
    pub async fn forced(&self) {
        self.reached(Level::Force).await
    }

    fn escalate(&self, to: Level) {
        self.tx.send_if_modified(|level| {
            if *level < to {
                *level = to;
                true
            } else {
                false
            }
        });
    }

    async fn reached(&self, level: Level) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|current| *current >= level).await;
    }
}

/// Listen for interrupt and terminate signals.
///
/// The first signal asks the harvest loop to stop at its next check point.
/// The second forces the stop: the session stops waiting on the browser,
/// saves what was accepted, closes the browser and exits with
/// [`FORCED_EXIT_CODE`].
pub fn listen_for_signals(interrupt: Interrupt) -> std::io::Result<JoinHandle<()>> {
    let mut signals = Signals::new()?;

    Ok(tokio::spawn(async move {
        let name = signals.next().await;
        warn!(
            "Received {}, stopping after the current step (send again to stop immediately)",
            name
        );
        interrupt.trigger();

        let name = signals.next().await;
        warn!("Received {} again, saving collected reviews and closing the browser", name);
        interrupt.force();
    }))
}

#[cfg(unix)]
struct Signals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    async fn next(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

#[cfg(windows)]
struct Signals;

#[cfg(windows)]
impl Signals {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl+C"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_interrupt_is_clear() {
        assert!(!Interrupt::new().is_triggered());
    }

    #[test]
    fn test_trigger_is_visible_to_clones() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();
        clone.trigger();
        assert!(interrupt.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_resolves_after_trigger() {
        let interrupt = Interrupt::new();
        let waiter = {
            let interrupt = interrupt.clone();
            tokio::spawn(async move { interrupt.triggered().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        interrupt.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[test]
    fn test_force_implies_trigger() {
        let interrupt = Interrupt::new();
        interrupt.force();
        assert!(interrupt.is_triggered());
        assert!(interrupt.is_forced());

        // A later plain stop does not downgrade
        interrupt.trigger();
        assert!(interrupt.is_forced());
    }

    #[test]
    fn test_trigger_alone_is_not_forced() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        assert!(!interrupt.is_forced());
    }

    #[tokio::test]
    async fn test_forced_waits_for_second_escalation() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        assert!(
            tokio::time::timeout(Duration::from_millis(50), interrupt.forced())
                .await
                .is_err()
        );

        interrupt.force();
        tokio_test::assert_ok!(
            tokio::time::timeout(Duration::from_millis(100), interrupt.forced()).await
        );
    }

    #[tokio::test]
    async fn test_triggered_returns_immediately_when_already_set() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        tokio_test::assert_ok!(
            tokio::time::timeout(Duration::from_millis(100), interrupt.triggered()).await
        );
    }
}
