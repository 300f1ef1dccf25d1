//! Extra run time while the host suspends us.
//!
//! When the host is about to suspend and broadcasting is requested, ask
//! it for a continuation grant so the broadcast timer keeps firing, and
//! restart advertising if the host dropped it. On resume the grant is
//! released. Failing to get a grant is accepted: the timer may simply be
//! starved until the next resume.

use crate::host::PeripheralHost;

pub struct ContinuationManager<G> {
    grant: Option<G>,
}

impl<G> ContinuationManager<G> {
    pub const fn new() -> Self {
        Self { grant: None }
    }

    pub fn holds_grant(&self) -> bool {
        self.grant.is_some()
    }

    /// Host is about to suspend.
    ///
    /// The grant follows the broadcasting request. Advertising is only
    /// re-issued while it should be running (`advertising`), never while
    /// the radio is down.
    pub fn on_suspend<H>(
        &mut self,
        host: &mut H,
        broadcasting: bool,
        advertising: bool,
        service_uuid: u16,
    ) where
        H: PeripheralHost<Grant = G>,
    {
        if !broadcasting {
            debug!("suspending while idle, no continuation needed");
            return;
        }

        if self.grant.is_none() {
            match host.request_continuation() {
                Ok(grant) => {
                    info!("continuation granted");
                    self.grant = Some(grant);
                }
                Err(e) => warn!("continuation not granted: {:?}", e),
            }
        }

        if !advertising {
            info!("suspending, advertising not active");
        } else if host.is_advertising() {
            info!("suspending, still advertising");
        } else {
            warn!("advertising stopped on suspend, restarting");
            if let Err(e) = host.start_advertising(service_uuid) {
                warn!("advertising restart failed: {:?}", e);
            }
        }
    }

    /// Back in the foreground. Safe to call without a grant.
    pub fn on_resume<H>(&mut self, host: &mut H)
    where
        H: PeripheralHost<Grant = G>,
    {
        if let Some(grant) = self.grant.take() {
            host.release_continuation(grant);
            info!("continuation released");
        }
    }
}

impl<G> Default for ContinuationManager<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, RecordingHost};

    const UUID: u16 = 0x1818;

    #[test]
    fn resume_without_grant_is_safe() {
        let mut host = RecordingHost::new();
        let mut mgr = ContinuationManager::new();
        mgr.on_resume(&mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn grant_is_requested_once_and_released_once() {
        let mut host = RecordingHost::new();
        host.advertising = true;
        let mut mgr = ContinuationManager::new();

        mgr.on_suspend(&mut host, true, true, UUID);
        mgr.on_suspend(&mut host, true, true, UUID);
        mgr.on_resume(&mut host);
        mgr.on_resume(&mut host);

        assert_eq!(
            host.calls,
            [Call::RequestContinuation, Call::ReleaseContinuation(1)]
        );
    }

    #[test]
    fn idle_suspend_requests_nothing() {
        let mut host = RecordingHost::new();
        let mut mgr = ContinuationManager::new();
        mgr.on_suspend(&mut host, false, false, UUID);
        assert!(!mgr.holds_grant());
        assert!(host.calls.is_empty());
    }

    #[test]
    fn denied_grant_still_restarts_advertising() {
        let mut host = RecordingHost::new();
        host.deny_continuation = true;
        let mut mgr = ContinuationManager::new();

        mgr.on_suspend(&mut host, true, true, UUID);
        assert!(!mgr.holds_grant());
        assert_eq!(
            host.calls,
            [Call::RequestContinuation, Call::StartAdvertising(UUID)]
        );
    }

    #[test]
    fn grant_without_readvertise_while_radio_is_down() {
        let mut host = RecordingHost::new();
        let mut mgr = ContinuationManager::new();

        mgr.on_suspend(&mut host, true, false, UUID);
        assert!(mgr.holds_grant());
        assert_eq!(host.calls, [Call::RequestContinuation]);
    }
}
