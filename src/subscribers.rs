//! Centrals that enabled notifications on the measurement characteristic.
//!
//! Bounded by `MAX_SUBSCRIBERS`. The registry is diagnostic: pushes go to
//! "all subscribers" through the host stack whether or not it is empty.

use heapless::Vec;

use crate::config::MAX_SUBSCRIBERS;
use crate::error::Error;

/// Opaque handle of a connected central (the link's connection handle).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CentralId(pub u16);

/// Result of a subscribe event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Subscribe {
    Added,
    AlreadyPresent,
}

pub struct SubscriberRegistry {
    centrals: Vec<CentralId, MAX_SUBSCRIBERS>,
}

impl SubscriberRegistry {
    pub const fn new() -> Self {
        Self {
            centrals: Vec::new(),
        }
    }

    /// Add `central`; idempotent when it is already present.
    pub fn on_subscribe(&mut self, central: CentralId) -> Result<Subscribe, Error> {
        if self.contains(central) {
            debug!("central {:?} already subscribed", central);
            return Ok(Subscribe::AlreadyPresent);
        }
        self.centrals.push(central).map_err(|_| Error::RegistryFull)?;
        info!("central subscribed: {:?}", central);
        self.log_members();
        Ok(Subscribe::Added)
    }

    /// Remove `central`. Returns `false` (not an error) when absent.
    pub fn on_unsubscribe(&mut self, central: CentralId) -> bool {
        let Some(index) = self.centrals.iter().position(|c| *c == central) else {
            return false;
        };
        self.centrals.remove(index);
        info!("central unsubscribed: {:?}", central);
        self.log_members();
        true
    }

    /// Forget everyone, e.g. after the radio session reset.
    pub fn clear(&mut self) {
        if !self.centrals.is_empty() {
            info!("dropping {} subscriber(s)", self.centrals.len());
        }
        self.centrals.clear();
    }

    pub fn contains(&self, central: CentralId) -> bool {
        self.centrals.contains(&central)
    }

    pub fn list(&self) -> &[CentralId] {
        &self.centrals
    }

    pub fn len(&self) -> usize {
        self.centrals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centrals.is_empty()
    }

    fn log_members(&self) {
        debug!("subscribed centrals: {}", self.centrals.len());
        for central in &self.centrals {
            debug!("  {:?}", central);
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_twice_keeps_one_entry() {
        let mut reg = SubscriberRegistry::new();
        assert_eq!(reg.on_subscribe(CentralId(1)), Ok(Subscribe::Added));
        assert_eq!(reg.on_subscribe(CentralId(1)), Ok(Subscribe::AlreadyPresent));
        assert_eq!(reg.list(), &[CentralId(1)]);
    }

    #[test]
    fn unsubscribe_absent_is_noop() {
        let mut reg = SubscriberRegistry::new();
        reg.on_subscribe(CentralId(4)).unwrap();
        assert!(!reg.on_unsubscribe(CentralId(9)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unsubscribe_removes_only_that_central() {
        let mut reg = SubscriberRegistry::new();
        reg.on_subscribe(CentralId(1)).unwrap();
        reg.on_subscribe(CentralId(2)).unwrap();
        assert!(reg.on_unsubscribe(CentralId(1)));
        assert!(!reg.contains(CentralId(1)));
        assert!(reg.contains(CentralId(2)));
    }

    #[test]
    fn full_registry_rejects_newcomer() {
        let mut reg = SubscriberRegistry::new();
        for i in 0..MAX_SUBSCRIBERS as u16 {
            reg.on_subscribe(CentralId(i)).unwrap();
        }
        assert_eq!(reg.on_subscribe(CentralId(100)), Err(Error::RegistryFull));
        // Existing members are still idempotent when full.
        assert_eq!(reg.on_subscribe(CentralId(0)), Ok(Subscribe::AlreadyPresent));
    }

    #[test]
    fn clear_empties() {
        let mut reg = SubscriberRegistry::new();
        reg.on_subscribe(CentralId(7)).unwrap();
        reg.clear();
        assert!(reg.is_empty());
    }
}
