//! Connected centrals, keyed by the handle they had when the link opened.
//!
//! The SoftDevice clears a `Connection`'s handle once the link is gone, so
//! the handle is captured at open time and every lookup uses that copy.

use heapless::Vec;

struct Link<C> {
    handle: u16,
    conn: C,
    subscribed: bool,
}

pub struct LinkTable<C, const N: usize> {
    links: Vec<Link<C>, N>,
}

impl<C, const N: usize> LinkTable<C, N> {
    pub const fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Track a new link. Returns `false` if the table is full.
    ///
    /// A handle that is still listed is replaced: the SoftDevice only
    /// reuses a handle after the old link is gone.
    pub fn open(&mut self, handle: u16, conn: C) -> bool {
        let _ = self.close(handle);
        self.links
            .push(Link {
                handle,
                conn,
                subscribed: false,
            })
            .is_ok()
    }

    /// Forget `handle`, handing its connection back so the caller drops it.
    pub fn close(&mut self, handle: u16) -> Option<C> {
        let index = self.links.iter().position(|l| l.handle == handle)?;
        Some(self.links.remove(index).conn)
    }

    /// Returns `false` if `handle` is unknown.
    pub fn set_subscribed(&mut self, handle: u16, subscribed: bool) -> bool {
        match self.links.iter_mut().find(|l| l.handle == handle) {
            Some(link) => {
                link.subscribed = subscribed;
                true
            }
            None => false,
        }
    }

    /// Links that enabled notifications.
    pub fn subscribed(&self) -> impl Iterator<Item = (u16, &C)> {
        self.links
            .iter()
            .filter(|l| l.subscribed)
            .map(|l| (l.handle, &l.conn))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<C, const N: usize> Default for LinkTable<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stands in for a connection whose handle is cleared on disconnect.
    #[derive(Debug, PartialEq)]
    struct Conn(Option<u16>);

    #[test]
    fn reconnecting_never_fills_the_table() {
        let mut table: LinkTable<Conn, 2> = LinkTable::new();
        for handle in 0..10u16 {
            assert!(table.open(handle, Conn(Some(handle))), "open {handle}");
            assert_eq!(table.close(handle), Some(Conn(Some(handle))));
        }
        assert!(table.is_empty());
    }

    #[test]
    fn close_uses_the_handle_captured_at_open() {
        let mut table: LinkTable<Conn, 2> = LinkTable::new();
        // Connection already reports no handle, as after a disconnect.
        table.open(4, Conn(None));
        assert_eq!(table.close(4), Some(Conn(None)));
        assert!(table.is_empty());
    }

    #[test]
    fn full_table_rejects_third_link() {
        let mut table: LinkTable<Conn, 2> = LinkTable::new();
        assert!(table.open(1, Conn(Some(1))));
        assert!(table.open(2, Conn(Some(2))));
        assert!(!table.open(3, Conn(Some(3))));

        table.close(1);
        assert!(table.open(3, Conn(Some(3))));
    }

    #[test]
    fn reused_handle_replaces_stale_entry() {
        let mut table: LinkTable<Conn, 2> = LinkTable::new();
        table.open(1, Conn(None));
        table.set_subscribed(1, true);
        assert!(table.open(1, Conn(Some(1))));
        assert_eq!(table.len(), 1);
        assert_eq!(table.subscribed().count(), 0);
    }

    #[test]
    fn only_subscribed_links_are_listed() {
        let mut table: LinkTable<Conn, 2> = LinkTable::new();
        table.open(1, Conn(Some(1)));
        table.open(2, Conn(Some(2)));
        assert!(table.set_subscribed(2, true));
        assert!(!table.set_subscribed(9, true));

        let handles: std::vec::Vec<u16> = table.subscribed().map(|(h, _)| h).collect();
        assert_eq!(handles, [2]);

        table.set_subscribed(2, false);
        assert_eq!(table.subscribed().count(), 0);
    }

    #[test]
    fn close_unknown_is_noop() {
        let mut table: LinkTable<Conn, 2> = LinkTable::new();
        table.open(1, Conn(Some(1)));
        assert_eq!(table.close(7), None);
        assert_eq!(table.len(), 1);
    }
}
