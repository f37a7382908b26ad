/*++

Licensed under the Apache-2.0 license.

File Name:

    active_session.rs

Abstract:

    Table of outputs that finished authentication and kept encrypting after
    their session was closed. A repeater entry lets the next StartSession on
    the same output skip straight to V' validation.

--*/

use crate::secrets::{ActiveSessionEntry, ActiveSessionTable, SessionFlags};
use zeroize::Zeroize;

impl ActiveSessionTable {
    pub fn find(&self, output_index: u32) -> Option<&ActiveSessionEntry> {
        self.entries
            .iter()
            .find(|e| e.valid != 0 && e.output_index == output_index)
    }

    /// Entry that can resume a repeater session on `output_index`.
    pub fn find_resumable(&self, output_index: u32) -> Option<&ActiveSessionEntry> {
        self.find(output_index)
            .filter(|e| SessionFlags::from_bits_truncate(e.flags).contains(SessionFlags::REPEATER))
    }

    /// Drop the entry for `output_index`. Returns whether one existed.
    pub fn evict(&mut self, output_index: u32) -> bool {
        let mut evicted = false;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.valid != 0 && e.output_index == output_index)
        {
            entry.zeroize();
            evicted = true;
        }
        evicted
    }

    /// Record `entry`, replacing the entry for the same output or, when the
    /// table is full, the oldest one.
    pub fn save(&mut self, mut entry: ActiveSessionEntry) {
        entry.valid = 1;
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|e| e.valid != 0 && e.output_index == entry.output_index)
        {
            *slot = entry;
            return;
        }
        if let Some(slot) = self.entries.iter_mut().find(|e| e.valid == 0) {
            *slot = entry;
            return;
        }
        self.entries.rotate_left(1);
        if let Some(last) = self.entries.last_mut() {
            *last = entry;
        }
    }
}
