//! Per-connection string dictionaries.
//!
//! All state sits behind one mutex. Locks are held only for map operations,
//! never across stream I/O.

use super::frame::{INFO_FOLLOWS, NULL_ID};
use super::PeerRole;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of assigning an ID to a string about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// The string's ID.
    pub id: i32,
    /// True if the peer may not know the string yet, so it must be sent.
    pub string_follows: bool,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: i32,
    acknowledged: bool,
}

#[derive(Debug, Default)]
struct State {
    /// string -> (id, acknowledged)
    by_string: HashMap<Arc<str>, Entry>,
    /// id -> string, for IDs from both roles
    by_id: HashMap<i32, Arc<str>>,
    /// IDs received from the peer and not yet acknowledged to it
    pending_acks: Vec<i32>,
    /// last ID handed out by this side
    last_id: i32,
}

/// String dictionaries for one side of a connection.
#[derive(Debug)]
pub struct Dictionary {
    role: PeerRole,
    state: Mutex<State>,
}

impl Dictionary {
    /// Create empty dictionaries for `role`.
    pub fn new(role: PeerRole) -> Self {
        Self { role, state: Mutex::new(State::default()) }
    }

    /// The role fixing this side's numbering direction.
    pub fn role(&self) -> PeerRole {
        self.role
    }

    /// Look up or create the entry for `string`.
    ///
    /// A new string gets the next ID in this role's direction. The string
    /// must be sent whenever the peer has not acknowledged its ID yet.
    pub fn assign(&self, string: &str) -> Result<Assignment> {
        let mut state = self.state.lock();
        if let Some(entry) = state.by_string.get(string) {
            return Ok(Assignment { id: entry.id, string_follows: !entry.acknowledged });
        }

        let id = self.next_id(state.last_id)?;
        state.last_id = id;

        let string: Arc<str> = Arc::from(string);
        state.by_string.insert(string.clone(), Entry { id, acknowledged: false });
        state.by_id.insert(id, string);
        log::trace!("Assigned interning id {} ({:?})", id, self.role);

        Ok(Assignment { id, string_follows: true })
    }

    /// The ID of `string`, if it has one.
    pub fn lookup_string(&self, string: &str) -> Option<i32> {
        self.state.lock().by_string.get(string).map(|entry| entry.id)
    }

    /// The string bound to `id`, if known.
    pub fn lookup_id(&self, id: i32) -> Option<Arc<str>> {
        self.state.lock().by_id.get(&id).cloned()
    }

    /// Record that the peer confirmed receipt of `ids`.
    ///
    /// Fails without changing anything if an ID is unknown.
    pub fn acknowledge(&self, ids: &[i32]) -> Result<()> {
        let mut state = self.state.lock();
        state.acknowledge(ids)
    }

    /// Take every acknowledgement still owed to the peer.
    pub fn drain_pending(&self) -> Vec<i32> {
        std::mem::take(&mut self.state.lock().pending_acks)
    }

    /// Put acknowledgements back at the front of the queue after the frame
    /// carrying them could not be written.
    pub fn requeue(&self, acks: Vec<i32>) {
        if acks.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        state.pending_acks.splice(0..0, acks);
    }

    /// Apply an incoming frame's content in one critical section.
    ///
    /// Acknowledgements are applied first. An announced string is bound to
    /// `id` and queued for acknowledgement; otherwise `id` must already be
    /// known. Nothing changes if the frame is rejected.
    pub fn receive(&self, id: i32, announced: Option<String>, acks: &[i32]) -> Result<Arc<str>> {
        if id == NULL_ID || id == INFO_FOLLOWS {
            return Err(Error::decode(format!("invalid interning id: {}", id)));
        }

        let mut state = self.state.lock();
        if announced.is_none() && !state.by_id.contains_key(&id) {
            log::warn!("Peer referenced unknown interning id {}", id);
            return Err(Error::decode(format!("unknown interning id: {}", id)));
        }
        state.acknowledge(acks)?;

        match announced {
            Some(string) => {
                let string: Arc<str> = Arc::from(string);
                // a re-announcement of a known binding keeps its ack state
                let known = state.by_string.get(&string).is_some_and(|entry| entry.id == id);
                if !known {
                    state.by_string.insert(string.clone(), Entry { id, acknowledged: false });
                }
                state.by_id.insert(id, string.clone());
                state.pending_acks.push(id);
                Ok(string)
            }
            None => state
                .by_id
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::decode(format!("unknown interning id: {}", id))),
        }
    }

    /// Number of distinct strings known to this side.
    pub fn len(&self) -> usize {
        self.state.lock().by_string.len()
    }

    /// Returns true if no string is known yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of acknowledgements waiting for the next write.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending_acks.len()
    }

    fn next_id(&self, last: i32) -> Result<i32> {
        let next = match self.role {
            PeerRole::Client => last.checked_add(1),
            PeerRole::Server => last.checked_sub(1),
        };
        match next {
            Some(id) if id != INFO_FOLLOWS => Ok(id),
            _ => Err(Error::invalid_argument("interning id space exhausted")),
        }
    }
}

impl State {
    fn acknowledge(&mut self, ids: &[i32]) -> Result<()> {
        if let Some(unknown) = ids.iter().find(|id| !self.by_id.contains_key(*id)) {
            log::warn!("Peer acknowledged unknown interning id {}", unknown);
            return Err(Error::decode(format!("acknowledged unknown interning id: {}", unknown)));
        }

        for id in ids {
            if let Some(string) = self.by_id.get(id) {
                match self.by_string.get_mut(string) {
                    Some(entry) if entry.id == *id => entry.acknowledged = true,
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ids_ascend() {
        let dict = Dictionary::new(PeerRole::Client);
        assert_eq!(dict.assign("a").unwrap(), Assignment { id: 1, string_follows: true });
        assert_eq!(dict.assign("b").unwrap().id, 2);
        assert_eq!(dict.assign("a").unwrap(), Assignment { id: 1, string_follows: true });
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_server_ids_descend() {
        let dict = Dictionary::new(PeerRole::Server);
        assert_eq!(dict.assign("a").unwrap().id, -1);
        assert_eq!(dict.assign("b").unwrap().id, -2);
        assert_eq!(dict.lookup_string("b"), Some(-2));
        assert_eq!(dict.lookup_id(-1).as_deref(), Some("a"));
    }

    #[test]
    fn test_acknowledge_stops_resend() {
        let dict = Dictionary::new(PeerRole::Client);
        let id = dict.assign("concept").unwrap().id;
        dict.acknowledge(&[id]).unwrap();
        assert_eq!(dict.assign("concept").unwrap(), Assignment { id, string_follows: false });
    }

    #[test]
    fn test_acknowledge_unknown_is_atomic() {
        let dict = Dictionary::new(PeerRole::Client);
        let id = dict.assign("x").unwrap().id;
        assert!(dict.acknowledge(&[id, 99]).unwrap_err().is_decode());
        assert!(dict.assign("x").unwrap().string_follows);
    }

    #[test]
    fn test_receive_queues_ack() {
        let dict = Dictionary::new(PeerRole::Server);
        let s = dict.receive(4, Some("remote".to_string()), &[]).unwrap();
        assert_eq!(&*s, "remote");
        assert_eq!(dict.pending_len(), 1);
        assert_eq!(dict.drain_pending(), vec![4]);
        assert_eq!(dict.pending_len(), 0);

        assert_eq!(&*dict.receive(4, None, &[]).unwrap(), "remote");
    }

    #[test]
    fn test_requeue_goes_first() {
        let dict = Dictionary::new(PeerRole::Server);
        dict.receive(1, Some("a".to_string()), &[]).unwrap();
        dict.receive(2, Some("b".to_string()), &[]).unwrap();
        let drained = dict.drain_pending();

        dict.receive(3, Some("c".to_string()), &[]).unwrap();
        dict.requeue(drained);
        dict.requeue(Vec::new());
        assert_eq!(dict.drain_pending(), vec![1, 2, 3]);
    }

    #[test]
    fn test_receive_unknown_id() {
        let dict = Dictionary::new(PeerRole::Server);
        assert!(dict.receive(12, None, &[]).unwrap_err().is_decode());
        assert!(dict.receive(NULL_ID, Some("x".into()), &[]).unwrap_err().is_decode());
    }

    #[test]
    fn test_rejected_frame_changes_nothing() {
        let dict = Dictionary::new(PeerRole::Server);
        assert!(dict.receive(3, Some("s".into()), &[42]).is_err());
        assert!(dict.is_empty());
        assert_eq!(dict.pending_len(), 0);
    }

    #[test]
    fn test_id_space_exhausted() {
        let dict = Dictionary::new(PeerRole::Server);
        dict.state.lock().last_id = INFO_FOLLOWS + 1;
        assert!(dict.assign("last").is_err());

        let dict = Dictionary::new(PeerRole::Client);
        dict.state.lock().last_id = i32::MAX;
        assert!(dict.assign("last").is_err());
    }
}
