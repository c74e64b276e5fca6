use std::sync::Arc;

use comms::{MessageKind, Rank};
use parking_lot::{Mutex, MutexGuard};

use super::{Reply, ServerHandler};
use crate::error::Result;

/// A handler that can be fed from many tasks at once.
///
/// Every `receive` runs entirely under the lock, so the duplicate check and the
/// count increment of a round are atomic as a unit.
pub struct SharedHandler<H>(Arc<Mutex<H>>);

impl<H> Clone for SharedHandler<H> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<H: ServerHandler> SharedHandler<H> {
    /// Creates a new `SharedHandler`
    ///
    /// # Arguments
    /// * `handler` - The handler to share.
    ///
    /// # Returns
    /// A new `SharedHandler` instance.
    pub fn new(handler: H) -> Self {
        Self(Arc::new(Mutex::new(handler)))
    }

    /// Locked call to `ServerHandler::receive`.
    pub fn receive(&self, sender: Rank, kind: MessageKind, payload: &[f32]) -> Result<Option<Reply>> {
        self.0.lock().receive(sender, kind, payload)
    }

    /// A copy of the current global parameters.
    pub fn snapshot(&self) -> Vec<f32> {
        self.0.lock().buffer().to_vec()
    }

    /// Locks the handler for operations outside of `receive`.
    pub fn lock(&self) -> MutexGuard<'_, H> {
        self.0.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{handler::SyncHandler, model::FlatModel};

    #[test]
    fn test_concurrent_duplicates_count_once() {
        const CLIENTS: usize = 4;
        const DUPLICATES: usize = 16;

        let model = FlatModel::new(vec![0.0; 2]);
        let handler = SharedHandler::new(SyncHandler::new(model, CLIENTS, 1.0).unwrap());

        // Every thread races to fill the slot of rank 1 first.
        thread::scope(|s| {
            for i in 0..DUPLICATES {
                let handler = handler.clone();
                s.spawn(move || {
                    let payload = [i as f32, i as f32];
                    handler.receive(1, MessageKind::ParameterUpdate, &payload).unwrap();
                });
            }
        });

        let winner = {
            let guard = handler.lock();
            assert_eq!(guard.received_count(), 1);
            guard.cache().get(1).map(<[f32]>::to_vec).unwrap()
        };

        for rank in 2..=CLIENTS as Rank {
            handler
                .receive(rank, MessageKind::ParameterUpdate, &[0.0, 0.0])
                .unwrap();
        }

        assert!(handler.lock().is_updated());
        let expected: Vec<f32> = winner.iter().map(|w| w / CLIENTS as f32).collect();
        assert_eq!(handler.snapshot(), expected);
    }
}
