use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, OwnedMutexGuard};

use crate::id::RoomId;

/// Serializes check-then-act sequences: one writer per room, one nickname
/// claim at a time.
#[derive(Default)]
pub(crate) struct RoomLocks {
    rooms: Mutex<HashMap<RoomId, Arc<AsyncMutex<()>>>>,
    nicknames: AsyncMutex<()>,
}

impl RoomLocks {
    pub(crate) async fn room(&self, room_id: RoomId) -> RoomGuard<'_> {
        let lock = self.rooms.lock().entry(room_id).or_default().clone();
        let guard = lock.lock_owned().await;
        RoomGuard {
            locks: self,
            room_id,
            guard: Some(guard),
        }
    }

    pub(crate) async fn nicknames(&self) -> MutexGuard<'_, ()> {
        self.nicknames.lock().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.rooms.lock().len()
    }
}

/// Holds one room's lock. The room's map entry goes away with the last
/// guard once nobody is waiting on it.
pub(crate) struct RoomGuard<'a> {
    locks: &'a RoomLocks,
    room_id: RoomId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RoomGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut rooms = self.locks.rooms.lock();
        if rooms
            .get(&self.room_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            rooms.remove(&self.room_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_room_waits() {
        let locks = Arc::new(RoomLocks::default());
        let room_id = RoomId::new();

        let guard = locks.room(room_id).await;
        let waiting = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.room(room_id).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn entry_outlives_the_holder_while_someone_waits() {
        let locks = Arc::new(RoomLocks::default());
        let room_id = RoomId::new();

        let guard = locks.room(room_id).await;
        let (acquired_tx, acquired) = tokio::sync::oneshot::channel();
        let waiting = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.room(room_id).await;
                acquired_tx.send(()).unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
        assert_eq!(locks.len(), 1);

        acquired.await.unwrap();
        assert_eq!(locks.len(), 1);
        waiting.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn other_rooms_do_not_wait() {
        let locks = RoomLocks::default();
        let first = locks.room(RoomId::new()).await;
        let second = locks.room(RoomId::new()).await;
        assert_eq!(locks.len(), 2);

        drop(first);
        drop(second);
        assert_eq!(locks.len(), 0);
    }
}
