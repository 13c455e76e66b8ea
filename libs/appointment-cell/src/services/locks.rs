use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// One async mutex per doctor. Holding the guard serialises the
/// overlap check and the booking write for that doctor within this process.
#[derive(Debug, Default)]
pub struct DoctorLockRegistry {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl DoctorLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, doctor_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only the registry references are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(doctor_id).or_default())
        };

        debug!("Waiting for scheduling lock of doctor {}", doctor_id);
        lock.lock_owned().await
    }

    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_doctor_is_serialised() {
        let registry = Arc::new(DoctorLockRegistry::new());
        let doctor = Uuid::new_v4();

        let guard = registry.acquire(doctor).await;
        let contender = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let _guard = registry.acquire(doctor).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_doctors_do_not_block() {
        let registry = DoctorLockRegistry::new();
        let _first = registry.acquire(Uuid::new_v4()).await;
        let second = tokio::time::timeout(Duration::from_millis(50), registry.acquire(Uuid::new_v4())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let registry = DoctorLockRegistry::new();
        drop(registry.acquire(Uuid::new_v4()).await);
        drop(registry.acquire(Uuid::new_v4()).await);
        assert_eq!(registry.tracked().await, 1);
    }
}
