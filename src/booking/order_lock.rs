use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// 주문 ID 별 비동기 잠금
///
/// 정산과 타임아웃 정리가 같은 주문을 동시에 전이시키지 못하도록 직렬화합니다.
#[derive(Default)]
pub struct OrderLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// 잠금 가드. 해제 시 더 이상 쓰이지 않는 항목을 정리합니다.
pub struct OrderLockGuard<'a> {
    owner: &'a OrderLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, order_id: &str) -> OrderLockGuard<'_> {
        let slot = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(order_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = slot.lock_owned().await;

        OrderLockGuard {
            owner: self,
            key: order_id.to_string(),
            guard: Some(guard),
        }
    }

    /// 현재 등록된 잠금 항목 수
    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for OrderLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.owner.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // 맵만 참조하고 있으면 대기자가 없음
        if let Some(slot) = locks.get(&self.key) {
            if Arc::strong_count(slot) == 1 {
                locks.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_order_is_serialized() {
        let locks = Arc::new(OrderLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("order-1").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_orders_do_not_block() {
        let locks = OrderLocks::new();
        let _a = locks.lock("order-a").await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock("order-b")).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
