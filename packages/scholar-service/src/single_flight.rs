use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-key mutual exclusion for expensive computations. Two concurrent
/// requests with the same fingerprint serialize here; the loser re-checks
/// the persisted batch under the lock and finds the winner's result instead
/// of recomputing.
pub struct SingleFlight {
	locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl SingleFlight {
	pub fn new() -> Self {
		Self { locks: Mutex::new(HashMap::new()) }
	}

	pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
		let lock = {
			let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());

			// Locks with no other holder are stale entries from finished
			// flights; drop them so the map tracks only keys in use.
			locks.retain(|_, entry| Arc::strong_count(entry) > 1);

			locks.entry(key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
		};

		lock.lock_owned().await
	}

	pub fn active_keys(&self) -> usize {
		self.locks.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}

impl Default for SingleFlight {
	fn default() -> Self {
		Self::new()
	}
}
