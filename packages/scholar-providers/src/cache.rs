use std::{collections::HashMap, sync::RwLock};

use time::{Duration, OffsetDateTime};

/// Read-mostly TTL cache. Entries are immutable once computed for a key, so
/// concurrent writers may simply overwrite (last writer wins) and readers
/// never see torn values.
pub struct TtlCache<V> {
	entries: RwLock<HashMap<String, Entry<V>>>,
	ttl: Duration,
}

struct Entry<V> {
	value: V,
	stored_at: OffsetDateTime,
}

impl<V: Clone> TtlCache<V> {
	pub fn new(ttl: Duration) -> Self {
		Self { entries: RwLock::new(HashMap::new()), ttl }
	}

	pub fn get(&self, key: &str) -> Option<V> {
		self.get_at(key, OffsetDateTime::now_utc())
	}

	pub fn get_at(&self, key: &str, now: OffsetDateTime) -> Option<V> {
		let entries = self.entries.read().unwrap_or_else(|err| err.into_inner());
		let entry = entries.get(key)?;

		if now - entry.stored_at > self.ttl {
			return None;
		}

		Some(entry.value.clone())
	}

	pub fn put(&self, key: String, value: V) {
		self.put_at(key, value, OffsetDateTime::now_utc());
	}

	pub fn put_at(&self, key: String, value: V, now: OffsetDateTime) {
		let mut entries = self.entries.write().unwrap_or_else(|err| err.into_inner());

		entries.insert(key, Entry { value, stored_at: now });
	}

	pub fn len(&self) -> usize {
		self.entries.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Content-addressed key for (model, normalized text) pairs. Embeddings for
/// stable text are deterministic, so the digest alone identifies the vector.
pub fn content_key(model: &str, text: &str) -> String {
	let mut hasher = blake3::Hasher::new();

	hasher.update(model.as_bytes());
	hasher.update(&[0]);
	hasher.update(text.as_bytes());

	hasher.finalize().to_hex().to_string()
}
