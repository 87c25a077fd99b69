use std::collections::HashMap;

/// Resolves `field-area-domain` triplet ids to hierarchical human-readable
/// names. The lookup table is maintained by the CRUD layer and handed in as
/// plain data.
#[derive(Debug, Default, Clone)]
pub struct TaxonomyResolver {
	terms: HashMap<String, String>,
}
impl TaxonomyResolver {
	pub fn new(terms: HashMap<String, String>) -> Self {
		Self { terms }
	}

	pub fn from_config(cfg: &scholar_config::Taxonomy) -> Self {
		Self::new(cfg.terms.clone())
	}

	/// Unresolved ids are emitted verbatim so the document still carries
	/// whatever signal the raw id has.
	pub fn resolve(&self, id: &str) -> String {
		match self.terms.get(id) {
			Some(name) => name.clone(),
			None => {
				tracing::warn!(taxonomy_id = %id, "Unresolved taxonomy identifier, emitting verbatim.");

				id.to_string()
			},
		}
	}

	pub fn resolve_all(&self, ids: &[String]) -> Vec<String> {
		ids.iter()
			.filter(|id| !id.trim().is_empty())
			.map(|id| self.resolve(id.trim()))
			.collect()
	}
}
