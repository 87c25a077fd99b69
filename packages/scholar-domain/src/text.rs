use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::{profile::Profile, taxonomy::TaxonomyResolver};

/// Serializes a profile into the single text document that gets embedded.
///
/// Field order is fixed, and the primary interest field is repeated under
/// each configured synonymous label. The repetition biases the embedding
/// toward the research-interest signal; both the label set and the
/// repetition count must stay stable or stored vectors drift away from
/// freshly computed ones.
pub fn build_document(
	profile: &Profile,
	taxonomy: &TaxonomyResolver,
	cfg: &scholar_config::Text,
) -> String {
	let mut sections: Vec<String> = Vec::new();

	sections.push(format!("Name: {}", profile.name()));

	let interests = taxonomy.resolve_all(profile.interest_ids());

	if !interests.is_empty() {
		let joined = interests.join(", ");

		for label in &cfg.interest_labels {
			sections.push(format!("{label}: {joined}"));
		}
	}

	if let Some(biography) = profile.biography()
		&& !biography.trim().is_empty()
	{
		sections.push(format!("Biography: {biography}"));
	}
	if let Some(position) = profile.position()
		&& !position.trim().is_empty()
	{
		sections.push(format!("Position: {position}"));
	}
	if let Some(institution) = profile.institution()
		&& !institution.trim().is_empty()
	{
		sections.push(format!("Institution: {institution}"));
	}

	let publications: Vec<&str> = profile
		.recent_publications()
		.iter()
		.map(|title| title.trim())
		.filter(|title| !title.is_empty())
		.collect();

	if !publications.is_empty() {
		sections.push(format!("Recent Publications: {}", publications.join("; ")));
	}

	let document = normalize_text(&sections.join(". "));

	truncate_to_budget(&document, cfg.max_tokens)
}

/// NFC plus whitespace collapse. Embedding inputs must be byte-stable for
/// the content-addressed cache to hit.
pub fn normalize_text(text: &str) -> String {
	let composed: String = text.nfc().collect();

	composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn approx_token_count(text: &str) -> usize {
	let words = text.unicode_words().count();

	words + words / 2
}

/// Proportional character truncation against the `word_count * 1.5` token
/// approximation. Falls on a char boundary, never mid-scalar.
pub fn truncate_to_budget(text: &str, max_tokens: u32) -> String {
	let approx = approx_token_count(text);

	if approx <= max_tokens as usize {
		return text.to_string();
	}

	let total_chars = text.chars().count();
	let keep = total_chars * max_tokens as usize / approx;
	let truncated: String = text.chars().take(keep).collect();

	truncated.trim_end().to_string()
}
