use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
	Vague,
	Specific,
}

/// Classifies free-text search input. Vague queries carry no standalone
/// semantic signal and are answered with the requester's own profile
/// embedding instead. Pattern and keyword lists come from config so the
/// heuristic can be tuned without a redeploy.
pub fn classify_query(text: &str, heuristics: &scholar_config::Heuristics) -> QueryClass {
	let normalized = text.trim().to_lowercase();

	if normalized.is_empty() {
		return QueryClass::Vague;
	}

	for pattern in &heuristics.vague_patterns {
		if normalized.contains(&pattern.to_lowercase()) {
			return QueryClass::Vague;
		}
	}

	let word_count = normalized.unicode_words().count();

	if word_count < 2 && !is_domain_keyword(&normalized, heuristics) {
		return QueryClass::Vague;
	}

	QueryClass::Specific
}

fn is_domain_keyword(normalized: &str, heuristics: &scholar_config::Heuristics) -> bool {
	heuristics.domain_keywords.iter().any(|keyword| keyword.to_lowercase() == normalized)
}

/// True when the query names a recognized academic field anywhere in its
/// text. Used by query enhancement to decide whether context framing is
/// needed.
pub fn mentions_domain_keyword(text: &str, heuristics: &scholar_config::Heuristics) -> bool {
	let normalized = text.to_lowercase();

	heuristics.domain_keywords.iter().any(|keyword| normalized.contains(&keyword.to_lowercase()))
}

const SUPERVISOR_FRAMING: &str = "Academic supervisor with research expertise in:";
const COLLABORATOR_FRAMING: &str = "Research collaborator working on:";
const STUDENT_FRAMING: &str = "Student researcher interested in:";
const ACADEMIC_CONTEXT_FRAMING: &str = "Research topic in academic context:";

/// Rewrites terse or intent-bearing queries before embedding. Very short or
/// domain-agnostic text embeds poorly on its own; a contextual prefix pulls
/// the vector toward the academic region of the space. Role keywords get
/// role-specific framing instead.
pub fn enhance_query(text: &str, heuristics: &scholar_config::Heuristics) -> String {
	let trimmed = text.trim();
	let normalized = trimmed.to_lowercase();

	for (keywords, framing) in [
		(&heuristics.supervisor_keywords, SUPERVISOR_FRAMING),
		(&heuristics.collaborator_keywords, COLLABORATOR_FRAMING),
		(&heuristics.student_keywords, STUDENT_FRAMING),
	] {
		if keywords.iter().any(|keyword| normalized.contains(&keyword.to_lowercase())) {
			return format!("{framing} {trimmed}");
		}
	}

	let word_count = normalized.unicode_words().count();

	if word_count <= heuristics.short_query_max_words as usize
		|| !mentions_domain_keyword(trimmed, heuristics)
	{
		return format!("{ACADEMIC_CONTEXT_FRAMING} {trimmed}");
	}

	trimmed.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn heuristics() -> scholar_config::Heuristics {
		scholar_config::Heuristics {
			vague_patterns: vec![
				"find me a supervisor".to_string(),
				"find supervisor".to_string(),
				"for me".to_string(),
				"my profile".to_string(),
			],
			domain_keywords: vec!["machine learning".to_string(), "education".to_string()],
			supervisor_keywords: vec!["supervisor".to_string()],
			collaborator_keywords: vec!["collaborat".to_string()],
			student_keywords: vec!["student".to_string()],
			short_query_max_words: 3,
		}
	}

	#[test]
	fn flags_known_vague_patterns() {
		let h = heuristics();

		assert_eq!(classify_query("find supervisor for me", &h), QueryClass::Vague);
		assert_eq!(classify_query("for me", &h), QueryClass::Vague);
		assert_eq!(classify_query("my profile please", &h), QueryClass::Vague);
	}

	#[test]
	fn flags_short_unrecognized_terms() {
		assert_eq!(classify_query("ai", &heuristics()), QueryClass::Vague);
	}

	#[test]
	fn keeps_recognized_field_names_specific() {
		let h = heuristics();

		assert_eq!(classify_query("machine learning", &h), QueryClass::Specific);
		assert_eq!(classify_query("education", &h), QueryClass::Specific);
	}

	#[test]
	fn empty_input_is_vague() {
		assert_eq!(classify_query("   ", &heuristics()), QueryClass::Vague);
	}

	#[test]
	fn multi_word_topics_are_specific() {
		assert_eq!(
			classify_query("reinforcement learning curricula", &heuristics()),
			QueryClass::Specific
		);
	}

	#[test]
	fn supervisor_intent_gets_role_framing() {
		let enhanced = enhance_query("supervisor in machine learning", &heuristics());

		assert!(enhanced.starts_with("Academic supervisor"));
		assert!(enhanced.ends_with("supervisor in machine learning"));
	}

	#[test]
	fn short_queries_get_academic_context() {
		let enhanced = enhance_query("deep learning", &heuristics());

		assert!(enhanced.starts_with("Research topic in academic context:"));
	}

	#[test]
	fn long_domain_queries_pass_through() {
		let query = "curriculum design for machine learning courses in higher education";

		assert_eq!(enhance_query(query, &heuristics()), query);
	}
}
