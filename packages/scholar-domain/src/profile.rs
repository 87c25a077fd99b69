use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
	Academician,
	Postgraduate,
	Undergraduate,
	Program,
}
impl EntityType {
	pub const ALL: [Self; 4] =
		[Self::Academician, Self::Postgraduate, Self::Undergraduate, Self::Program];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Academician => "academician",
			Self::Postgraduate => "postgraduate",
			Self::Undergraduate => "undergraduate",
			Self::Program => "program",
		}
	}

	/// Collections are per entity type so point ids only need to be unique
	/// within one type.
	pub fn collection(&self, prefix: &str) -> String {
		format!("{prefix}_{}", self.as_str())
	}
}

/// A read-only view of a subject maintained by the CRUD layer. The engine
/// never mutates profiles; it only turns them into embeddings and match
/// results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum Profile {
	Academician(Academician),
	Postgraduate(Postgraduate),
	Undergraduate(Undergraduate),
	Program(Program),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Academician {
	pub external_id: String,
	pub name: String,
	pub expertise_ids: Vec<String>,
	pub biography: Option<String>,
	pub position: Option<String>,
	pub institution: Option<String>,
	pub avatar: Option<String>,
	#[serde(default)]
	pub recent_publications: Vec<String>,
	pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Postgraduate {
	pub external_id: String,
	pub name: String,
	pub interest_ids: Vec<String>,
	pub biography: Option<String>,
	pub institution: Option<String>,
	pub avatar: Option<String>,
	pub program_type: Option<String>,
	pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Undergraduate {
	pub external_id: String,
	pub name: String,
	pub interest_ids: Vec<String>,
	pub biography: Option<String>,
	pub institution: Option<String>,
	pub avatar: Option<String>,
	pub gpa: f32,
	pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
	pub external_id: String,
	pub name: String,
	pub field_ids: Vec<String>,
	pub description: Option<String>,
	pub institution: Option<String>,
	pub level: Option<String>,
	pub complete: bool,
}

impl Profile {
	pub fn entity_type(&self) -> EntityType {
		match self {
			Self::Academician(_) => EntityType::Academician,
			Self::Postgraduate(_) => EntityType::Postgraduate,
			Self::Undergraduate(_) => EntityType::Undergraduate,
			Self::Program(_) => EntityType::Program,
		}
	}

	pub fn external_id(&self) -> &str {
		match self {
			Self::Academician(inner) => &inner.external_id,
			Self::Postgraduate(inner) => &inner.external_id,
			Self::Undergraduate(inner) => &inner.external_id,
			Self::Program(inner) => &inner.external_id,
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Academician(inner) => &inner.name,
			Self::Postgraduate(inner) => &inner.name,
			Self::Undergraduate(inner) => &inner.name,
			Self::Program(inner) => &inner.name,
		}
	}

	/// The primary research-interest field, whatever the subject calls it.
	pub fn interest_ids(&self) -> &[String] {
		match self {
			Self::Academician(inner) => &inner.expertise_ids,
			Self::Postgraduate(inner) => &inner.interest_ids,
			Self::Undergraduate(inner) => &inner.interest_ids,
			Self::Program(inner) => &inner.field_ids,
		}
	}

	pub fn biography(&self) -> Option<&str> {
		match self {
			Self::Academician(inner) => inner.biography.as_deref(),
			Self::Postgraduate(inner) => inner.biography.as_deref(),
			Self::Undergraduate(inner) => inner.biography.as_deref(),
			Self::Program(inner) => inner.description.as_deref(),
		}
	}

	pub fn position(&self) -> Option<&str> {
		match self {
			Self::Academician(inner) => inner.position.as_deref(),
			Self::Program(inner) => inner.level.as_deref(),
			_ => None,
		}
	}

	pub fn institution(&self) -> Option<&str> {
		match self {
			Self::Academician(inner) => inner.institution.as_deref(),
			Self::Postgraduate(inner) => inner.institution.as_deref(),
			Self::Undergraduate(inner) => inner.institution.as_deref(),
			Self::Program(inner) => inner.institution.as_deref(),
		}
	}

	pub fn avatar(&self) -> Option<&str> {
		match self {
			Self::Academician(inner) => inner.avatar.as_deref(),
			Self::Postgraduate(inner) => inner.avatar.as_deref(),
			Self::Undergraduate(inner) => inner.avatar.as_deref(),
			Self::Program(_) => None,
		}
	}

	pub fn recent_publications(&self) -> &[String] {
		match self {
			Self::Academician(inner) => &inner.recent_publications,
			_ => &[],
		}
	}

	pub fn program_type(&self) -> Option<&str> {
		match self {
			Self::Postgraduate(inner) => inner.program_type.as_deref(),
			Self::Program(inner) => inner.level.as_deref(),
			_ => None,
		}
	}

	pub fn gpa(&self) -> Option<f32> {
		match self {
			Self::Undergraduate(inner) => Some(inner.gpa),
			_ => None,
		}
	}

	pub fn is_complete(&self) -> bool {
		match self {
			Self::Academician(inner) => inner.complete,
			Self::Postgraduate(inner) => inner.complete,
			Self::Undergraduate(inner) => inner.complete,
			Self::Program(inner) => inner.complete,
		}
	}
}
