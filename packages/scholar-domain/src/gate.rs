use crate::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
	RejectMissingId,
	RejectMissingName,
	RejectEmptyInterest,
	RejectDefaultAvatar,
	RejectNonPositiveGpa,
}

/// Decides whether a profile may be embedded and indexed. Ineligible
/// profiles must never reach the vector store: empty or placeholder vectors
/// poison search quality for everyone.
pub fn index_gate(profile: &Profile, cfg: &scholar_config::Gate) -> Result<(), RejectCode> {
	if profile.external_id().trim().is_empty() {
		return Err(RejectCode::RejectMissingId);
	}
	if profile.name().trim().is_empty() {
		return Err(RejectCode::RejectMissingName);
	}
	if profile.interest_ids().iter().all(|id| id.trim().is_empty()) {
		return Err(RejectCode::RejectEmptyInterest);
	}
	if requires_avatar(profile) && !has_real_avatar(profile, cfg) {
		return Err(RejectCode::RejectDefaultAvatar);
	}
	if let Some(gpa) = profile.gpa()
		&& gpa <= 0.0
	{
		return Err(RejectCode::RejectNonPositiveGpa);
	}

	Ok(())
}

fn requires_avatar(profile: &Profile) -> bool {
	!matches!(profile, Profile::Program(_))
}

fn has_real_avatar(profile: &Profile, cfg: &scholar_config::Gate) -> bool {
	let Some(avatar) = profile.avatar() else { return false };
	let avatar = avatar.trim();

	if avatar.is_empty() {
		return false;
	}

	!cfg.default_avatars.iter().any(|marker| avatar.ends_with(marker.as_str()))
}
