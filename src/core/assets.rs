//! Assets embedded at compile time.

use crate::core::curriculum::Curriculum;
use crate::core::error::TrailheadError;

pub const DEFAULT_CURRICULUM_TOML: &str = include_str!("../../assets/curriculum/default.toml");

/// The built-in curriculum used to seed an empty catalog.
pub fn default_curriculum() -> Result<Curriculum, TrailheadError> {
    let curriculum: Curriculum = toml::from_str(DEFAULT_CURRICULUM_TOML)?;
    curriculum.validate()?;
    Ok(curriculum)
}
