//! Deterministic naming scheme.
//!
//! Every artifact the pipeline creates is addressed by a name derived from
//! its input, which is what makes re-runs idempotent:
//!
//! | artifact            | name                           |
//! |---------------------|--------------------------------|
//! | performance asset   | `Performance_{capture_data}`   |
//! | animation sequence  | `AS_{performance}`             |
//! | shot                | `LS_{performance}`             |
//! | face document       | `{shot}_face_anim.json`        |

/// Prefix for processed performance assets.
pub const PERFORMANCE_PREFIX: &str = "Performance_";

/// Prefix for exported animation sequences.
pub const ANIMATION_SEQUENCE_PREFIX: &str = "AS_";

/// Prefix for level sequences (shots).
pub const SHOT_PREFIX: &str = "LS_";

/// Suffix of the exported face animation document.
pub const FACE_ANIM_FILE_SUFFIX: &str = "_face_anim.json";

/// Name of the facial sub-component on a character actor.
pub const FACE_COMPONENT_NAME: &str = "Face";

/// Blueprint prefixes stripped from character names.
const CHARACTER_PREFIXES: [&str; 2] = ["BP_", "BP "];

/// `Performance_{capture_data_name}`
pub fn performance_asset_name(capture_data_name: &str) -> String {
    format!("{}{}", PERFORMANCE_PREFIX, capture_data_name)
}

/// `AS_{performance_asset_name}`
pub fn animation_sequence_name(performance_asset_name: &str) -> String {
    format!("{}{}", ANIMATION_SEQUENCE_PREFIX, performance_asset_name)
}

/// `LS_{performance_asset_name}`
pub fn shot_name(performance_asset_name: &str) -> String {
    format!("{}{}", SHOT_PREFIX, performance_asset_name)
}

/// `{shot_name}_face_anim.json`
pub fn face_anim_file_name(shot_name: &str) -> String {
    format!("{}{}", shot_name, FACE_ANIM_FILE_SUFFIX)
}

/// Capture-data asset name for one take: `{prefix}_{suffix}`.
///
/// The suffix keeps the folder's zero padding (`take_007` -> `Fretlyn_007`).
pub fn capture_data_name(prefix: &str, suffix: &str) -> String {
    format!("{}_{}", prefix, suffix)
}

/// Strip the trailing `_<token>` from a raw control-rig channel name.
///
/// Exactly one trailing token is removed (`"jawOpen_9"` -> `"jawOpen"`,
/// `"mouth_L_12"` -> `"mouth_L"`). Names without an underscore are kept.
/// A bare trailing `_` counts as an empty token: `"jawOpen_"` -> `"jawOpen"`.
pub fn normalize_channel_name(raw: &str) -> &str {
    match raw.rfind('_') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Normalize an actor display name into a lower-case character name.
///
/// A leading `BP_` or `BP ` is stripped (`"BP_Bernice"` -> `"bernice"`).
pub fn normalize_character_name(raw: &str) -> String {
    let trimmed = CHARACTER_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw);
    trimmed.to_lowercase()
}

/// True if a child possessable name identifies the facial component.
pub fn is_face_possessable(name: &str) -> bool {
    name.contains(FACE_COMPONENT_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_asset_names() {
        let perf = performance_asset_name("Fretlyn_007");
        assert_eq!(perf, "Performance_Fretlyn_007");
        assert_eq!(animation_sequence_name(&perf), "AS_Performance_Fretlyn_007");
        assert_eq!(shot_name(&perf), "LS_Performance_Fretlyn_007");
        assert_eq!(
            face_anim_file_name(&shot_name(&perf)),
            "LS_Performance_Fretlyn_007_face_anim.json"
        );
    }

    #[test]
    fn test_capture_data_name_keeps_padding() {
        assert_eq!(capture_data_name("Fretlyn", "007"), "Fretlyn_007");
    }

    #[test]
    fn test_normalize_channel_name() {
        assert_eq!(normalize_channel_name("jawOpen_9"), "jawOpen");
        assert_eq!(normalize_channel_name("browUp_12"), "browUp");
        assert_eq!(normalize_channel_name("CTRL_L_eye_blink_3"), "CTRL_L_eye_blink");
        assert_eq!(normalize_channel_name("plain"), "plain");
        assert_eq!(normalize_channel_name("jawOpen_"), "jawOpen");
    }

    #[test]
    fn test_normalize_character_name() {
        assert_eq!(normalize_character_name("BP_Bernice"), "bernice");
        assert_eq!(normalize_character_name("BP Bernice"), "bernice");
        assert_eq!(normalize_character_name("Bernice"), "bernice");
    }

    #[test]
    fn test_face_possessable_match() {
        assert!(is_face_possessable("Face"));
        assert!(is_face_possessable("FaceMesh"));
        assert!(!is_face_possessable("Body"));
    }
}
