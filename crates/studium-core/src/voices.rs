//! TTS voice catalog.
//!
//! Maps voice ids to display names and genders for podcast and narration
//! features. Unknown ids fall back to inference from the id prefix
//! (`af_`/`bf_` female, `am_`/`bm_` male).

use crate::traits::TtsVoice;

/// Voice metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: &'static str,
    pub gender: &'static str,
}

/// Known Kokoro voices.
pub const VOICE_CATALOG: &[(&str, VoiceInfo)] = &[
    // American female
    ("af_bella", VoiceInfo { name: "Bella", gender: "female" }),
    ("af_nicole", VoiceInfo { name: "Nicole", gender: "female" }),
    ("af_sarah", VoiceInfo { name: "Sarah", gender: "female" }),
    ("af_sky", VoiceInfo { name: "Sky", gender: "female" }),
    // American male
    ("am_adam", VoiceInfo { name: "Adam", gender: "male" }),
    ("am_michael", VoiceInfo { name: "Michael", gender: "male" }),
    // British female
    ("bf_emma", VoiceInfo { name: "Emma", gender: "female" }),
    ("bf_isabella", VoiceInfo { name: "Isabella", gender: "female" }),
    // British male
    ("bm_george", VoiceInfo { name: "George", gender: "male" }),
    ("bm_lewis", VoiceInfo { name: "Lewis", gender: "male" }),
];

/// Look up voice metadata, inferring from the id prefix when unknown.
pub fn voice_info(voice_id: &str) -> (String, String) {
    if let Some((_, info)) = VOICE_CATALOG.iter().find(|(id, _)| *id == voice_id) {
        return (info.name.to_string(), info.gender.to_string());
    }

    let gender = match voice_id.get(..2) {
        Some("af") | Some("bf") => "female",
        Some("am") | Some("bm") => "male",
        _ => "other",
    };

    // Strip a prefix like "af_" and title-case the rest.
    let name_part = voice_id
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(voice_id);
    let name = name_part
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    (name, gender.to_string())
}

/// The full voice list with metadata attached.
pub fn voices_with_info() -> Vec<TtsVoice> {
    VOICE_CATALOG
        .iter()
        .map(|(id, info)| TtsVoice {
            id: id.to_string(),
            name: info.name.to_string(),
            gender: info.gender.to_string(),
        })
        .collect()
}

/// Whether the catalog contains a voice id.
pub fn is_known_voice(voice_id: &str) -> bool {
    VOICE_CATALOG.iter().any(|(id, _)| *id == voice_id)
}

/// The fallback voice used when a requested voice is unknown.
pub fn default_voice() -> &'static str {
    VOICE_CATALOG[0].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_voice_lookup() {
        let (name, gender) = voice_info("bm_lewis");
        assert_eq!(name, "Lewis");
        assert_eq!(gender, "male");
    }

    #[test]
    fn unknown_voice_infers_gender_from_prefix() {
        let (name, gender) = voice_info("af_jade");
        assert_eq!(gender, "female");
        assert_eq!(name, "Jade");

        let (_, gender) = voice_info("bm_oliver");
        assert_eq!(gender, "male");

        let (_, gender) = voice_info("xx_mystery");
        assert_eq!(gender, "other");
    }

    #[test]
    fn unknown_voice_title_cases_name() {
        let (name, _) = voice_info("af_mary_jane");
        assert_eq!(name, "Mary Jane");
    }

    #[test]
    fn catalog_has_both_genders() {
        let voices = voices_with_info();
        assert!(voices.iter().any(|v| v.gender == "female"));
        assert!(voices.iter().any(|v| v.gender == "male"));
        assert_eq!(voices.len(), VOICE_CATALOG.len());
    }

    #[test]
    fn default_voice_is_known() {
        assert!(is_known_voice(default_voice()));
    }
}
