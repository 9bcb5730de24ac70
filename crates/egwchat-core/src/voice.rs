use egwchat_types::Provider;

use crate::session::decode_claims;

pub const AUDIO_MIME: &str = "audio/webm";
pub const AUDIO_FILENAME: &str = "voice.webm";
pub const MIC_DENIED_MESSAGE: &str = "Microphone access denied or unsupported.";
pub const VOICE_OPENAI_ONLY: &str = "Voice input available only with OpenAI provider";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCapability {
    Available,
    /// Disabled, with the tooltip to show
    Unavailable(&'static str),
}

impl VoiceCapability {
    /// Voice is only turned off when the token names a provider other than openai.
    /// Missing or undecodable tokens leave it on.
    pub fn for_token(token: Option<&str>) -> Self {
        let provider = token
            .and_then(decode_claims)
            .and_then(|claims| claims.provider_type);

        let supported = match provider.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(id) => Provider::from_str(id).is_some_and(|p| p.supports_voice()),
        };

        if supported {
            Self::Available
        } else {
            Self::Unavailable(VOICE_OPENAI_ONLY)
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Append transcribed text to whatever is already in the input box
pub fn append_transcript(input: &str, text: &str) -> String {
    if text.is_empty() {
        return input.to_string();
    }
    if input.is_empty() {
        return text.to_string();
    }
    if input.ends_with(' ') {
        format!("{}{}", input, text)
    } else {
        format!("{} {}", input, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::token_with_payload;

    #[test]
    fn test_openai_token_allows_voice() {
        let token = token_with_payload(r#"{"sub":"u","provider_type":"openai"}"#);
        assert_eq!(
            VoiceCapability::for_token(Some(&token)),
            VoiceCapability::Available
        );
    }

    #[test]
    fn test_other_provider_disables_voice() {
        let token = token_with_payload(r#"{"sub":"u","provider_type":"ionos"}"#);
        let capability = VoiceCapability::for_token(Some(&token));
        assert_eq!(capability, VoiceCapability::Unavailable(VOICE_OPENAI_ONLY));
        assert!(!capability.is_available());

        let token = token_with_payload(r#"{"sub":"u","provider_type":"someday-llm"}"#);
        assert!(!VoiceCapability::for_token(Some(&token)).is_available());
    }

    #[test]
    fn test_unknown_token_leaves_voice_on() {
        assert!(VoiceCapability::for_token(None).is_available());
        assert!(VoiceCapability::for_token(Some("not-a-jwt")).is_available());
        let token = token_with_payload(r#"{"sub":"u"}"#);
        assert!(VoiceCapability::for_token(Some(&token)).is_available());
    }

    #[test]
    fn test_append_transcript_spacing() {
        assert_eq!(append_transcript("", "hello"), "hello");
        assert_eq!(append_transcript("Remind me", "tomorrow"), "Remind me tomorrow");
        assert_eq!(append_transcript("Remind me ", "tomorrow"), "Remind me tomorrow");
        assert_eq!(append_transcript("Remind me", ""), "Remind me");
    }
}
