pub const CARD_PREFIX_ENV: &str = "CTLMON_CARD_PREFIX";

/// Prefix used when resolving a card index to a device identifier. Which one
/// the subsystem prefers depends on its installed version, so the choice is
/// taken from the environment instead of being baked in at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardPrefix {
    Hw,
    #[default]
    Sysdefault,
}

impl CardPrefix {
    pub fn from_env() -> Self {
        std::env::var(CARD_PREFIX_ENV)
            .ok()
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("hw") {
            Self::Hw
        } else {
            Self::Sysdefault
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hw => "hw",
            Self::Sysdefault => "sysdefault",
        }
    }

    pub fn device_for_card(self, index: i32) -> String {
        format!("{}:{}", self.as_str(), index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_hw_case_insensitively() {
        assert_eq!(CardPrefix::parse("hw"), CardPrefix::Hw);
        assert_eq!(CardPrefix::parse(" HW "), CardPrefix::Hw);
        assert_eq!(CardPrefix::parse("sysdefault"), CardPrefix::Sysdefault);
        assert_eq!(CardPrefix::parse("anything else"), CardPrefix::Sysdefault);
    }

    #[test]
    fn card_index_resolves_to_device_identifier() {
        assert_eq!(CardPrefix::Hw.device_for_card(0), "hw:0");
        assert_eq!(CardPrefix::Sysdefault.device_for_card(3), "sysdefault:3");
    }
}
