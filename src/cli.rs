use clap::Parser;
use ctlmon_engine::hw::config::CardPrefix;
use ctlmon_engine::{DEFAULT_DEVICE, SessionConfig};

const CARD_INDEX_MAX: i32 = 31;
// Identifier length limit imposed by the control subsystem.
const DEVICE_NAME_MAX: usize = 63;

/// Monitor value changes on the control elements of a sound device.
#[derive(Debug, Parser)]
#[command(name = "ctlmon", version, about)]
pub struct Cli {
    /// Select the card, default 0
    #[arg(short = 'c', long = "card")]
    pub card: Option<i32>,

    /// Select the device, default 'hw:0'
    #[arg(short = 'D', long = "device")]
    pub device: Option<String>,

    /// Control name to tap on
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,
}

impl Cli {
    pub fn into_config(self) -> Result<SessionConfig, String> {
        self.into_config_with(CardPrefix::from_env())
    }

    fn into_config_with(self, prefix: CardPrefix) -> Result<SessionConfig, String> {
        let device = match (self.device, self.card) {
            (Some(device), _) => truncate_device(&device),
            (None, Some(index)) => {
                if !(0..=CARD_INDEX_MAX).contains(&index) {
                    return Err(format!("Invalid card number '{index}'."));
                }
                prefix.device_for_card(index)
            }
            (None, None) => DEFAULT_DEVICE.to_string(),
        };
        Ok(SessionConfig {
            device,
            filter: self.name,
        })
    }
}

fn truncate_device(device: &str) -> String {
    device.chars().take(DEVICE_NAME_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ctlmon").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn defaults_to_hw0_and_no_filter() {
        let config = parse(&[]).into_config_with(CardPrefix::Sysdefault).unwrap();
        assert_eq!(config.device, "hw:0");
        assert_eq!(config.filter, None);
    }

    #[test]
    fn card_index_uses_the_prefix_policy() {
        let config = parse(&["-c", "2"])
            .into_config_with(CardPrefix::Sysdefault)
            .unwrap();
        assert_eq!(config.device, "sysdefault:2");

        let config = parse(&["--card", "2"]).into_config_with(CardPrefix::Hw).unwrap();
        assert_eq!(config.device, "hw:2");
    }

    #[test]
    fn out_of_range_card_index_is_a_startup_error() {
        for index in ["-1", "32", "99"] {
            let err = parse(&["-c", index])
                .into_config_with(CardPrefix::Hw)
                .expect_err("index outside 0..=31 must fail");
            assert_eq!(err, format!("Invalid card number '{index}'."));
        }
    }

    #[test]
    fn device_override_wins_over_card_index() {
        let config = parse(&["-c", "1", "-D", "sysdefault:4"])
            .into_config_with(CardPrefix::Hw)
            .unwrap();
        assert_eq!(config.device, "sysdefault:4");
    }

    #[test]
    fn device_identifier_is_truncated() {
        let long = "x".repeat(80);
        let config = parse(&["-D", &long]).into_config_with(CardPrefix::Hw).unwrap();
        assert_eq!(config.device.chars().count(), 63);
    }

    #[test]
    fn name_sets_the_exact_match_filter() {
        let config = parse(&["-n", "Master Playback Switch"])
            .into_config_with(CardPrefix::Hw)
            .unwrap();
        assert_eq!(config.filter.as_deref(), Some("Master Playback Switch"));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["ctlmon", "-z"]).is_err());
        assert!(Cli::try_parse_from(["ctlmon", "--card"]).is_err());
    }
}
