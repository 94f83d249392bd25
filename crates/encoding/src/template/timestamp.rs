//! Timestamp layouts for the time verb.

use std::fmt::Write as _;

use time::format_description::well_known::Rfc3339;
use time::format_description::{self, BorrowedFormatItem, OwnedFormatItem};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::buffer::RenderBuffer;

const TIME_ESTIMATE: usize = 64;

const DEFAULT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
);
const ANSIC: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
);
const UNIX_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] UTC [year]"
);
const RUBY_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
);
const RFC822: &[BorrowedFormatItem<'static>] = format_description!(
    "[day] [month repr:short] [year repr:last_two] [hour]:[minute] UTC"
);
const RFC822Z: &[BorrowedFormatItem<'static>] = format_description!(
    "[day] [month repr:short] [year repr:last_two] [hour]:[minute] [offset_hour sign:mandatory][offset_minute]"
);
const RFC850: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday], [day]-[month repr:short]-[year repr:last_two] [hour]:[minute]:[second] UTC"
);
const RFC1123: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] UTC"
);
const RFC1123Z: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
);

/// Named timestamp layouts. Layouts that spell a zone name render in UTC.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum TimePreset {
    Default,
    Unix,
    Ansic,
    UnixDate,
    RubyDate,
    Rfc822,
    Rfc822Z,
    Rfc850,
    Rfc1123,
    Rfc1123Z,
    Rfc3339,
}

impl TimePreset {
    pub(super) fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, TimePreset); 10] = [
            ("unix", TimePreset::Unix),
            ("ansic", TimePreset::Ansic),
            ("unixdate", TimePreset::UnixDate),
            ("rubydate", TimePreset::RubyDate),
            ("rfc822", TimePreset::Rfc822),
            ("rfc822z", TimePreset::Rfc822Z),
            ("rfc850", TimePreset::Rfc850),
            ("rfc1123", TimePreset::Rfc1123),
            ("rfc1123z", TimePreset::Rfc1123Z),
            ("rfc3339", TimePreset::Rfc3339),
        ];
        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|&(_, preset)| preset)
    }

    const fn items(self) -> Option<&'static [BorrowedFormatItem<'static>]> {
        match self {
            Self::Default => Some(DEFAULT),
            Self::Ansic => Some(ANSIC),
            Self::UnixDate => Some(UNIX_DATE),
            Self::RubyDate => Some(RUBY_DATE),
            Self::Rfc822 => Some(RFC822),
            Self::Rfc822Z => Some(RFC822Z),
            Self::Rfc850 => Some(RFC850),
            Self::Rfc1123 => Some(RFC1123),
            Self::Rfc1123Z => Some(RFC1123Z),
            Self::Unix | Self::Rfc3339 => None,
        }
    }

    const fn renders_in_utc(self) -> bool {
        matches!(
            self,
            Self::UnixDate | Self::Rfc822 | Self::Rfc850 | Self::Rfc1123
        )
    }
}

/// Layout compiled into a time opcode.
#[derive(Clone, Debug)]
pub(super) enum TimeFormat {
    Preset(TimePreset),
    /// User pattern in `time` format-description syntax. `items` is `None`
    /// when the pattern did not parse; such verbs render the default layout.
    Custom {
        pattern: String,
        items: Option<OwnedFormatItem>,
    },
}

impl PartialEq for TimeFormat {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Preset(left), Self::Preset(right)) => left == right,
            (Self::Custom { pattern: left, .. }, Self::Custom { pattern: right, .. }) => {
                left == right
            }
            _ => false,
        }
    }
}

impl TimeFormat {
    pub(super) fn from_argument(argument: Option<&str>) -> Self {
        let Some(argument) = argument else {
            return Self::Preset(TimePreset::Default);
        };
        if let Some(preset) = TimePreset::from_name(argument) {
            return Self::Preset(preset);
        }
        Self::Custom {
            pattern: argument.to_owned(),
            items: format_description::parse_owned::<1>(argument).ok(),
        }
    }

    pub(super) fn estimate(&self) -> usize {
        match self {
            Self::Preset(_) => TIME_ESTIMATE,
            Self::Custom { pattern, .. } => TIME_ESTIMATE.max(pattern.len() * 2),
        }
    }

    /// Writes `timestamp`. Formatting errors and empty custom output fall
    /// back to the default layout.
    pub(super) fn render(&self, timestamp: OffsetDateTime, out: &mut RenderBuffer) {
        let mark = out.len();
        let written = match self {
            Self::Preset(preset) => render_preset(*preset, timestamp, out),
            Self::Custom {
                items: Some(items), ..
            } => timestamp.format_into(out, items).is_ok(),
            Self::Custom { items: None, .. } => false,
        };
        if written && out.len() > mark {
            return;
        }
        out.rewind(mark);
        render_default(timestamp, out);
    }
}

fn render_preset(preset: TimePreset, timestamp: OffsetDateTime, out: &mut RenderBuffer) -> bool {
    match preset {
        TimePreset::Unix => write!(out, "{}", timestamp.unix_timestamp()).is_ok(),
        TimePreset::Rfc3339 => timestamp.format_into(out, &Rfc3339).is_ok(),
        other => {
            let timestamp = if other.renders_in_utc() {
                timestamp.to_offset(UtcOffset::UTC)
            } else {
                timestamp
            };
            other
                .items()
                .is_some_and(|items| timestamp.format_into(out, items).is_ok())
        }
    }
}

fn render_default(timestamp: OffsetDateTime, out: &mut RenderBuffer) {
    let mark = out.len();
    if timestamp.format_into(out, DEFAULT).is_err() {
        out.rewind(mark);
        let _ = write!(out, "{}", timestamp.unix_timestamp());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn render(format: &TimeFormat, timestamp: OffsetDateTime) -> String {
        let mut out = RenderBuffer::with_capacity(0);
        format.render(timestamp, &mut out);
        String::from_utf8(out.into_vec()).unwrap()
    }

    const STAMP: OffsetDateTime = datetime!(2024-03-05 07:08:09.123 +02:00);

    #[test]
    fn default_layout() {
        let format = TimeFormat::from_argument(None);
        assert_eq!(render(&format, STAMP), "2024-03-05 07:08:09.123");
    }

    #[test]
    fn presets_are_case_insensitive() {
        assert_eq!(
            TimeFormat::from_argument(Some("RFC3339")),
            TimeFormat::Preset(TimePreset::Rfc3339)
        );
        assert_eq!(
            render(&TimeFormat::from_argument(Some("unix")), STAMP),
            STAMP.unix_timestamp().to_string()
        );
    }

    #[test]
    fn zone_named_presets_render_in_utc() {
        let format = TimeFormat::from_argument(Some("rfc1123"));
        assert_eq!(render(&format, STAMP), "Tue, 05 Mar 2024 05:08:09 UTC");
        let format = TimeFormat::from_argument(Some("rfc1123z"));
        assert_eq!(render(&format, STAMP), "Tue, 05 Mar 2024 07:08:09 +0200");
    }

    #[test]
    fn ansic_pads_day_with_space() {
        let format = TimeFormat::from_argument(Some("ansic"));
        assert_eq!(render(&format, STAMP), "Tue Mar  5 07:08:09 2024");
    }

    #[test]
    fn custom_pattern() {
        let format = TimeFormat::from_argument(Some("[hour]h[minute]"));
        assert_eq!(render(&format, STAMP), "07h08");
    }

    #[test]
    fn unparseable_pattern_falls_back_to_default() {
        let format = TimeFormat::from_argument(Some("[bogus"));
        assert_eq!(render(&format, STAMP), "2024-03-05 07:08:09.123");
    }

    #[test]
    fn empty_custom_output_falls_back_to_default() {
        let format = TimeFormat::from_argument(Some(""));
        assert_eq!(render(&format, STAMP), "2024-03-05 07:08:09.123");
    }
}
